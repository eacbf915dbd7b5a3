// ============================================
// File: crates/smp-core/src/protocol/parser.rs
// ============================================
//! # Wire Parser Primitives
//!
//! ## Creation Reason
//! Provides a cursor-based tokenizer over a byte slice, the foundation
//! of all SMP wire parsing (space-separated ASCII tokens with base64
//! fields and decimal length prefixes).
//!
//! ## Main Functionality
//! - `Cursor`: Mutable position over an immutable byte slice
//! - Token combinators: `word`, `space`, `tag`, `one_of`
//! - Value combinators: `base64`, `decimal`, `datetime`
//! - `attempt`: Scoped backtracking for alternatives
//!
//! ## Parsing Strategy
//! All combinators return `Option` and leave the cursor where it was on
//! failure, with one deliberate exception: `word` always consumes the
//! token it returns (it cannot fail). Alternatives are expressed by
//! chaining `attempt` calls.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Keep combinators non-consuming on failure; the command parsers
//!   rely on it for tag dispatch
//! - `base64` accepts only the standard alphabet with `=` padding
//! - Length-prefixed reads (`decimal` then `take`) are the only way to
//!   carry arbitrary bytes; everything else stops at a space
//!
//! ## Last Modified
//! v0.1.0 - Initial parser implementation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};

// ============================================
// Cursor
// ============================================

/// A parsing cursor over an immutable byte slice.
///
/// # Example
/// ```
/// use smp_core::protocol::parser::Cursor;
///
/// let mut c = Cursor::new(b"MSG 42");
/// assert_eq!(c.word(), b"MSG");
/// assert!(c.space().is_some());
/// assert_eq!(c.decimal(), Some(42));
/// assert!(c.at_end());
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the unconsumed remainder of the input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    /// Returns `true` if all input has been consumed.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Consumes and returns exactly `n` bytes.
    ///
    /// Fails without advancing if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        if end > self.input.len() {
            return None;
        }
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Some(bytes)
    }

    /// Consumes one or more bytes satisfying `pred`.
    ///
    /// Fails without advancing if the first byte does not satisfy it.
    pub fn take_while1(&mut self, pred: impl Fn(u8) -> bool) -> Option<&'a [u8]> {
        let start = self.pos;
        let mut end = start;
        while end < self.input.len() && pred(self.input[end]) {
            end += 1;
        }
        if end == start {
            return None;
        }
        self.pos = end;
        Some(&self.input[start..end])
    }

    /// Consumes bytes up to the next space or end of input.
    ///
    /// The returned token may be empty. The cursor stops on the space
    /// separator without consuming it.
    pub fn word(&mut self) -> &'a [u8] {
        let start = self.pos;
        let mut end = start;
        while end < self.input.len() && self.input[end] != b' ' {
            end += 1;
        }
        self.pos = end;
        &self.input[start..end]
    }

    /// Consumes exactly one ASCII space.
    pub fn space(&mut self) -> Option<()> {
        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    /// Matches a literal byte sequence at the current position.
    pub fn tag(&mut self, tag: &[u8]) -> Option<()> {
        if self.input[self.pos.min(self.input.len())..].starts_with(tag) {
            self.pos += tag.len();
            Some(())
        } else {
            None
        }
    }

    /// Matches one of a set of literal tags, in declared order.
    ///
    /// Returns the key of the first tag that matches and advances past
    /// its bytes.
    pub fn one_of<K: Copy>(&mut self, tags: &[(K, &[u8])]) -> Option<K> {
        for (key, bytes) in tags {
            if self.tag(bytes).is_some() {
                return Some(*key);
            }
        }
        None
    }

    /// Consumes and decodes a base64 token.
    ///
    /// The token is the maximal run of standard-alphabet characters
    /// followed by up to two `=` padding bytes. Fails (without
    /// advancing) if the run is empty or does not decode.
    pub fn base64(&mut self) -> Option<Vec<u8>> {
        self.attempt(|c| {
            let start = c.pos;
            while c.pos < c.input.len() && is_base64_char(c.input[c.pos]) {
                c.pos += 1;
            }
            if c.pos == start {
                return None;
            }
            let mut padding = 0;
            while padding < 2 && c.input.get(c.pos) == Some(&b'=') {
                c.pos += 1;
                padding += 1;
            }
            BASE64.decode(&c.input[start..c.pos]).ok()
        })
    }

    /// Consumes one or more ASCII digits as an unsigned integer.
    ///
    /// Fails without advancing on the first non-digit or on overflow.
    pub fn decimal(&mut self) -> Option<usize> {
        self.attempt(|c| {
            let digits = c.take_while1(|b| b.is_ascii_digit())?;
            let mut value: usize = 0;
            for &d in digits {
                value = value
                    .checked_mul(10)?
                    .checked_add(usize::from(d - b'0'))?;
            }
            Some(value)
        })
    }

    /// Consumes a word and interprets it as an ISO-8601 instant.
    pub fn datetime(&mut self) -> Option<DateTime<Utc>> {
        self.attempt(|c| {
            let token = c.word();
            let text = std::str::from_utf8(token).ok()?;
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }

    /// Runs `f`, restoring the cursor position if it returns `None`.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let saved = self.pos;
        let result = f(self);
        if result.is_none() {
            self.pos = saved;
        }
        result
    }
}

const fn is_base64_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

// ============================================
// Tests
// ============================================
