// ============================================
// File: crates/smp-core/src/protocol/version.rs
// ============================================
//! # Protocol Versioning
//!
//! ## Creation Reason
//! Manages protocol versions to ensure compatibility between clients
//! and brokers of different versions.
//!
//! ## Main Functionality
//! - `SmpVersion`: Four-component version identifier
//! - Compatibility checking against the broker's welcome version
//!
//! ## Versioning Strategy
//! - Four dot-separated decimal components on the wire (`a.b.c.d`)
//! - Only the first two components participate in the compatibility
//!   decision; the rest are informational
//! - A broker ahead of the client on (major, minor) is rejected
//!
//! ## Version History
//! | Version | Description |
//! |---------|-------------|
//! | 0.4.1.0 | Tag-appended AEAD framing |
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALWAYS bump the minor component for wire format changes
//! - The welcome line is the only place versions appear on the wire
//!
//! ## Last Modified
//! v0.1.0 - Initial version definitions

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================
// Constants
// ============================================

/// Protocol version implemented by this client.
pub const CURRENT_VERSION: SmpVersion = SmpVersion([0, 4, 1, 0]);

// ============================================
// SmpVersion
// ============================================

/// Protocol version identifier.
///
/// # Example
/// ```
/// use smp_core::protocol::{SmpVersion, CURRENT_VERSION};
///
/// let server: SmpVersion = "0.4.0.0".parse().unwrap();
/// assert!(CURRENT_VERSION.accepts(&server));
///
/// let future: SmpVersion = "0.5.0.0".parse().unwrap();
/// assert!(!CURRENT_VERSION.accepts(&future));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SmpVersion([u16; 4]);

impl SmpVersion {
    /// Creates a version from its four components.
    #[must_use]
    pub const fn new(components: [u16; 4]) -> Self {
        Self(components)
    }

    /// Returns the raw components.
    #[must_use]
    pub const fn components(&self) -> [u16; 4] {
        self.0
    }

    /// Returns the major component.
    #[must_use]
    pub const fn major(&self) -> u16 {
        self.0[0]
    }

    /// Returns the minor component.
    #[must_use]
    pub const fn minor(&self) -> u16 {
        self.0[1]
    }

    /// Checks whether a broker announcing `server` is acceptable to a
    /// client at `self`.
    ///
    /// The comparison is lexicographic over the first two components
    /// only: a broker ahead on (major, minor) speaks a format this
    /// client does not know.
    #[must_use]
    pub const fn accepts(&self, server: &Self) -> bool {
        if server.major() != self.major() {
            return server.major() < self.major();
        }
        server.minor() <= self.minor()
    }
}

impl fmt::Display for SmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl FromStr for SmpVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = [0u16; 4];
        let mut parts = s.split('.');
        for slot in &mut components {
            let part = parts
                .next()
                .ok_or_else(|| CoreError::parse("version: fewer than 4 components"))?;
            *slot = part
                .parse::<u16>()
                .map_err(|_| CoreError::parse(format!("version component '{}'", part)))?;
        }
        if parts.next().is_some() {
            return Err(CoreError::parse("version: more than 4 components"));
        }
        Ok(Self(components))
    }
}

// ============================================
// Tests
// ============================================
