// ============================================
// File: crates/smp-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes fundamental type definitions used throughout the SMP
//! client, ensuring type safety and consistent representations.
//!
//! ## Main Functionality
//! - `QueueId`: Opaque broker-assigned queue identifier
//! - `CorrelationId`: Client-generated request correlation token
//! - `KeyHash`: SHA-256 fingerprint of a server key (SPKI encoding)
//! - `SmpServer`: Broker address with an optional pinned key hash
//!
//! ## Main Logical Flow
//! 1. `CorrelationId` values are minted by the client per request
//! 2. `QueueId` values arrive from the broker and key routing decisions
//! 3. `SmpServer` is parsed from configuration and carried read-only
//!
//! ## ⚠️ Important Note for Next Developer
//! - A `QueueId` may legitimately be empty (commands that address no
//!   queue send an empty token on the wire)
//! - `CorrelationId` bytes appear verbatim on the wire; keep them ASCII
//! - Maintain backward-compatible serialization formats
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a server key fingerprint in bytes (SHA-256).
pub const KEY_HASH_SIZE: usize = 32;

// ============================================
// QueueId
// ============================================

/// Opaque identifier of a broker-hosted queue.
///
/// # Purpose
/// The broker assigns two ids per queue: a recipient-facing id and a
/// sender-facing id. The client treats both as opaque byte strings and
/// ships them base64-encoded on the wire.
///
/// # Wire Format
/// Base64 token inside a transmission. Commands that address no queue
/// (such as queue creation) carry an empty token.
///
/// # Example
/// ```
/// use smp_common::QueueId;
///
/// let id = QueueId::from_bytes(b"abcd");
/// assert_eq!(id.to_string(), "YWJjZA==");
///
/// let empty = QueueId::empty();
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct QueueId(Vec<u8>);

impl QueueId {
    /// Creates a queue id from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Creates the empty queue id used by commands that address no queue.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns the raw id bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if the id carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show a short prefix in debug output for privacy
        if self.0.is_empty() {
            write!(f, "QueueId(empty)")
        } else {
            let shown = self.0.len().min(4);
            write!(f, "QueueId({}...)", hex::encode(&self.0[..shown]))
        }
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(&self.0))
    }
}

impl FromStr for QueueId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(BASE64.decode(s)?))
    }
}

impl From<Vec<u8>> for QueueId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for QueueId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// CorrelationId
// ============================================

/// Client-generated token correlating a request with its response.
///
/// # Purpose
/// Every transmission carries a correlation id; the broker echoes it in
/// the matching response, letting the client multiplex concurrent
/// requests over one connection.
///
/// # Wire Format
/// The token bytes appear verbatim (no encoding) between spaces, so
/// they must never contain an ASCII space. Ids minted by this client
/// are the ASCII decimal form of a monotonic counter.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct CorrelationId(Vec<u8>);

impl CorrelationId {
    /// Creates a correlation id from raw wire bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Creates a correlation id from a counter value (ASCII decimal).
    #[must_use]
    pub fn from_counter(value: u64) -> Self {
        Self(value.to_string().into_bytes())
    }

    /// Returns the raw token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<Vec<u8>> for CorrelationId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// ============================================
// KeyHash
// ============================================

/// SHA-256 fingerprint of a server's public key (SPKI DER bytes).
///
/// # Purpose
/// Pinning the expected fingerprint in the server address lets the
/// client reject a broker presenting a different key during the
/// handshake.
///
/// # Example
/// ```
/// use smp_common::KeyHash;
///
/// let hash = KeyHash::new([0x42; 32]);
/// let text = hash.to_string();
/// let parsed: KeyHash = text.parse().unwrap();
/// assert_eq!(hash, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHash([u8; KEY_HASH_SIZE]);

impl KeyHash {
    /// Creates a key hash from raw digest bytes.
    #[must_use]
    pub const fn new(bytes: [u8; KEY_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a key hash from a byte slice.
    ///
    /// # Returns
    /// `None` if the slice is not exactly 32 bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_HASH_SIZE {
            return None;
        }
        let mut hash = [0u8; KEY_HASH_SIZE];
        hash.copy_from_slice(bytes);
        Some(Self(hash))
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_HASH_SIZE] {
        &self.0
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeyHash({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for KeyHash {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
            .ok_or(CommonError::invalid_length(KEY_HASH_SIZE, bytes.len()))
    }
}

// ============================================
// SmpServer
// ============================================

/// Broker address with an optional pinned key fingerprint.
///
/// # Text Form
/// `host[:port][#keyhash]`, where `keyhash` is the hex SHA-256 of the
/// server's SPKI-encoded public key.
///
/// # Example
/// ```
/// use smp_common::SmpServer;
///
/// let server: SmpServer = "smp.example.com:5223".parse().unwrap();
/// assert_eq!(server.host, "smp.example.com");
/// assert_eq!(server.port, Some(5223));
/// assert!(server.key_hash.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmpServer {
    /// Broker host name or address.
    pub host: String,
    /// Broker port; the transport supplies a default when absent.
    pub port: Option<u16>,
    /// Expected SHA-256 of the server's public key, if pinned.
    pub key_hash: Option<KeyHash>,
}

impl SmpServer {
    /// Creates a server address without a pinned key hash.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
            key_hash: None,
        }
    }

    /// Sets the pinned key hash.
    #[must_use]
    pub fn with_key_hash(mut self, key_hash: KeyHash) -> Self {
        self.key_hash = Some(key_hash);
        self
    }
}

impl fmt::Display for SmpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(ref hash) = self.key_hash {
            write!(f, "#{}", hash)?;
        }
        Ok(())
    }
}

impl FromStr for SmpServer {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, key_hash) = match s.split_once('#') {
            Some((addr, hash)) => (addr, Some(hash.parse::<KeyHash>()?)),
            None => (s, None),
        };

        let (host, port) = match addr.split_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    CommonError::invalid_input("port", format!("not a port number: {}", port))
                })?;
                (host, Some(port))
            }
            None => (addr, None),
        };

        if host.is_empty() {
            return Err(CommonError::invalid_input("host", "cannot be empty"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            key_hash,
        })
    }
}

impl Serialize for KeyHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for KeyHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_slice(&bytes)
                .ok_or_else(|| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))
        }
    }
}

// ============================================
// Tests
// ============================================
