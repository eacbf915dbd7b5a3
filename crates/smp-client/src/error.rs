// ============================================
// File: crates/smp-client/src/error.rs
// ============================================
//! # Client Error Types
//!
//! ## Creation Reason
//! Defines error types for the client crate: handshake failures,
//! session-level faults, and request outcomes.
//!
//! ## Main Functionality
//! - `ClientError`: Primary error enum for client operations
//!
//! ## Error Categories
//! 1. **Handshake Errors**: Bad header, key pin mismatch, version
//! 2. **Session Errors**: Block-size violations, disconnection
//! 3. **Request Errors**: Broker-reported errors, unexpected replies
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Protocol` wraps errors the broker (or the local parser) put into
//!   the response stream; everything else is connection-fatal or local
//! - `Disconnected` is what every pending request resolves to when the
//!   inbound loop exits
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use smp_core::protocol::{ProtocolError, SmpVersion};
use smp_core::CoreError;
use smp_transport::TransportError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ============================================
// ClientError
// ============================================

/// Client error types.
#[derive(Error, Debug)]
pub enum ClientError {
    // ========================================
    // Handshake Errors
    // ========================================

    /// The fixed server header could not be read or parsed.
    #[error("Bad server header: {reason}")]
    BadServerHeader {
        /// What was wrong with it
        reason: String,
    },

    /// The announced block size is outside the accepted range.
    #[error("Block size {size} outside accepted range")]
    BlockSizeOutOfRange {
        /// Announced block size
        size: usize,
    },

    /// The server requested a transport mode this client does not speak.
    #[error("Unsupported transport mode {mode}")]
    UnsupportedTransportMode {
        /// Announced transport mode
        mode: u16,
    },

    /// The server's key hash does not match the pinned fingerprint.
    #[error("Server key hash does not match")]
    KeyHashMismatch,

    /// The welcome block did not carry a readable version line.
    #[error("Malformed welcome: {reason}")]
    MalformedWelcome {
        /// What was wrong with it
        reason: String,
    },

    /// The server runs an incompatible protocol version.
    #[error("Incompatible server version {server} (client {client})")]
    IncompatibleVersion {
        /// Version announced by the server
        server: SmpVersion,
        /// Version this client implements
        client: SmpVersion,
    },

    // ========================================
    // Session Errors
    // ========================================

    /// A frame of the wrong size arrived where a block was expected.
    #[error("Bad block size: got {size}, expected {expected}")]
    BadBlockSize {
        /// Received frame size
        size: usize,
        /// Negotiated block size
        expected: usize,
    },

    /// The connection is gone; the request cannot complete.
    #[error("Client disconnected")]
    Disconnected,

    // ========================================
    // Request Errors
    // ========================================

    /// The broker answered with a protocol error.
    #[error("Broker error: {0}")]
    Protocol(ProtocolError),

    /// The broker answered with a command the operation cannot accept.
    #[error("Unexpected response: expected {expected}, got {received}")]
    UnexpectedResponse {
        /// What the operation required
        expected: &'static str,
        /// What actually arrived
        received: String,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Invalid configuration.
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig {
        /// Configuration field name
        field: String,
        /// Why it's invalid
        reason: String,
    },

    /// Failed to read or parse a configuration file.
    #[error("Configuration load failed: {reason}")]
    ConfigLoad {
        /// What went wrong
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Protocol or crypto failure from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ClientError {
    /// Creates a `BadServerHeader` error.
    pub fn bad_server_header(reason: impl Into<String>) -> Self {
        Self::BadServerHeader {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedWelcome` error.
    pub fn malformed_welcome(reason: impl Into<String>) -> Self {
        Self::MalformedWelcome {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidConfig` error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `UnexpectedResponse` error.
    pub fn unexpected_response(expected: &'static str, received: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            expected,
            received: received.into(),
        }
    }

    /// Returns `true` if the underlying cause is a clean transport
    /// close rather than a fault.
    #[must_use]
    pub const fn is_clean_close(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use smp_core::protocol::CommandError;

    #[test]
    fn test_error_display() {
        let err = ClientError::IncompatibleVersion {
            server: SmpVersion::new([0, 5, 0, 0]),
            client: SmpVersion::new([0, 4, 1, 0]),
        };
        let text = err.to_string();
        assert!(text.contains("incompatible server version") || text.contains("Incompatible"));
        assert!(text.contains("0.5.0.0"));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ClientError::Protocol(ProtocolError::Cmd(CommandError::Prohibited));
        assert!(err.to_string().contains("CMD PROHIBITED"));
    }

    #[test]
    fn test_is_clean_close() {
        assert!(ClientError::Transport(TransportError::Closed).is_clean_close());
        assert!(!ClientError::Disconnected.is_clean_close());
    }
}
