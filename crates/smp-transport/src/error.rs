// ============================================
// File: crates/smp-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types specific to the framed byte-channel layer,
//! covering connection setup, frame I/O, and shutdown.
//!
//! ## Main Functionality
//! - `TransportError`: Primary error enum for channel operations
//! - Error conversion from system errors
//!
//! ## Error Categories
//! 1. **Connection Errors**: Connect and shutdown failures
//! 2. **Frame Errors**: Send/receive failures, oversized frames
//! 3. **Lifecycle Errors**: Operations on a closed channel
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Closed` is the normal end-of-stream signal, not a fault; the
//!   client's inbound loop relies on receiving it exactly once
//! - Network errors are often transient but this layer never retries
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Connection Errors
    // ========================================

    /// Failed to establish a connection.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Address we tried to reach
        addr: String,
        /// Why the connection failed
        reason: String,
    },

    // ========================================
    // Frame Errors
    // ========================================

    /// Send operation failed.
    #[error("Failed to send frame: {reason}")]
    SendFailed {
        /// Why the send failed
        reason: String,
    },

    /// Receive operation failed.
    #[error("Failed to receive frame: {reason}")]
    ReceiveFailed {
        /// Why the receive failed
        reason: String,
    },

    /// Frame exceeds the configured size limit.
    #[error("Frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Offending frame size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    // ========================================
    // Lifecycle Errors
    // ========================================

    /// The channel is closed.
    #[error("Channel closed")]
    Closed,

    /// Operation timed out.
    #[error("Operation timed out: {operation}")]
    Timeout {
        /// What operation timed out
        operation: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `SendFailed` error.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `ReceiveFailed` error.
    pub fn receive_failed(reason: impl Into<String>) -> Self {
        Self::ReceiveFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Returns `true` if this error is the normal end-of-stream signal.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::connect_failed("smp.example.com:5223", "refused");
        assert!(err.to_string().contains("smp.example.com:5223"));

        let err = TransportError::FrameTooLarge {
            size: 70000,
            max: 65552,
        };
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_is_closed() {
        assert!(TransportError::Closed.is_closed());
        assert!(!TransportError::send_failed("x").is_closed());
    }
}
