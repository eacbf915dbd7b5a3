// ============================================
// File: crates/smp-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides foundational error types and result aliases used across
//! all SMP crates, enabling consistent error handling.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for common operations
//! - `Result<T>`: Type alias using `CommonError`
//! - Error conversion traits for interoperability
//!
//! ## Design Philosophy
//! - Use `thiserror` for ergonomic error definitions
//! - Each crate may define its own error types that wrap `CommonError`
//! - Errors should be informative without leaking sensitive information
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include key material or message bodies in error messages
//! - Keep error variants specific but not too granular
//! - Implement `From` traits for seamless error propagation
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across SMP crates.
///
/// # Categories
/// - **Validation**: Input validation failures
/// - **Encoding**: Text and base64 decoding errors
/// - **Internal**: Unexpected internal state
#[derive(Error, Debug)]
pub enum CommonError {
    // ========================================
    // Validation Errors
    // ========================================

    /// Invalid input data provided.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the field or parameter
        field: String,
        /// Description of what's wrong
        reason: String,
    },

    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    // ========================================
    // Encoding Errors
    // ========================================

    /// Base64 decoding failed.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding failed.
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    // ========================================
    // Internal Errors
    // ========================================

    /// Unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommonError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidLength` error.
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Creates an `Internal` error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
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
        let err = CommonError::invalid_input("queue_id", "cannot be empty");
        assert!(err.to_string().contains("queue_id"));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_invalid_length_display() {
        let err = CommonError::invalid_length(32, 16);
        assert!(err.to_string().contains("32"));
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn test_base64_error_conversion() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let result = BASE64.decode("not!valid!base64!");
        let err: CommonError = result.unwrap_err().into();
        assert!(matches!(err, CommonError::Base64(_)));
    }
}
