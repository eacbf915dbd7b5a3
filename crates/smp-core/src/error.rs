// ============================================
// File: crates/smp-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types specific to protocol and cryptographic operations
//! in the SMP core crate.
//!
//! ## Main Functionality
//! - `CoreError`: Primary error enum for core operations
//!
//! ## Error Categories
//! 1. **Crypto Errors**: Key generation, signing, encryption failures
//! 2. **Protocol Errors**: Wire parsing and validation errors
//! 3. **Capacity Errors**: Oversized payloads, exhausted counters
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - Decryption failures carry no detail on purpose (no padding oracles)
//! - All errors should be loggable without leaking secrets
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use smp_common::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
///
/// # Security Note
/// Error messages are designed to be informative for debugging
/// without revealing sensitive information like key material.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Failed to generate cryptographic key.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    /// Failed to encode or decode a key.
    #[error("Key encoding failed: {context}")]
    KeyEncoding {
        /// What was being encoded or decoded
        context: String,
    },

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    /// Signature creation failed.
    #[error("Failed to create signature: {reason}")]
    SignatureCreation {
        /// Why signing failed
        reason: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What went wrong
        context: String,
    },

    /// Decryption or authentication failed.
    ///
    /// Intentionally carries no detail.
    #[error("Decryption failed")]
    Decryption,

    // ========================================
    // Capacity Errors
    // ========================================

    /// Payload does not fit the block plaintext capacity.
    #[error("Large message: {size} bytes does not fit {max}")]
    LargeMessage {
        /// Payload size in bytes
        size: usize,
        /// Maximum allowed size (exclusive)
        max: usize,
    },

    /// The per-direction block counter is exhausted.
    ///
    /// A counter reuse would repeat an IV under the same key, so the
    /// connection must be abandoned rather than wrapped around.
    #[error("Session block counter exhausted")]
    CounterExhausted,

    // ========================================
    // Protocol Errors
    // ========================================

    /// Wire data could not be parsed.
    #[error("Parse failed: {context}")]
    Parse {
        /// What was being parsed
        context: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from the common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `KeyEncoding` error.
    pub fn key_encoding(context: impl Into<String>) -> Self {
        Self::KeyEncoding {
            context: context.into(),
        }
    }

    /// Creates a `SignatureCreation` error.
    pub fn signature_creation(reason: impl Into<String>) -> Self {
        Self::SignatureCreation {
            reason: reason.into(),
        }
    }

    /// Creates an `Encryption` error.
    pub fn encryption(context: impl Into<String>) -> Self {
        Self::Encryption {
            context: context.into(),
        }
    }

    /// Creates a `Parse` error.
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Creates a `LargeMessage` error.
    #[must_use]
    pub const fn large_message(size: usize, max: usize) -> Self {
        Self::LargeMessage { size, max }
    }
}

// ============================================
// Tests
// ============================================
