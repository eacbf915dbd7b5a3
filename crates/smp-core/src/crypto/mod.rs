// ============================================
// File: crates/smp-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes all cryptographic operations for the SMP client, using
//! audited RustCrypto implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: Key types (RSA key pairs, SPKI public keys, session keys)
//! - [`aead`]: Block encryption (AES-256-GCM with `#` padding)
//! - [`rsa`]: RSA-OAEP encryption, RSA-PSS signatures, E2E envelopes
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  Client                                        Broker       │
//! │    │ ◄──────────────────────── RSA public key (SPKI)       │
//! │    │                                              │         │
//! │    │  fresh AES keys + base IVs                   │         │
//! │    │  RSA-OAEP(session keys) ──────────────────► │         │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport Phase                          │
//! │                                                             │
//! │   AES key + base IV + counter ──► AES-256-GCM ──► block     │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//! - **Confidentiality**: AES-256-GCM per block
//! - **Integrity**: 16-byte GCM tag appended to every block
//! - **Authenticity**: RSA-PSS signatures on client transmissions
//! - **IV uniqueness**: per-direction counters XORed into the base IV
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL implementations use RustCrypto (audited)
//! - NEVER roll your own crypto
//! - A (key, counter) pair must never be reused; the counter types
//!   enforce this by failing instead of wrapping
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod aead;
pub mod keys;
pub mod rsa;

// Re-export primary types at module level
pub use keys::{derive_iv, RsaKeyPair, SessionKey, SpkiPublicKey};

// ============================================
// Constants
// ============================================

/// Size of an AES-256 key in bytes.
pub const AES_KEY_SIZE: usize = 32;

/// Size of a session base IV in bytes.
pub const BASE_IV_SIZE: usize = 16;

/// Size of a GCM authentication tag in bytes.
pub const GCM_TAG_SIZE: usize = 16;

/// RSA modulus size used for generated key pairs, in bits.
pub const RSA_KEY_BITS: usize = 2048;

/// Salt length for RSA-PSS signatures, in bytes.
pub const PSS_SALT_LEN: usize = 32;
