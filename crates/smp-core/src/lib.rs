// ============================================
// File: crates/smp-core/src/lib.rs
// ============================================
//! # SMP Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the protocol definitions and cryptographic operations for
//! the SMP client. This crate is pure computation: no sockets, no
//! tasks, no clocks beyond message timestamps.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Typed commands for every party (`ClientCommand`, `BrokerCommand`)
//! - ASCII wire codec and transmission framing
//! - Backtracking byte parser
//! - Protocol version management
//!
//! ### Crypto Module ([`crypto`])
//! - Key types (`RsaKeyPair`, `SpkiPublicKey`, `SessionKey`)
//! - Block encryption (AES-256-GCM, `#` padding, appended tag)
//! - RSA-OAEP key delivery and RSA-PSS transmission signatures
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               smp-client                            │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │     smp-core  ◄──      smp-transport               │
//! │   You are here        │                            │
//! │         │             │                            │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │               smp-common                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Guarantees
//! - **Confidentiality**: AES-256-GCM authenticated encryption
//! - **Integrity**: GCM tag on every block
//! - **Authenticity**: RSA-PSS signatures on client transmissions
//! - **IV uniqueness**: per-direction counters, fail-closed on overflow
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL cryptographic code uses audited RustCrypto implementations
//! - NEVER implement custom crypto primitives
//! - Session key material MUST be zeroized on drop
//! - Wire format changes MUST bump the protocol version
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{RsaKeyPair, SessionKey, SpkiPublicKey};
pub use error::{CoreError, Result};
pub use protocol::{
    BrokerCommand, BrokerTransmission, ClientCommand, ClientTransmission, CommandError, Party,
    ProtocolError, SmpVersion, CURRENT_VERSION,
};
