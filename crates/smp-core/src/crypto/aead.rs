// ============================================
// File: crates/smp-core/src/crypto/aead.rs
// ============================================
//! # Block Encryption
//!
//! ## Creation Reason
//! Provides authenticated encryption for protocol blocks using
//! AES-256-GCM with the session's 16-byte derived IVs.
//!
//! ## Main Functionality
//! - `pad` / `unpad`: `#` fill to the block plaintext capacity
//! - `seal_block`: pad, encrypt, append the 16-byte tag
//! - `open_block`: decrypt and verify, returning the padded plaintext
//!
//! ## Block Format
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ ciphertext (block_size - 16)   │ ← AES-256-GCM     │
//! ├────────────────────────────────────────────────────┤
//! │ GCM tag (16 bytes)             │ ← appended        │
//! └────────────────────────────────────────────────────┘
//! ```
//! Every block on the wire is exactly `block_size` bytes; every
//! plaintext handed to `seal_block` is padded to `block_size - 16`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The tag is APPENDED. Earlier protocol revisions prepended it;
//!   that layout must not come back
//! - Never reuse a (key, IV) pair - catastrophic security failure
//! - Payloads at or above the plaintext capacity are rejected, not
//!   truncated
//!
//! ## Last Modified
//! v0.1.0 - Initial block encryption

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};

use super::{AES_KEY_SIZE, BASE_IV_SIZE, GCM_TAG_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::codec::PAD_BYTE;

/// AES-256-GCM with the protocol's 16-byte IVs.
type BlockCipher = AesGcm<Aes256, U16>;

// ============================================
// Padding
// ============================================

/// Pads `data` to exactly `padded_len` bytes with `#` fill.
///
/// # Errors
/// Returns `LargeMessage` if `data.len() >= padded_len`; callers must
/// leave at least one byte of padding room.
pub fn pad(data: &[u8], padded_len: usize) -> Result<Vec<u8>> {
    if data.len() >= padded_len {
        return Err(CoreError::large_message(data.len(), padded_len));
    }
    let mut padded = Vec::with_capacity(padded_len);
    padded.extend_from_slice(data);
    padded.resize(padded_len, PAD_BYTE);
    Ok(padded)
}

/// Strips trailing `#` padding.
#[must_use]
pub fn unpad(padded: &[u8]) -> &[u8] {
    let end = padded
        .iter()
        .rposition(|&b| b != PAD_BYTE)
        .map_or(0, |i| i + 1);
    &padded[..end]
}

// ============================================
// Seal / Open
// ============================================

/// Pads and encrypts one block.
///
/// # Arguments
/// * `key` - 32-byte AES key
/// * `iv` - 16-byte derived IV (one counter value, never reused)
/// * `padded_len` - plaintext capacity (`block_size - 16`)
/// * `plaintext` - payload, strictly shorter than `padded_len`
///
/// # Returns
/// `padded_len + 16` bytes: ciphertext with the GCM tag appended.
///
/// # Errors
/// - `LargeMessage` if the payload does not fit
/// - `Encryption` if the cipher rejects the inputs
pub fn seal_block(
    key: &[u8; AES_KEY_SIZE],
    iv: &[u8; BASE_IV_SIZE],
    padded_len: usize,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let padded = pad(plaintext, padded_len)?;

    let cipher = BlockCipher::new_from_slice(key)
        .map_err(|_| CoreError::encryption("cipher init"))?;
    let nonce = Nonce::<U16>::from_slice(iv);

    cipher
        .encrypt(nonce, padded.as_slice())
        .map_err(|_| CoreError::encryption("AES-256-GCM seal"))
}

/// Decrypts and verifies one block.
///
/// # Arguments
/// * `key` - 32-byte AES key
/// * `iv` - 16-byte derived IV matching the sender's counter
/// * `ciphertext` - exactly `padded_len + 16` bytes as sealed
///
/// # Returns
/// The padded plaintext (`ciphertext.len() - 16` bytes). Padding is
/// left in place; the wire parser strips it.
///
/// # Errors
/// Returns `Decryption` on authentication failure or malformed input.
pub fn open_block(
    key: &[u8; AES_KEY_SIZE],
    iv: &[u8; BASE_IV_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.len() < GCM_TAG_SIZE {
        return Err(CoreError::Decryption);
    }

    let cipher = BlockCipher::new_from_slice(key).map_err(|_| CoreError::Decryption)?;
    let nonce = Nonce::<U16>::from_slice(iv);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CoreError::Decryption)
}

// ============================================
// Tests
// ============================================
