// ============================================
// File: crates/smp-core/src/crypto/rsa.rs
// ============================================
//! # RSA Operations
//!
//! ## Creation Reason
//! Provides the asymmetric half of the protocol: OAEP key delivery
//! during the handshake, PSS transmission signatures, and the one-shot
//! end-to-end message envelope.
//!
//! ## Main Functionality
//! - `encrypt_oaep` / `decrypt_oaep`: RSA-OAEP-SHA256
//! - `sign_pss` / `verify_pss`: RSA-PSS-SHA256, salt length 32
//! - `seal_e2e` / `open_e2e`: hybrid RSA+AES envelope
//! - `sha256`: digest helper
//!
//! ## E2E Envelope Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ RSA-OAEP(aes_key ‖ base_iv)   │ modulus bytes    │
//! ├──────────────────────────────────────────────────┤
//! │ AES-256-GCM block             │ block_len bytes  │
//! │ └─ '#'-padded data + tag      │                  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - PSS signatures are over the SHA-256 digest of the message; the
//!   salt length (32) is part of the wire contract
//! - OAEP fits at most `modulus - 2*32 - 2` bytes; the handshake body
//!   (102 bytes) and the E2E header (48 bytes) both fit RSA-2048
//!
//! ## Last Modified
//! v0.1.0 - Initial RSA operations

use rand::rngs::OsRng;
use rsa::{Oaep, Pss};
use sha2::{Digest, Sha256};

use super::aead::{open_block, seal_block, unpad};
use super::keys::{RsaKeyPair, SessionKey, SpkiPublicKey};
use super::{AES_KEY_SIZE, BASE_IV_SIZE, GCM_TAG_SIZE, PSS_SALT_LEN};
use crate::error::{CoreError, Result};

/// Size of the E2E envelope header (AES key and base IV).
const E2E_HEADER_SIZE: usize = AES_KEY_SIZE + BASE_IV_SIZE;

// ============================================
// Digest
// ============================================

/// Computes the SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

// ============================================
// OAEP
// ============================================

/// Encrypts `plaintext` under the public key with RSA-OAEP-SHA256.
///
/// # Errors
/// Returns `Encryption` if the payload exceeds the OAEP capacity.
pub fn encrypt_oaep(public_key: &SpkiPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    public_key
        .inner()
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CoreError::encryption(format!("RSA-OAEP: {}", e)))
}

/// Decrypts an RSA-OAEP-SHA256 ciphertext.
///
/// # Errors
/// Returns `Decryption` if the ciphertext does not decrypt under this
/// key.
pub fn decrypt_oaep(pair: &RsaKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>> {
    pair.private_key()
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CoreError::Decryption)
}

// ============================================
// PSS
// ============================================

/// Signs `message` with RSA-PSS-SHA256 (salt length 32).
///
/// # Errors
/// Returns `SignatureCreation` if the signing operation fails.
pub fn sign_pss(pair: &RsaKeyPair, message: &[u8]) -> Result<Vec<u8>> {
    let digest = sha256(message);
    pair.private_key()
        .sign_with_rng(&mut OsRng, Pss::new_with_salt::<Sha256>(PSS_SALT_LEN), &digest)
        .map_err(|e| CoreError::signature_creation(e.to_string()))
}

/// Verifies an RSA-PSS-SHA256 signature (salt length 32).
///
/// # Errors
/// Returns `SignatureVerification` if the signature does not match.
pub fn verify_pss(public_key: &SpkiPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let digest = sha256(message);
    public_key
        .inner()
        .verify(
            Pss::new_with_salt::<Sha256>(PSS_SALT_LEN),
            &digest,
            signature,
        )
        .map_err(|_| CoreError::SignatureVerification)
}

// ============================================
// E2E Envelope
// ============================================

/// Seals `data` for the holder of `public_key`.
///
/// Generates a fresh AES key and base IV, seals `data` as one
/// `block_len`-byte GCM block (padded to `block_len - 16`), and wraps
/// the key material under RSA-OAEP. The result is
/// `modulus_size + block_len` bytes.
///
/// # Errors
/// - `LargeMessage` if `data` does not fit the block
/// - `Encryption` on cipher failure
pub fn seal_e2e(public_key: &SpkiPublicKey, block_len: usize, data: &[u8]) -> Result<Vec<u8>> {
    if block_len <= GCM_TAG_SIZE {
        return Err(CoreError::encryption("E2E block too small"));
    }
    let mut session = SessionKey::generate();
    let iv = session.next_iv()?;

    let mut header = [0u8; E2E_HEADER_SIZE];
    header[..AES_KEY_SIZE].copy_from_slice(session.aes_key());
    header[AES_KEY_SIZE..].copy_from_slice(session.base_iv());

    let mut out = encrypt_oaep(public_key, &header)?;
    out.extend_from_slice(&seal_block(
        session.aes_key(),
        &iv,
        block_len - GCM_TAG_SIZE,
        data,
    )?);
    Ok(out)
}

/// Opens an envelope produced by [`seal_e2e`], stripping the padding.
///
/// # Errors
/// Returns `Decryption` if either layer fails to decrypt or the header
/// is malformed.
pub fn open_e2e(pair: &RsaKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let modulus = pair.public_key().modulus_size();
    if ciphertext.len() <= modulus {
        return Err(CoreError::Decryption);
    }
    let (wrapped, sealed) = ciphertext.split_at(modulus);

    let header = decrypt_oaep(pair, wrapped)?;
    if header.len() != E2E_HEADER_SIZE {
        return Err(CoreError::Decryption);
    }
    let mut aes_key = [0u8; AES_KEY_SIZE];
    let mut base_iv = [0u8; BASE_IV_SIZE];
    aes_key.copy_from_slice(&header[..AES_KEY_SIZE]);
    base_iv.copy_from_slice(&header[AES_KEY_SIZE..]);

    let mut session = SessionKey::from_parts(aes_key, base_iv);
    let iv = session.next_iv()?;

    let padded = open_block(session.aes_key(), &iv, sealed)?;
    Ok(unpad(&padded).to_vec())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    // RSA key generation is slow; share one pair across tests.
    fn test_pair() -> &'static RsaKeyPair {
        static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RsaKeyPair::generate().expect("RSA key generation"))
    }

    #[test]
    fn test_oaep_roundtrip() {
        let pair = test_pair();
        let plaintext = b"handshake body bytes";

        let ciphertext = encrypt_oaep(pair.public_key(), plaintext).unwrap();
        assert_eq!(ciphertext.len(), pair.public_key().modulus_size());

        let decrypted = decrypt_oaep(pair, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_oaep_capacity() {
        let pair = test_pair();
        // 2048-bit modulus, SHA-256: 256 - 2*32 - 2 = 190 bytes
        let max = vec![0x55u8; 190];
        assert!(encrypt_oaep(pair.public_key(), &max).is_ok());

        let over = vec![0x55u8; 191];
        assert!(encrypt_oaep(pair.public_key(), &over).is_err());
    }

    #[test]
    fn test_pss_sign_verify() {
        let pair = test_pair();
        let message = b"0 YWJj SEND 2 hi ";

        let signature = sign_pss(pair, message).unwrap();
        assert_eq!(signature.len(), pair.public_key().modulus_size());
        assert!(verify_pss(pair.public_key(), message, &signature).is_ok());
    }

    #[test]
    fn test_pss_rejects_modified_message() {
        let pair = test_pair();
        let signature = sign_pss(pair, b"original").unwrap();

        assert!(matches!(
            verify_pss(pair.public_key(), b"tampered", &signature),
            Err(CoreError::SignatureVerification)
        ));
    }

    #[test]
    fn test_pss_rejects_corrupted_signature() {
        let pair = test_pair();
        let mut signature = sign_pss(pair, b"message").unwrap();
        signature[0] ^= 0xFF;
        assert!(verify_pss(pair.public_key(), b"message", &signature).is_err());
    }

    #[test]
    fn test_e2e_roundtrip() {
        let pair = test_pair();
        let data = b"end to end payload";
        let block_len = 1024;

        let sealed = seal_e2e(pair.public_key(), block_len, data).unwrap();
        assert_eq!(
            sealed.len(),
            pair.public_key().modulus_size() + block_len
        );

        let opened = open_e2e(pair, &sealed).unwrap();
        assert_eq!(opened, data);
    }

    #[test]
    fn test_e2e_rejects_truncated() {
        let pair = test_pair();
        let sealed = seal_e2e(pair.public_key(), 512, b"data").unwrap();
        assert!(open_e2e(pair, &sealed[..200]).is_err());
    }

    #[test]
    fn test_e2e_rejects_oversized_payload() {
        let pair = test_pair();
        // Capacity is block_len - 16, exclusive
        let data = vec![0u8; 512 - GCM_TAG_SIZE];
        assert!(matches!(
            seal_e2e(pair.public_key(), 512, &data),
            Err(CoreError::LargeMessage { .. })
        ));
    }

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
