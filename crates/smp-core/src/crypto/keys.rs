// ============================================
// File: crates/smp-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! Defines key types used throughout the SMP protocol with proper
//! security properties (zeroize on drop, redacting Debug output).
//!
//! ## Main Functionality
//! - `RsaKeyPair`: RSA-2048 key pair for signing and key decryption
//! - `SpkiPublicKey`: RSA public key carried as X.509 SPKI DER bytes
//! - `SessionKey`: Per-direction AES key, base IV, and block counter
//! - `derive_iv`: Deterministic per-block IV derivation
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  RsaKeyPair (per queue / per server)                       │
//! │  ├─ Recipient and sender verification keys (PSS signing)   │
//! │  └─ Broker key wraps the handshake body (OAEP)             │
//! │                                                            │
//! │  SessionKey (per connection direction)                     │
//! │  ├─ Generated fresh during the handshake                   │
//! │  ├─ Never rotated; lives until the transport closes        │
//! │  └─ Counter advances once per block, never wraps           │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## IV Derivation
//! ```text
//! iv[0..4]  = base_iv[0..4] XOR counter (big-endian u32)
//! iv[4..16] = base_iv[4..16]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Session key material MUST be zeroized on drop
//! - Private keys should NEVER be logged or serialized carelessly
//! - Counter exhaustion is a hard failure; rekeying is not supported
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use smp_common::KeyHash;

use super::{AES_KEY_SIZE, BASE_IV_SIZE, RSA_KEY_BITS};
use crate::error::{CoreError, Result};

// ============================================
// IV Derivation
// ============================================

/// Derives the IV for one block from a base IV and a block counter.
///
/// The first four bytes of the base IV are XORed with the big-endian
/// encoding of the counter; the remaining twelve bytes pass through.
/// Distinct counters therefore always yield distinct IVs.
#[must_use]
pub fn derive_iv(base_iv: &[u8; BASE_IV_SIZE], counter: u32) -> [u8; BASE_IV_SIZE] {
    let mut iv = *base_iv;
    let c = counter.to_be_bytes();
    for i in 0..4 {
        iv[i] ^= c[i];
    }
    iv
}

// ============================================
// SessionKey
// ============================================

/// Symmetric key state for one direction of an encrypted session.
///
/// # Purpose
/// Holds the AES-256 key, the 16-byte base IV, and the monotonic block
/// counter. Each encrypted (or decrypted) block consumes one counter
/// value via [`SessionKey::next_iv`].
///
/// # Security
/// - Key material is zeroed on drop
/// - The counter fails closed at `u32::MAX` instead of wrapping,
///   because a repeated (key, IV) pair breaks GCM entirely
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    aes_key: [u8; AES_KEY_SIZE],
    base_iv: [u8; BASE_IV_SIZE],
    counter: u32,
}

impl SessionKey {
    /// Generates a fresh session key with a random key and base IV.
    ///
    /// Uses the operating system's secure random number generator.
    /// The counter starts at zero.
    #[must_use]
    pub fn generate() -> Self {
        let mut aes_key = [0u8; AES_KEY_SIZE];
        let mut base_iv = [0u8; BASE_IV_SIZE];
        OsRng.fill_bytes(&mut aes_key);
        OsRng.fill_bytes(&mut base_iv);
        Self {
            aes_key,
            base_iv,
            counter: 0,
        }
    }

    /// Reconstructs a session key from raw parts, counter at zero.
    #[must_use]
    pub const fn from_parts(aes_key: [u8; AES_KEY_SIZE], base_iv: [u8; BASE_IV_SIZE]) -> Self {
        Self {
            aes_key,
            base_iv,
            counter: 0,
        }
    }

    /// Returns the raw AES key bytes.
    ///
    /// # Security Warning
    /// Handle the returned reference carefully. Do not log or store the
    /// key material in unprotected storage.
    #[must_use]
    pub const fn aes_key(&self) -> &[u8; AES_KEY_SIZE] {
        &self.aes_key
    }

    /// Returns the base IV bytes.
    #[must_use]
    pub const fn base_iv(&self) -> &[u8; BASE_IV_SIZE] {
        &self.base_iv
    }

    /// Returns the current counter value.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Derives the IV for the next block and advances the counter.
    ///
    /// # Errors
    /// Returns `CounterExhausted` once the counter cannot advance any
    /// further. The connection must be abandoned at that point.
    pub fn next_iv(&mut self) -> Result<[u8; BASE_IV_SIZE]> {
        let next = self
            .counter
            .checked_add(1)
            .ok_or(CoreError::CounterExhausted)?;
        let iv = derive_iv(&self.base_iv, self.counter);
        self.counter = next;
        Ok(iv)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("SessionKey")
            .field("aes_key", &"[REDACTED]")
            .field("base_iv", &"[REDACTED]")
            .field("counter", &self.counter)
            .finish()
    }
}

// ============================================
// SpkiPublicKey
// ============================================

/// An RSA public key carried on the wire as X.509 SPKI DER bytes.
///
/// # Purpose
/// Wire key blobs and the broker's handshake key are both the SPKI
/// encoding of an RSA public key; this type keeps the decoded key and
/// its canonical DER bytes together so fingerprints stay stable.
#[derive(Clone, PartialEq, Eq)]
pub struct SpkiPublicKey {
    key: RsaPublicKey,
    spki_der: Vec<u8>,
}

impl SpkiPublicKey {
    /// Wraps a decoded RSA public key, recording its SPKI encoding.
    ///
    /// # Errors
    /// Returns `KeyEncoding` if the key cannot be DER-encoded.
    pub fn from_rsa(key: RsaPublicKey) -> Result<Self> {
        let spki_der = key
            .to_public_key_der()
            .map_err(|e| CoreError::key_encoding(format!("SPKI export: {}", e)))?
            .as_bytes()
            .to_vec();
        Ok(Self { key, spki_der })
    }

    /// Decodes a public key from SPKI DER bytes.
    ///
    /// # Errors
    /// Returns `KeyEncoding` if the bytes are not a valid RSA SPKI.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| CoreError::key_encoding(format!("SPKI import: {}", e)))?;
        Ok(Self {
            key,
            spki_der: der.to_vec(),
        })
    }

    /// Returns the SPKI DER bytes (the wire form of this key).
    #[must_use]
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Returns the SHA-256 fingerprint of the SPKI bytes.
    #[must_use]
    pub fn fingerprint(&self) -> KeyHash {
        let digest = Sha256::digest(&self.spki_der);
        KeyHash::new(digest.into())
    }

    /// Returns the modulus size in bytes (the RSA ciphertext size).
    #[must_use]
    pub fn modulus_size(&self) -> usize {
        self.key.size()
    }

    /// Returns the underlying RSA public key.
    #[must_use]
    pub const fn inner(&self) -> &RsaPublicKey {
        &self.key
    }
}

impl fmt::Debug for SpkiPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpkiPublicKey({:?})", self.fingerprint())
    }
}

// ============================================
// RsaKeyPair
// ============================================

/// An RSA-2048 key pair.
///
/// # Purpose
/// Recipients and senders sign transmissions with their pair (PSS);
/// broker-side fixtures decrypt handshake bodies with theirs (OAEP).
///
/// # Example
/// ```
/// use smp_core::crypto::RsaKeyPair;
/// use smp_core::crypto::rsa::{sign_pss, verify_pss};
///
/// let pair = RsaKeyPair::generate().unwrap();
/// let signature = sign_pss(&pair, b"message").unwrap();
/// assert!(verify_pss(pair.public_key(), b"message", &signature).is_ok());
/// ```
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: SpkiPublicKey,
}

impl RsaKeyPair {
    /// Generates a new RSA-2048 key pair.
    ///
    /// # Errors
    /// Returns `KeyGeneration` if the RNG or prime search fails.
    pub fn generate() -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| CoreError::key_generation(format!("RSA-{}: {}", RSA_KEY_BITS, e)))?;
        let public = SpkiPublicKey::from_rsa(private.to_public_key())?;
        Ok(Self { private, public })
    }

    /// Returns the public half.
    #[must_use]
    pub const fn public_key(&self) -> &SpkiPublicKey {
        &self.public
    }

    /// Returns the private key.
    ///
    /// # Security Warning
    /// For use by the signing and decryption operations only.
    #[must_use]
    pub const fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("RsaKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_iv_xors_prefix() {
        let base = [0u8; BASE_IV_SIZE];
        let iv = derive_iv(&base, 0x0102_0304);
        assert_eq!(&iv[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&iv[4..], &base[4..]);
    }

    #[test]
    fn test_derive_iv_unique_per_counter() {
        let base = [0xAB; BASE_IV_SIZE];
        let mut seen = std::collections::HashSet::new();
        for counter in 0..1000u32 {
            assert!(seen.insert(derive_iv(&base, counter)));
        }
    }

    #[test]
    fn test_session_key_counter_advances() {
        let mut key = SessionKey::from_parts([0u8; 32], [0u8; 16]);
        assert_eq!(key.counter(), 0);

        let iv0 = key.next_iv().unwrap();
        let iv1 = key.next_iv().unwrap();
        assert_eq!(key.counter(), 2);
        assert_ne!(iv0, iv1);

        // Counter 0 leaves the base IV untouched
        assert_eq!(iv0, [0u8; 16]);
    }

    #[test]
    fn test_session_key_counter_exhaustion() {
        let mut key = SessionKey::from_parts([0u8; 32], [0u8; 16]);
        key.counter = u32::MAX;
        assert!(matches!(key.next_iv(), Err(CoreError::CounterExhausted)));
        // State unchanged after the failure
        assert_eq!(key.counter(), u32::MAX);
    }

    #[test]
    fn test_session_keys_are_random() {
        let a = SessionKey::generate();
        let b = SessionKey::generate();
        assert_ne!(a.aes_key(), b.aes_key());
        assert_ne!(a.base_iv(), b.base_iv());
    }

    #[test]
    fn test_session_key_debug_redacts() {
        let key = SessionKey::generate();
        let text = format!("{:?}", key);
        assert!(text.contains("REDACTED"));
        assert!(!text.contains(&hex::encode(key.aes_key())));
    }

    #[test]
    fn test_spki_roundtrip_and_fingerprint() {
        let pair = RsaKeyPair::generate().unwrap();
        let der = pair.public_key().spki_der().to_vec();

        let restored = SpkiPublicKey::from_spki_der(&der).unwrap();
        assert_eq!(restored.spki_der(), &der[..]);
        assert_eq!(restored.fingerprint(), pair.public_key().fingerprint());
        assert_eq!(restored.modulus_size(), 256);
    }

    #[test]
    fn test_spki_rejects_garbage() {
        assert!(SpkiPublicKey::from_spki_der(b"not a key").is_err());
    }
}
