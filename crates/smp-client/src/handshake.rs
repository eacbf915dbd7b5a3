// ============================================
// File: crates/smp-client/src/handshake.rs
// ============================================
//! # Session Handshake
//!
//! ## Creation Reason
//! Implements the client side of the session handshake: key delivery
//! under the server's RSA key and the version welcome check.
//!
//! ## Main Functionality
//! - `ServerHeader` / `ClientHello`: fixed binary handshake messages
//! - `handshake`: runs the full client handshake, returning an
//!   established [`SecureConnection`]
//!
//! ## Handshake Flow
//! ```text
//! Client                                          Broker
//!   │ ◄──────────── header (8 bytes) ─────────────── │
//!   │               block size, mode, key size       │
//!   │ ◄──────────── RSA public key (SPKI) ─────────── │
//!   │   check pinned fingerprint                     │
//!   │   generate send/recv session keys              │
//!   │ ─── RSA-OAEP(ClientHello, 102 bytes) ────────► │
//!   │ ◄──────────── welcome block ─────────────────── │
//!   │   version line "a.b.c.d", reject if ahead      │
//!   │ ═══════════ encrypted blocks ═══════════════════│
//! ```
//!
//! ## Error Handling
//! Every check is fatal: a bad header, a key-pin mismatch, or an
//! incompatible version leaves the connection unusable and the caller
//! drops it.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The header and the key blob are two separate frames
//! - The ClientHello layout is a wire contract; field order and sizes
//!   must not change without a protocol version bump
//! - The version token scan is capped; a welcome without an early
//!   terminator is malformed, not merely incompatible
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake implementation

use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BufMut};
use tracing::{debug, info, warn};

use smp_common::KeyHash;
use smp_core::crypto::rsa::encrypt_oaep;
use smp_core::crypto::{SessionKey, SpkiPublicKey, AES_KEY_SIZE, BASE_IV_SIZE};
use smp_core::protocol::codec::PAD_BYTE;
use smp_core::protocol::{SmpVersion, CURRENT_VERSION};
use smp_transport::FramedConnection;

use crate::error::{ClientError, Result};
use crate::session::SecureConnection;

// ============================================
// Constants
// ============================================

/// Transport mode constant for the binary RSA transport.
pub const RSA_TRANSPORT_MODE: u16 = 0;

/// Smallest acceptable block size.
pub const MIN_BLOCK_SIZE: usize = 4096;

/// Largest acceptable block size.
pub const MAX_BLOCK_SIZE: usize = 65536;

/// Size of the fixed server header in bytes.
pub const SERVER_HEADER_SIZE: usize = 8;

/// Size of the encoded ClientHello in bytes.
pub const CLIENT_HELLO_SIZE: usize = 4 + 2 + 2 * (AES_KEY_SIZE + BASE_IV_SIZE);

/// How far into the welcome plaintext to look for the version token.
const VERSION_SCAN_LIMIT: usize = 50;

// ============================================
// ServerHeader
// ============================================

/// The fixed 8-byte header the broker sends first.
///
/// # Wire Format (big-endian)
/// ```text
/// ┌────────────────────────────────────────────┐
/// │ block_size (4 bytes)                       │
/// ├────────────────────────────────────────────┤
/// │ transport_mode (2 bytes)     │ 0 = RSA     │
/// ├────────────────────────────────────────────┤
/// │ key_size (2 bytes)           │ SPKI length │
/// └────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHeader {
    /// Block size for the connection.
    pub block_size: usize,
    /// Transport mode (must be [`RSA_TRANSPORT_MODE`]).
    pub transport_mode: u16,
    /// Length of the key frame that follows.
    pub key_size: usize,
}

impl ServerHeader {
    /// Encodes the header (used by broker-side test fixtures).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SERVER_HEADER_SIZE);
        out.put_u32(self.block_size as u32);
        out.put_u16(self.transport_mode);
        out.put_u16(self.key_size as u16);
        out
    }

    /// Decodes and validates a header frame.
    ///
    /// # Errors
    /// Rejects wrong frame sizes, out-of-range block sizes, and
    /// unknown transport modes.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() != SERVER_HEADER_SIZE {
            return Err(ClientError::bad_server_header(format!(
                "expected {} bytes, got {}",
                SERVER_HEADER_SIZE,
                frame.len()
            )));
        }
        let mut buf = frame;
        let block_size = buf.get_u32() as usize;
        let transport_mode = buf.get_u16();
        let key_size = buf.get_u16() as usize;

        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(ClientError::BlockSizeOutOfRange { size: block_size });
        }
        if transport_mode != RSA_TRANSPORT_MODE {
            return Err(ClientError::UnsupportedTransportMode {
                mode: transport_mode,
            });
        }
        Ok(Self {
            block_size,
            transport_mode,
            key_size,
        })
    }
}

// ============================================
// ClientHello
// ============================================

/// The client's handshake body, sent RSA-OAEP-encrypted as one frame.
///
/// # Wire Format (102 bytes before encryption)
/// ```text
/// ┌────────────────────────────────────────────┐
/// │ block_size (4 bytes, big-endian)           │
/// ├────────────────────────────────────────────┤
/// │ transport_mode (2 bytes)     │ always 0    │
/// ├────────────────────────────────────────────┤
/// │ send AES key (32 bytes)                    │
/// ├────────────────────────────────────────────┤
/// │ send base IV (16 bytes)                    │
/// ├────────────────────────────────────────────┤
/// │ recv AES key (32 bytes)                    │
/// ├────────────────────────────────────────────┤
/// │ recv base IV (16 bytes)                    │
/// └────────────────────────────────────────────┘
/// ```
/// Directions are from the client's point of view: the broker
/// encrypts its blocks with the client's receive key.
pub struct ClientHello {
    /// Echo of the negotiated block size.
    pub block_size: usize,
    /// Client-to-broker session key.
    pub send_key: SessionKey,
    /// Broker-to-client session key.
    pub recv_key: SessionKey,
}

impl ClientHello {
    /// Encodes the hello body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CLIENT_HELLO_SIZE);
        out.put_u32(self.block_size as u32);
        out.put_u16(RSA_TRANSPORT_MODE);
        out.extend_from_slice(self.send_key.aes_key());
        out.extend_from_slice(self.send_key.base_iv());
        out.extend_from_slice(self.recv_key.aes_key());
        out.extend_from_slice(self.recv_key.base_iv());
        out
    }

    /// Decodes a hello body (used by broker-side test fixtures).
    ///
    /// # Errors
    /// Rejects wrong sizes and unknown transport modes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() != CLIENT_HELLO_SIZE {
            return Err(ClientError::bad_server_header(format!(
                "hello body: expected {} bytes, got {}",
                CLIENT_HELLO_SIZE,
                body.len()
            )));
        }
        let mut buf = body;
        let block_size = buf.get_u32() as usize;
        let transport_mode = buf.get_u16();
        if transport_mode != RSA_TRANSPORT_MODE {
            return Err(ClientError::UnsupportedTransportMode {
                mode: transport_mode,
            });
        }

        let mut send_aes = [0u8; AES_KEY_SIZE];
        let mut send_iv = [0u8; BASE_IV_SIZE];
        let mut recv_aes = [0u8; AES_KEY_SIZE];
        let mut recv_iv = [0u8; BASE_IV_SIZE];
        buf.copy_to_slice(&mut send_aes);
        buf.copy_to_slice(&mut send_iv);
        buf.copy_to_slice(&mut recv_aes);
        buf.copy_to_slice(&mut recv_iv);

        Ok(Self {
            block_size,
            send_key: SessionKey::from_parts(send_aes, send_iv),
            recv_key: SessionKey::from_parts(recv_aes, recv_iv),
        })
    }
}

// ============================================
// Handshake
// ============================================

/// Runs the client handshake over `conn`.
///
/// # Arguments
/// * `conn` - Freshly opened framed channel to the broker
/// * `expected_key_hash` - Pinned fingerprint of the broker key, if any
/// * `write_timeout` - Per-block write bound for the resulting session
///
/// # Errors
/// Any header, key, or version check failure is fatal; the caller
/// should drop the connection.
pub async fn handshake(
    conn: Arc<dyn FramedConnection>,
    expected_key_hash: Option<&KeyHash>,
    write_timeout: Duration,
) -> Result<SecureConnection> {
    // Steps 1-2: fixed header, then the server's public key
    let header = ServerHeader::decode(&conn.recv_frame().await?)?;
    debug!(
        block_size = header.block_size,
        key_size = header.key_size,
        "server header received"
    );

    let key_frame = conn.recv_frame().await?;
    if key_frame.len() != header.key_size {
        return Err(ClientError::bad_server_header(format!(
            "key frame: expected {} bytes, got {}",
            header.key_size,
            key_frame.len()
        )));
    }
    let server_key = SpkiPublicKey::from_spki_der(&key_frame)?;

    if let Some(pinned) = expected_key_hash {
        let fingerprint = server_key.fingerprint();
        if fingerprint != *pinned {
            warn!(%fingerprint, "server key hash does not match pinned value");
            return Err(ClientError::KeyHashMismatch);
        }
    }

    // Step 3: fresh session keys, one per direction
    let hello = ClientHello {
        block_size: header.block_size,
        send_key: SessionKey::generate(),
        recv_key: SessionKey::generate(),
    };

    // Step 4: deliver them under the server's key
    let wrapped = encrypt_oaep(&server_key, &hello.encode())?;
    conn.send_frame(&wrapped).await?;

    // Steps 5-6: the broker switches to the session keys and sends the
    // welcome block
    let session = SecureConnection::new(
        conn,
        hello.send_key,
        hello.recv_key,
        header.block_size,
        write_timeout,
    );

    let welcome = session.read_block().await?;
    let server_version = parse_welcome(&welcome)?;
    if !CURRENT_VERSION.accepts(&server_version) {
        return Err(ClientError::IncompatibleVersion {
            server: server_version,
            client: CURRENT_VERSION,
        });
    }

    info!(
        block_size = header.block_size,
        server_version = %server_version,
        "handshake complete"
    );
    Ok(session)
}

/// Extracts the version token from a welcome plaintext.
///
/// The token runs to the first space (or the padding), and must appear
/// within the first [`VERSION_SCAN_LIMIT`] bytes.
///
/// # Errors
/// Returns `MalformedWelcome` when no readable token is found.
pub fn parse_welcome(plaintext: &[u8]) -> Result<SmpVersion> {
    let scan_len = plaintext.len().min(VERSION_SCAN_LIMIT);
    let scan = &plaintext[..scan_len];

    let token = match scan.iter().position(|&b| b == b' ' || b == PAD_BYTE) {
        Some(end) => &scan[..end],
        None if plaintext.len() <= VERSION_SCAN_LIMIT => scan,
        None => {
            return Err(ClientError::malformed_welcome(format!(
                "no version terminator within {} bytes",
                VERSION_SCAN_LIMIT
            )))
        }
    };

    let text = std::str::from_utf8(token)
        .map_err(|_| ClientError::malformed_welcome("version token is not ASCII"))?;
    text.parse::<SmpVersion>()
        .map_err(|_| ClientError::malformed_welcome(format!("bad version token '{}'", text)))
}

// ============================================
// Tests
// ============================================
