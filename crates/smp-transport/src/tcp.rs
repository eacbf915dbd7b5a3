// ============================================
// File: crates/smp-transport/src/tcp.rs
// ============================================
//! # TCP Framed Channel
//!
//! ## Creation Reason
//! Provides the production implementation of [`FramedConnection`] over
//! a TCP stream, carrying frame boundaries with a length prefix.
//!
//! ## Main Functionality
//! - `TcpFramedConnection`: Length-prefixed framing over TCP
//! - Connection establishment with a bounded timeout
//!
//! ## Frame Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ length (4 bytes, big-endian)             │
//! ├──────────────────────────────────────────┤
//! │ payload (length bytes)                   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The read and write halves are locked independently so the client
//!   can send while its inbound loop is blocked on a read
//! - A clean EOF from the peer surfaces as `TransportError::Closed`
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP implementation

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{FramedConnection, MAX_FRAME_SIZE};

// ============================================
// TcpFramedConnection
// ============================================

/// A [`FramedConnection`] over TCP with 4-byte length prefixes.
///
/// # Example
/// ```ignore
/// let conn = TcpFramedConnection::connect("localhost", 5223, Duration::from_secs(5)).await?;
/// conn.send_frame(b"hello").await?;
/// ```
pub struct TcpFramedConnection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    peer: String,
    open: AtomicBool,
}

impl TcpFramedConnection {
    /// Connects to `host:port` within `timeout`.
    ///
    /// # Errors
    /// Returns `ConnectFailed` on refusal or timeout.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::connect_failed(&addr, "connect timed out"))?
            .map_err(|e| TransportError::connect_failed(&addr, e.to_string()))?;

        debug!(peer = %addr, "TCP connection established");
        Ok(Self::from_stream(stream, addr))
    }

    /// Wraps an already-connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream, peer: String) -> Self {
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            peer,
            open: AtomicBool::new(true),
        }
    }

    /// Returns the peer address this connection was opened against.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl FramedConnection for TcpFramedConnection {
    async fn send_frame(&self, frame: &[u8]) -> Result<()> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        let mut writer = self.writer.lock().await;
        let write = async {
            writer.write_u32(frame.len() as u32).await?;
            writer.write_all(frame).await?;
            writer.flush().await?;
            Ok::<(), io::Error>(())
        };
        write.await.map_err(|e| {
            self.open.store(false, Ordering::SeqCst);
            TransportError::send_failed(e.to_string())
        })
    }

    async fn recv_frame(&self) -> Result<Vec<u8>> {
        let mut reader = self.reader.lock().await;

        let len = match reader.read_u32().await {
            Ok(len) => len as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.open.store(false, Ordering::SeqCst);
                return Err(TransportError::Closed);
            }
            Err(e) => {
                self.open.store(false, Ordering::SeqCst);
                return Err(TransportError::receive_failed(e.to_string()));
            }
        };

        if len > MAX_FRAME_SIZE {
            self.open.store(false, Ordering::SeqCst);
            return Err(TransportError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame).await.map_err(|e| {
            self.open.store(false, Ordering::SeqCst);
            if e.kind() == io::ErrorKind::UnexpectedEof {
                TransportError::Closed
            } else {
                TransportError::receive_failed(e.to_string())
            }
        })?;
        Ok(frame)
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        // A failed shutdown means the peer is already gone
        let _ = writer.shutdown().await;
        debug!(peer = %self.peer, "TCP connection closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for TcpFramedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpFramedConnection")
            .field("peer", &self.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
