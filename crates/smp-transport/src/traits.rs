// ============================================
// File: crates/smp-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the abstract interface for the byte channel the SMP client
//! runs over, enabling testability and flexibility in implementation
//! choices.
//!
//! ## Main Functionality
//! - `FramedConnection`: Bidirectional message-framed byte channel
//!
//! ## Design Philosophy
//! - Traits enable mock implementations for testing
//! - Async-first design with `async_trait`
//! - Frame boundaries are preserved: one `send_frame` produces exactly
//!   one `recv_frame` on the peer
//!
//! ## ⚠️ Important Note for Next Developer
//! - All trait methods are async for consistency
//! - Implementations must be Send + Sync for use in async contexts
//! - Binary frames only; the protocol has no text mode
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use async_trait::async_trait;

use crate::error::Result;

// ============================================
// Constants
// ============================================

/// Upper bound on a single frame.
///
/// The largest protocol block is 65536 bytes; anything past 1 MiB is a
/// corrupt length prefix or a hostile peer.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

// ============================================
// FramedConnection Trait
// ============================================

/// Abstract interface for a bidirectional, message-framed byte channel.
///
/// # Purpose
/// The SMP session layer needs exactly this: whole binary frames in,
/// whole binary frames out, in order, with a clean end-of-stream
/// signal. A TCP stream with length prefixes satisfies it; so does a
/// WebSocket in binary mode or an in-memory test channel.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the client shares one
/// connection between its sender path and its inbound loop.
///
/// # Example
/// ```ignore
/// async fn echo<C: FramedConnection>(conn: &C) -> Result<()> {
///     loop {
///         let frame = conn.recv_frame().await?;
///         conn.send_frame(&frame).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait FramedConnection: Send + Sync {
    /// Sends one frame.
    ///
    /// The frame arrives at the peer as a single `recv_frame` result,
    /// never split or merged.
    ///
    /// # Errors
    /// Returns an error if the channel is closed or the send fails.
    async fn send_frame(&self, frame: &[u8]) -> Result<()>;

    /// Receives the next frame.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`](crate::TransportError::Closed)
    /// once the peer has closed and all buffered frames are drained.
    async fn recv_frame(&self) -> Result<Vec<u8>>;

    /// Closes the channel in both directions.
    ///
    /// Frames already in flight may still be delivered to the peer.
    ///
    /// # Errors
    /// Returns an error if the shutdown handshake fails.
    async fn close(&self) -> Result<()>;

    /// Returns `true` while the channel can still send.
    fn is_open(&self) -> bool;
}
