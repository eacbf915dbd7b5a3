// ============================================
// File: crates/smp-transport/src/mock.rs
// ============================================
//! # Mock Framed Channel
//!
//! ## Creation Reason
//! Provides an in-memory connected channel pair for testing without
//! sockets, letting tests script a broker against a real client.
//!
//! ## Main Functionality
//! - `MockConnection::pair()`: two connected endpoints
//! - In-memory frame queues with FIFO delivery
//! - Close-then-drain semantics matching a real socket
//!
//! ## Usage in Tests
//! ```
//! use smp_transport::mock::MockConnection;
//! use smp_transport::traits::FramedConnection;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (client, broker) = MockConnection::pair();
//! client.send_frame(b"hello").await.unwrap();
//! assert_eq!(broker.recv_frame().await.unwrap(), b"hello");
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - Queues are unbounded; tests are expected to stay small
//! - Closing either endpoint closes both directions, but buffered
//!   frames still drain before `Closed` is reported
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Result, TransportError};
use crate::traits::FramedConnection;

// ============================================
// Pipe
// ============================================

/// One direction of the channel: a frame queue plus wakeup state.
struct Pipe {
    frames: Mutex<VecDeque<Vec<u8>>>,
    closed: AtomicBool,
    notify: Notify,
}

impl Pipe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(VecDeque::with_capacity(16)),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    fn push(&self, frame: Vec<u8>) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.frames.lock().push_back(frame);
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self) -> Result<Vec<u8>> {
        loop {
            {
                let mut frames = self.frames.lock();
                if let Some(frame) = frames.pop_front() {
                    return Ok(frame);
                }
                if self.closed.load(Ordering::Acquire) {
                    return Err(TransportError::Closed);
                }
            }
            self.notify.notified().await;
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Wake a parked reader and leave a permit for one about to park
        self.notify.notify_waiters();
        self.notify.notify_one();
    }
}

// ============================================
// MockConnection
// ============================================

/// One endpoint of an in-memory framed channel pair.
pub struct MockConnection {
    incoming: Arc<Pipe>,
    outgoing: Arc<Pipe>,
}

impl MockConnection {
    /// Creates two connected endpoints.
    ///
    /// Frames sent on one arrive, in order, on the other.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a_to_b = Pipe::new();
        let b_to_a = Pipe::new();

        let a = Self {
            incoming: Arc::clone(&b_to_a),
            outgoing: Arc::clone(&a_to_b),
        };
        let b = Self {
            incoming: a_to_b,
            outgoing: b_to_a,
        };
        (a, b)
    }

    /// Returns the number of frames waiting to be received.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.incoming.frames.lock().len()
    }
}

#[async_trait]
impl FramedConnection for MockConnection {
    async fn send_frame(&self, frame: &[u8]) -> Result<()> {
        self.outgoing.push(frame.to_vec())
    }

    async fn recv_frame(&self) -> Result<Vec<u8>> {
        self.incoming.pop().await
    }

    async fn close(&self) -> Result<()> {
        self.outgoing.close();
        self.incoming.close();
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.outgoing.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection")
            .field("open", &self.is_open())
            .field("pending", &self.pending_count())
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_arrive_in_order() {
        let (a, b) = MockConnection::pair();

        a.send_frame(b"one").await.unwrap();
        a.send_frame(b"two").await.unwrap();
        a.send_frame(b"three").await.unwrap();

        assert_eq!(b.recv_frame().await.unwrap(), b"one");
        assert_eq!(b.recv_frame().await.unwrap(), b"two");
        assert_eq!(b.recv_frame().await.unwrap(), b"three");
    }

    #[tokio::test]
    async fn test_both_directions() {
        let (a, b) = MockConnection::pair();

        a.send_frame(b"ping").await.unwrap();
        assert_eq!(b.recv_frame().await.unwrap(), b"ping");

        b.send_frame(b"pong").await.unwrap();
        assert_eq!(a.recv_frame().await.unwrap(), b"pong");
    }

    #[tokio::test]
    async fn test_recv_waits_for_send() {
        let (a, b) = MockConnection::pair();

        let reader = tokio::spawn(async move { b.recv_frame().await.unwrap() });
        tokio::task::yield_now().await;

        a.send_frame(b"late frame").await.unwrap();
        assert_eq!(reader.await.unwrap(), b"late frame");
    }

    #[tokio::test]
    async fn test_close_drains_then_signals() {
        let (a, b) = MockConnection::pair();

        a.send_frame(b"buffered").await.unwrap();
        a.close().await.unwrap();

        assert_eq!(b.recv_frame().await.unwrap(), b"buffered");
        assert!(matches!(b.recv_frame().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_wakes_parked_reader() {
        let (a, b) = MockConnection::pair();

        let reader = tokio::spawn(async move { b.recv_frame().await });
        tokio::task::yield_now().await;

        a.close().await.unwrap();
        assert!(matches!(reader.await.unwrap(), Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (a, _b) = MockConnection::pair();
        a.close().await.unwrap();
        assert!(!a.is_open());
        assert!(matches!(
            a.send_frame(b"x").await,
            Err(TransportError::Closed)
        ));
    }
}
