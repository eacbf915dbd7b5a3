// ============================================
// File: crates/smp-client/src/queue.rs
// ============================================
//! # Bounded Delivery Queue
//!
//! ## Creation Reason
//! Provides the bounded FIFO handed to the application for unsolicited
//! broker pushes, with async suspension on both ends and clean
//! close-then-drain semantics.
//!
//! ## Main Functionality
//! - `DeliveryQueue<T>`: Bounded async FIFO
//! - `enqueue`: Suspends while full; fails once closed
//! - `dequeue`: Suspends while empty; `None` after close and drain
//!
//! ## Queue Lifecycle
//! ```text
//! ┌──────────┐   close()    ┌─────────┐   drained    ┌──────────┐
//! │  Open    │ ───────────► │ Closing │ ───────────► │  Ended   │
//! │ en/deq   │              │ deq only│              │ deq=None │
//! └──────────┘              └─────────┘              └──────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Wakeups use the notify-enable pattern: interest is registered
//!   BEFORE the state check, so a close or push between the check and
//!   the await cannot be lost
//! - Strict FIFO across producers and consumers is part of the
//!   contract; the inbound loop relies on it for per-queue ordering
//!
//! ## Last Modified
//! v0.1.0 - Initial queue implementation

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tokio::sync::Notify;

// ============================================
// QueueClosed
// ============================================

/// Returned by [`DeliveryQueue::enqueue`] when the queue is closed,
/// handing the rejected item back to the caller.
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueClosed(..)")
    }
}

// ============================================
// DeliveryQueue
// ============================================

struct State<T> {
    buf: VecDeque<T>,
    closed: bool,
}

/// A bounded async FIFO.
///
/// Producers suspend when the queue is full; consumers suspend when it
/// is empty. After [`close`](Self::close), consumers drain whatever is
/// buffered and then observe end-of-stream.
///
/// # Example
/// ```
/// use smp_client::queue::DeliveryQueue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = DeliveryQueue::new(4);
/// queue.enqueue(1u32).await.unwrap();
/// queue.enqueue(2u32).await.unwrap();
/// queue.close();
///
/// assert_eq!(queue.dequeue().await, Some(1));
/// assert_eq!(queue.dequeue().await, Some(2));
/// assert_eq!(queue.dequeue().await, None);
/// # }
/// ```
pub struct DeliveryQueue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    /// Signalled when an item arrives or the queue closes.
    items: Notify,
    /// Signalled when space frees up or the queue closes.
    space: Notify,
}

impl<T> DeliveryQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            state: Mutex::new(State {
                buf: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            items: Notify::new(),
            space: Notify::new(),
        }
    }

    /// Appends an item, suspending while the queue is full.
    ///
    /// # Errors
    /// Returns the item back inside [`QueueClosed`] if the queue has
    /// been closed.
    pub async fn enqueue(&self, item: T) -> Result<(), QueueClosed<T>> {
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(QueueClosed(item));
                }
                if state.buf.len() < self.capacity {
                    state.buf.push_back(item);
                    drop(state);
                    self.items.notify_one();
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Removes the oldest item, suspending while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let notified = self.items.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if let Some(item) = state.buf.pop_front() {
                    drop(state);
                    self.space.notify_one();
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Closes the queue.
    ///
    /// Buffered items remain dequeueable; further `enqueue` calls fail
    /// and suspended callers on both sides are woken.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.items.notify_waiters();
        self.space.notify_waiters();
    }

    /// Returns the number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().buf.len()
    }

    /// Returns `true` if no items are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().buf.is_empty()
    }

    /// Returns `true` if the queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for DeliveryQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
