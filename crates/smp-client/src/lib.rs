// ============================================
// File: crates/smp-client/src/lib.rs
// ============================================
//! # SMP Client - Connection & Multiplexing Layer
//!
//! ## Creation Reason
//! Provides the user-facing SMP client: it performs the encrypted
//! handshake over a framed channel, multiplexes concurrent requests by
//! correlation id, and delivers unsolicited broker pushes to an
//! application queue.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`client`]: `SmpClient` with typed queue operations
//! - [`handshake`]: Session establishment
//! - [`session`]: Encrypted block read/write paths
//! - [`queue`]: Bounded delivery queue
//! - [`config`]: TOML configuration
//! - [`error`]: Client error types
//!
//! ## Usage
//! ```ignore
//! let conn = Arc::new(TcpFramedConnection::connect("smp.example.com", 5223, timeout).await?);
//! let deliveries = Arc::new(DeliveryQueue::new(64));
//! let client = SmpClient::connect(server, conn, &config, Arc::clone(&deliveries)).await?;
//!
//! let recipient_key = RsaKeyPair::generate()?;
//! let (rcv_id, snd_id) = client.create_queue(&recipient_key).await?;
//! client.subscribe(&recipient_key, &rcv_id).await?;
//!
//! while let Some(event) = deliveries.dequeue().await {
//!     // handle MSG / END pushes
//! }
//! ```
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               smp-client  ◄── You are here         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │     smp-core           smp-transport               │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │               smp-common                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One client = one connection; there is no reconnect policy here
//! - The delivery queue bounds how far the broker can run ahead of
//!   the application
//! - Session keys never rotate; a long-lived connection ends when a
//!   direction counter is exhausted
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod queue;
pub mod session;

// Re-export primary types
pub use client::{QueueEvent, SmpClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use queue::DeliveryQueue;
pub use session::SecureConnection;
