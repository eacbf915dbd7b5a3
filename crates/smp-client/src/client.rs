// ============================================
// File: crates/smp-client/src/client.rs
// ============================================
//! # Multiplexed SMP Client
//!
//! ## Creation Reason
//! Implements the request/response client over an established secure
//! session: correlation-id multiplexing, transmission signing, and
//! fan-out of unsolicited broker pushes.
//!
//! ## Main Functionality
//! - `SmpClient`: connection handle with typed queue operations
//! - `QueueEvent`: unsolicited push delivered to the application
//! - Inbound loop: routes responses to waiters, pushes to the queue
//!
//! ## Client Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SmpClient                            │
//! │                                                             │
//! │  caller ──► send_command ──► sign ──► write_block ────────► │
//! │                │                                            │
//! │                └─► pending[corr_id] = waiter                │
//! │                                                             │
//! │  ┌───────────────── inbound loop ──────────────────────┐   │
//! │  │ read_block ─► parse ─► corr_id hit? ─► resolve      │   │
//! │  │                        miss + MSG/END ─► deliveries │   │
//! │  │                        miss + other ─► drop         │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                                                             │
//! │  loop exit ─► close deliveries ─► reject all pending        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Register the waiter BEFORE writing the block; the response can
//!   arrive before the writer resumes
//! - An undecryptable block is logged and skipped (the broker sees no
//!   response); only transport-level faults end the loop
//! - Inbound signatures are parsed but never verified here; that is
//!   the broker's job
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use smp_common::{CorrelationId, QueueId, SmpServer};
use smp_core::crypto::rsa::sign_pss;
use smp_core::crypto::{RsaKeyPair, SpkiPublicKey};
use smp_core::protocol::codec::{frame_transmission, parse_broker_transmission, transmission_body};
use smp_core::protocol::{BrokerCommand, BrokerTransmission, ClientCommand};
use smp_core::CoreError;
use smp_transport::FramedConnection;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::handshake::handshake;
use crate::queue::DeliveryQueue;
use crate::session::SecureConnection;

// ============================================
// QueueEvent
// ============================================

/// An unsolicited broker push (`MSG` or `END`) delivered to the
/// application's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEvent {
    /// The broker this event came from.
    pub server: SmpServer,
    /// The queue the event concerns (recipient-facing id).
    pub queue_id: QueueId,
    /// The pushed command (`Message` or `Unsubscribed`).
    pub command: BrokerCommand,
}

// ============================================
// SmpClient
// ============================================

type PendingWaiter = oneshot::Sender<Result<BrokerCommand>>;

/// A connected SMP client.
///
/// One `SmpClient` owns one encrypted connection. Requests from any
/// number of tasks are multiplexed over it by correlation id;
/// unsolicited message deliveries surface on the queue supplied at
/// connect time.
pub struct SmpClient {
    server: SmpServer,
    session: Arc<SecureConnection>,
    pending: Arc<DashMap<CorrelationId, PendingWaiter>>,
    next_corr_id: AtomicU64,
    connected: Arc<AtomicBool>,
    deliveries: Arc<DeliveryQueue<QueueEvent>>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SmpClient {
    /// Performs the handshake over `conn` and starts the inbound loop.
    ///
    /// # Arguments
    /// * `server` - Broker address (its pinned key hash, if any, is
    ///   enforced during the handshake)
    /// * `conn` - Freshly opened framed channel to that broker
    /// * `config` - Timeouts and queue sizing
    /// * `deliveries` - Queue receiving unsolicited `MSG`/`END` pushes
    ///
    /// # Errors
    /// Returns any handshake failure; the connection is unusable then.
    pub async fn connect(
        server: SmpServer,
        conn: Arc<dyn FramedConnection>,
        config: &ClientConfig,
        deliveries: Arc<DeliveryQueue<QueueEvent>>,
    ) -> Result<Self> {
        config.validate()?;

        let session = Arc::new(
            handshake(conn, server.key_hash.as_ref(), config.write_timeout()).await?,
        );

        let client = Self {
            server: server.clone(),
            session: Arc::clone(&session),
            pending: Arc::new(DashMap::new()),
            next_corr_id: AtomicU64::new(0),
            connected: Arc::new(AtomicBool::new(true)),
            deliveries: Arc::clone(&deliveries),
            reader: parking_lot::Mutex::new(None),
        };

        let handle = tokio::spawn(inbound_loop(
            server,
            session,
            Arc::clone(&client.pending),
            Arc::clone(&client.connected),
            deliveries,
        ));
        *client.reader.lock() = Some(handle);

        Ok(client)
    }

    /// Returns the broker address this client is connected to.
    #[must_use]
    pub const fn server(&self) -> &SmpServer {
        &self.server
    }

    /// Returns the negotiated block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.session.block_size()
    }

    /// Returns `true` while the inbound loop is alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    // ========================================
    // Core request path
    // ========================================

    /// Sends one command and awaits the broker's response.
    ///
    /// Allocates a correlation id, signs the transmission when a key
    /// is supplied, registers the waiter, and writes the block. The
    /// returned future resolves when the matching response arrives.
    ///
    /// # Errors
    /// - `Protocol` when the broker answers `ERR` (or the response is
    ///   locally classified as an error)
    /// - `Disconnected` when the connection dies before the response
    /// - transport/crypto errors from the write path
    pub async fn send_command(
        &self,
        sign_key: Option<&RsaKeyPair>,
        queue_id: &QueueId,
        command: ClientCommand,
    ) -> Result<BrokerCommand> {
        if !self.is_connected() {
            return Err(ClientError::Disconnected);
        }

        let corr_id =
            CorrelationId::from_counter(self.next_corr_id.fetch_add(1, Ordering::SeqCst));
        let body = transmission_body(&corr_id, queue_id, &command);

        let signature = match sign_key {
            Some(key) => sign_pss(key, &body)?,
            None => Vec::new(),
        };
        let framed = frame_transmission(&signature, &body);

        // Register before writing: the response may arrive before this
        // task resumes.
        let (tx, rx) = oneshot::channel();
        self.pending.insert(corr_id.clone(), tx);

        if let Err(e) = self.session.write_block(&framed).await {
            self.pending.remove(&corr_id);
            return Err(e);
        }
        debug!(corr_id = %corr_id, command = ?command.tag(), "command sent");

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Disconnected),
        }
    }

    // ========================================
    // Typed queue operations
    // ========================================

    /// Creates a queue owned by `recipient_key`.
    ///
    /// Returns the broker-assigned (recipient id, sender id) pair.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `IDS`.
    pub async fn create_queue(&self, recipient_key: &RsaKeyPair) -> Result<(QueueId, QueueId)> {
        let command = ClientCommand::Create {
            recipient_key: recipient_key.public_key().spki_der().to_vec(),
        };
        let response = self
            .send_command(Some(recipient_key), &QueueId::empty(), command)
            .await?;
        match response {
            BrokerCommand::QueueIds {
                recipient_id,
                sender_id,
            } => {
                info!(queue = %recipient_id, "queue created");
                Ok((recipient_id, sender_id))
            }
            other => Err(unexpected("IDS", &other)),
        }
    }

    /// Subscribes to message delivery on a queue.
    ///
    /// A `MSG` response means a message was already waiting; it is
    /// forwarded to the delivery queue.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK` or `MSG`.
    pub async fn subscribe(&self, recipient_key: &RsaKeyPair, queue_id: &QueueId) -> Result<()> {
        let response = self
            .send_command(Some(recipient_key), queue_id, ClientCommand::Subscribe)
            .await?;
        self.accept_ok_or_message(queue_id, response, "OK or MSG")
            .await
    }

    /// Authorizes `sender_key` to send on a queue.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK`.
    pub async fn secure_queue(
        &self,
        recipient_key: &RsaKeyPair,
        queue_id: &QueueId,
        sender_key: &SpkiPublicKey,
    ) -> Result<()> {
        let command = ClientCommand::Secure {
            sender_key: sender_key.spki_der().to_vec(),
        };
        let response = self
            .send_command(Some(recipient_key), queue_id, command)
            .await?;
        require_ok(response)
    }

    /// Sends a message to a queue (sender side).
    ///
    /// Unsecured queues accept unsigned sends, so the key is optional.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK`.
    pub async fn send_message(
        &self,
        sign_key: Option<&RsaKeyPair>,
        queue_id: &QueueId,
        body: Vec<u8>,
    ) -> Result<()> {
        let response = self
            .send_command(sign_key, queue_id, ClientCommand::Send { body })
            .await?;
        require_ok(response)
    }

    /// Acknowledges the last delivered message.
    ///
    /// A `MSG` response carries the next message; it is forwarded to
    /// the delivery queue.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK` or `MSG`.
    pub async fn acknowledge(&self, recipient_key: &RsaKeyPair, queue_id: &QueueId) -> Result<()> {
        let response = self
            .send_command(Some(recipient_key), queue_id, ClientCommand::Acknowledge)
            .await?;
        self.accept_ok_or_message(queue_id, response, "OK or MSG")
            .await
    }

    /// Suspends a queue for senders.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK`.
    pub async fn suspend_queue(
        &self,
        recipient_key: &RsaKeyPair,
        queue_id: &QueueId,
    ) -> Result<()> {
        let response = self
            .send_command(Some(recipient_key), queue_id, ClientCommand::Suspend)
            .await?;
        require_ok(response)
    }

    /// Deletes a queue and everything in it.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `OK`.
    pub async fn delete_queue(&self, recipient_key: &RsaKeyPair, queue_id: &QueueId) -> Result<()> {
        let response = self
            .send_command(Some(recipient_key), queue_id, ClientCommand::Delete)
            .await?;
        require_ok(response)
    }

    /// Probes the broker.
    ///
    /// # Errors
    /// `UnexpectedResponse` unless the broker answers `PONG`.
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .send_command(None, &QueueId::empty(), ClientCommand::Ping)
            .await?;
        match response {
            BrokerCommand::Pong => Ok(()),
            other => Err(unexpected("PONG", &other)),
        }
    }

    /// Closes the connection and waits for the inbound loop to finish.
    ///
    /// All pending requests resolve to `Disconnected` and the delivery
    /// queue is closed.
    ///
    /// # Errors
    /// Returns an error if the channel shutdown fails; the loop is
    /// still awaited.
    pub async fn disconnect(&self) -> Result<()> {
        let close_result = self.session.close().await;
        let handle = self.reader.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        close_result
    }

    async fn accept_ok_or_message(
        &self,
        queue_id: &QueueId,
        response: BrokerCommand,
        expected: &'static str,
    ) -> Result<()> {
        match response {
            BrokerCommand::Ok => Ok(()),
            message @ BrokerCommand::Message { .. } => {
                let event = QueueEvent {
                    server: self.server.clone(),
                    queue_id: queue_id.clone(),
                    command: message,
                };
                if self.deliveries.enqueue(event).await.is_err() {
                    debug!("delivery queue closed; response message dropped");
                }
                Ok(())
            }
            other => Err(unexpected(expected, &other)),
        }
    }
}

impl std::fmt::Debug for SmpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmpClient")
            .field("server", &self.server)
            .field("connected", &self.is_connected())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

fn require_ok(response: BrokerCommand) -> Result<()> {
    match response {
        BrokerCommand::Ok => Ok(()),
        other => Err(unexpected("OK", &other)),
    }
}

fn unexpected(expected: &'static str, received: &BrokerCommand) -> ClientError {
    ClientError::unexpected_response(expected, format!("{:?}", received.tag()))
}

// ============================================
// Inbound Loop
// ============================================

/// Reads blocks until the transport dies, routing each one.
async fn inbound_loop(
    server: SmpServer,
    session: Arc<SecureConnection>,
    pending: Arc<DashMap<CorrelationId, PendingWaiter>>,
    connected: Arc<AtomicBool>,
    deliveries: Arc<DeliveryQueue<QueueEvent>>,
) {
    loop {
        match session.read_block().await {
            Ok(plaintext) => {
                let transmission = parse_broker_transmission(&plaintext);
                route(&server, &pending, &deliveries, transmission).await;
            }
            // An unauthenticated block is data-level noise: record the
            // fact and keep the connection.
            Err(ClientError::Core(CoreError::Decryption)) => {
                warn!("dropping undecryptable block");
            }
            Err(e) => {
                if e.is_clean_close() {
                    info!("connection closed");
                } else {
                    error!(error = %e, "inbound loop terminated");
                }
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    deliveries.close();

    // Reject every request still in flight
    let waiting: Vec<CorrelationId> = pending.iter().map(|e| e.key().clone()).collect();
    for corr_id in waiting {
        if let Some((_, tx)) = pending.remove(&corr_id) {
            let _ = tx.send(Err(ClientError::Disconnected));
        }
    }
}

/// Routes one parsed transmission.
async fn route(
    server: &SmpServer,
    pending: &DashMap<CorrelationId, PendingWaiter>,
    deliveries: &DeliveryQueue<QueueEvent>,
    transmission: BrokerTransmission,
) {
    let BrokerTransmission {
        corr_id,
        queue_id,
        outcome,
    } = transmission;

    if let Some((_, waiter)) = pending.remove(&corr_id) {
        let result = match outcome {
            Err(e) => Err(ClientError::Protocol(e)),
            Ok(BrokerCommand::Error(e)) => Err(ClientError::Protocol(e)),
            Ok(command) => Ok(command),
        };
        if waiter.send(result).is_err() {
            debug!(corr_id = %corr_id, "waiter dropped before response");
        }
        return;
    }

    match outcome {
        Ok(
            command @ (BrokerCommand::Message { .. } | BrokerCommand::Unsubscribed),
        ) => {
            let event = QueueEvent {
                server: server.clone(),
                queue_id,
                command,
            };
            // Suspends when the application falls behind; that
            // backpressure is intentional.
            if deliveries.enqueue(event).await.is_err() {
                debug!("delivery queue closed; push dropped");
            }
        }
        Ok(command) => {
            debug!(corr_id = %corr_id, tag = ?command.tag(), "unsolicited response dropped");
        }
        Err(e) => {
            debug!(corr_id = %corr_id, error = %e, "unmatched parse error dropped");
        }
    }
}
