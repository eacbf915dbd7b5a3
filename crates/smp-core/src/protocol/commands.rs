// ============================================
// File: crates/smp-core/src/protocol/commands.rs
// ============================================
//! # Protocol Command Definitions
//!
//! ## Creation Reason
//! Defines the structure of all commands exchanged between SMP clients
//! and brokers, split by the party allowed to issue them.
//!
//! ## Main Functionality
//! - `Party`: Who may issue a command (recipient, sender, broker)
//! - `ClientCommand`: Commands sent by queue recipients and senders
//! - `BrokerCommand`: Commands and responses sent by the broker
//! - `ProtocolError` / `CommandError`: Errors carried on the wire
//! - `ClientTransmission` / `BrokerTransmission`: Framed units
//!
//! ## Command Tags
//! | Party | Tags |
//! |-----------|-------------------------------|
//! | Recipient | NEW SUB KEY ACK OFF DEL |
//! | Sender | SEND PING |
//! | Broker | IDS MSG END OK ERR PONG |
//!
//! ## ⚠️ Important Note for Next Developer
//! - The party split is load-bearing: a broker tag on the client side
//!   (or vice versa) is a PROHIBITED error, not a parse failure
//! - Tag byte strings are part of the wire format - never rename them
//! - Add new tags at the end of the dispatch tables
//!
//! ## Last Modified
//! v0.1.0 - Initial command definitions

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use smp_common::{CorrelationId, QueueId};

// ============================================
// Party
// ============================================

/// The protocol party a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    /// The queue recipient (owner).
    Recipient,
    /// A queue sender.
    Sender,
    /// The broker (server).
    Broker,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipient => write!(f, "recipient"),
            Self::Sender => write!(f, "sender"),
            Self::Broker => write!(f, "broker"),
        }
    }
}

// ============================================
// Command Tags
// ============================================

/// Tag of a client-issued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCommandTag {
    /// `NEW` - create a queue.
    Create,
    /// `SUB` - subscribe to a queue.
    Subscribe,
    /// `KEY` - authorize a sender key.
    Secure,
    /// `ACK` - acknowledge a delivered message.
    Acknowledge,
    /// `OFF` - suspend a queue.
    Suspend,
    /// `DEL` - delete a queue.
    Delete,
    /// `SEND` - send a message.
    Send,
    /// `PING` - keep-alive probe.
    Ping,
}

impl ClientCommandTag {
    /// All client tags in wire dispatch order.
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Subscribe,
        Self::Secure,
        Self::Acknowledge,
        Self::Suspend,
        Self::Delete,
        Self::Send,
        Self::Ping,
    ];

    /// Returns the wire bytes of this tag.
    #[must_use]
    pub const fn wire_tag(&self) -> &'static [u8] {
        match self {
            Self::Create => b"NEW",
            Self::Subscribe => b"SUB",
            Self::Secure => b"KEY",
            Self::Acknowledge => b"ACK",
            Self::Suspend => b"OFF",
            Self::Delete => b"DEL",
            Self::Send => b"SEND",
            Self::Ping => b"PING",
        }
    }

    /// Returns the party allowed to issue this command.
    #[must_use]
    pub const fn party(&self) -> Party {
        match self {
            Self::Send | Self::Ping => Party::Sender,
            _ => Party::Recipient,
        }
    }
}

/// Tag of a broker-issued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerCommandTag {
    /// `IDS` - queue ids in reply to `NEW`.
    QueueIds,
    /// `MSG` - message delivery.
    Message,
    /// `END` - subscription ended.
    Unsubscribed,
    /// `OK` - success response.
    Ok,
    /// `ERR` - error response.
    Error,
    /// `PONG` - reply to `PING`.
    Pong,
}

/// Queue-id discipline of a broker tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueIdRule {
    /// The transmission must carry a queue id.
    Required,
    /// The transmission must not carry a queue id.
    Forbidden,
    /// Accepted either way.
    Any,
}

impl BrokerCommandTag {
    /// All broker tags in wire dispatch order.
    pub const ALL: [Self; 6] = [
        Self::QueueIds,
        Self::Message,
        Self::Unsubscribed,
        Self::Ok,
        Self::Error,
        Self::Pong,
    ];

    /// Returns the wire bytes of this tag.
    #[must_use]
    pub const fn wire_tag(&self) -> &'static [u8] {
        match self {
            Self::QueueIds => b"IDS",
            Self::Message => b"MSG",
            Self::Unsubscribed => b"END",
            Self::Ok => b"OK",
            Self::Error => b"ERR",
            Self::Pong => b"PONG",
        }
    }

    /// Returns the queue-id discipline for this tag.
    ///
    /// Replies to queue-less commands (`IDS`, `PONG`) must not name a
    /// queue; deliveries and per-queue acknowledgements must. `ERR` is
    /// accepted regardless.
    #[must_use]
    pub const fn queue_id_rule(&self) -> QueueIdRule {
        match self {
            Self::Message | Self::Unsubscribed | Self::Ok => QueueIdRule::Required,
            Self::QueueIds | Self::Pong => QueueIdRule::Forbidden,
            Self::Error => QueueIdRule::Any,
        }
    }
}

// ============================================
// Wire Errors
// ============================================

/// Errors carried on the wire inside `ERR` responses, and synthesized
/// locally for malformed or ill-disciplined transmissions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Malformed or undecryptable block.
    #[error("BLOCK")]
    Block,
    /// Signature or credential check failed on the broker.
    #[error("AUTH")]
    Auth,
    /// No message available.
    #[error("NO_MSG")]
    NoMessage,
    /// Broker-internal failure.
    #[error("INTERNAL")]
    Internal,
    /// Command-level error.
    #[error("CMD {0}")]
    Cmd(CommandError),
}

/// Command-level error causes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Command not allowed for the issuing party.
    #[error("PROHIBITED")]
    Prohibited,
    /// Supplied key has an unacceptable size.
    #[error("KEY_SIZE")]
    KeySize,
    /// Command could not be parsed.
    #[error("SYNTAX")]
    Syntax,
    /// Credentials required but missing.
    #[error("NO_AUTH")]
    NoCredentials,
    /// Credentials supplied where none are allowed.
    #[error("HAS_AUTH")]
    HasCredentials,
    /// Queue id required but missing.
    #[error("NO_QUEUE")]
    NoQueue,
}

impl ProtocolError {
    /// Simple (non-`CMD`) errors in wire dispatch order.
    pub const SIMPLE: [Self; 4] = [Self::Block, Self::Auth, Self::NoMessage, Self::Internal];

    /// Returns the wire bytes of a simple error; `None` for `Cmd`.
    #[must_use]
    pub const fn simple_wire_tag(&self) -> Option<&'static [u8]> {
        match self {
            Self::Block => Some(b"BLOCK"),
            Self::Auth => Some(b"AUTH"),
            Self::NoMessage => Some(b"NO_MSG"),
            Self::Internal => Some(b"INTERNAL"),
            Self::Cmd(_) => None,
        }
    }
}

impl CommandError {
    /// All command errors in wire dispatch order.
    pub const ALL: [Self; 6] = [
        Self::Prohibited,
        Self::KeySize,
        Self::Syntax,
        Self::NoCredentials,
        Self::HasCredentials,
        Self::NoQueue,
    ];

    /// Returns the wire bytes of this error.
    #[must_use]
    pub const fn wire_tag(&self) -> &'static [u8] {
        match self {
            Self::Prohibited => b"PROHIBITED",
            Self::KeySize => b"KEY_SIZE",
            Self::Syntax => b"SYNTAX",
            Self::NoCredentials => b"NO_AUTH",
            Self::HasCredentials => b"HAS_AUTH",
            Self::NoQueue => b"NO_QUEUE",
        }
    }
}

// ============================================
// ClientCommand
// ============================================

/// A command issued by a queue recipient or sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Create a queue; carries the recipient's verification public key
    /// (SPKI DER bytes).
    Create {
        /// Recipient verification key.
        recipient_key: Vec<u8>,
    },
    /// Subscribe to message delivery on a queue.
    Subscribe,
    /// Authorize a sender by its verification public key.
    Secure {
        /// Sender verification key.
        sender_key: Vec<u8>,
    },
    /// Acknowledge the last delivered message.
    Acknowledge,
    /// Suspend the queue for senders.
    Suspend,
    /// Delete the queue.
    Delete,
    /// Send a message body to a queue.
    Send {
        /// Raw message body.
        body: Vec<u8>,
    },
    /// Keep-alive probe.
    Ping,
}

impl ClientCommand {
    /// Returns this command's tag.
    #[must_use]
    pub const fn tag(&self) -> ClientCommandTag {
        match self {
            Self::Create { .. } => ClientCommandTag::Create,
            Self::Subscribe => ClientCommandTag::Subscribe,
            Self::Secure { .. } => ClientCommandTag::Secure,
            Self::Acknowledge => ClientCommandTag::Acknowledge,
            Self::Suspend => ClientCommandTag::Suspend,
            Self::Delete => ClientCommandTag::Delete,
            Self::Send { .. } => ClientCommandTag::Send,
            Self::Ping => ClientCommandTag::Ping,
        }
    }

    /// Returns the party allowed to issue this command.
    #[must_use]
    pub const fn party(&self) -> Party {
        self.tag().party()
    }
}

// ============================================
// BrokerCommand
// ============================================

/// A command or response issued by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCommand {
    /// Reply to `NEW`: the freshly created queue's id pair.
    QueueIds {
        /// Recipient-facing queue id.
        recipient_id: QueueId,
        /// Sender-facing queue id.
        sender_id: QueueId,
    },
    /// A delivered message.
    Message {
        /// Broker-assigned message id.
        msg_id: Vec<u8>,
        /// Broker receive timestamp.
        timestamp: DateTime<Utc>,
        /// Raw message body.
        body: Vec<u8>,
    },
    /// The queue subscription ended (another client subscribed).
    Unsubscribed,
    /// Success response.
    Ok,
    /// Error response.
    Error(ProtocolError),
    /// Reply to `PING`.
    Pong,
}

impl BrokerCommand {
    /// Returns this command's tag.
    #[must_use]
    pub const fn tag(&self) -> BrokerCommandTag {
        match self {
            Self::QueueIds { .. } => BrokerCommandTag::QueueIds,
            Self::Message { .. } => BrokerCommandTag::Message,
            Self::Unsubscribed => BrokerCommandTag::Unsubscribed,
            Self::Ok => BrokerCommandTag::Ok,
            Self::Error(_) => BrokerCommandTag::Error,
            Self::Pong => BrokerCommandTag::Pong,
        }
    }
}

// ============================================
// Transmissions
// ============================================

/// An outbound framed unit: correlation id, queue id, and command.
///
/// The signature travels beside this structure (it covers the encoded
/// form, so it cannot live inside it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTransmission {
    /// Correlation token echoed by the broker.
    pub corr_id: CorrelationId,
    /// Target queue id (may be empty).
    pub queue_id: QueueId,
    /// The command itself.
    pub command: ClientCommand,
}

/// An inbound framed unit from the broker.
///
/// `outcome` is `Ok` for a well-formed broker command and `Err` for a
/// transmission-level problem synthesized by the parser (bad party,
/// queue-id discipline, unparseable block).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerTransmission {
    /// Correlation token (empty for undecodable blocks).
    pub corr_id: CorrelationId,
    /// Queue id named by the transmission (may be empty).
    pub queue_id: QueueId,
    /// Parsed command or the synthesized error.
    pub outcome: Result<BrokerCommand, ProtocolError>,
}

impl BrokerTransmission {
    /// The sentinel produced when a block cannot be decoded at all.
    #[must_use]
    pub fn bad_block() -> Self {
        Self {
            corr_id: CorrelationId::default(),
            queue_id: QueueId::empty(),
            outcome: Err(ProtocolError::Block),
        }
    }

    /// Returns `true` if this is the undecodable-block sentinel.
    #[must_use]
    pub fn is_bad_block(&self) -> bool {
        self.corr_id.is_empty()
            && self.queue_id.is_empty()
            && self.outcome == Err(ProtocolError::Block)
    }
}

// ============================================
// Tests
// ============================================
