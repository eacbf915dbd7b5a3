// ============================================
// File: crates/smp-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Provides serialization and parsing for SMP commands and framed
//! transmissions, the ASCII wire format shipped inside encrypted
//! blocks.
//!
//! ## Main Functionality
//! - Command serialize/parse pairs for both parties
//! - Signed-transmission framing (signature, corr id, queue id, command)
//! - Broker-transmission classification (party and queue-id discipline)
//!
//! ## Wire Format
//! ```text
//! command      := TAG [' ' args]
//! key blob     := "rsa:" base64(SPKI DER)
//! body field   := decimal(len) ' ' bytes ' '        (trailing space!)
//! transmission := base64(sig) ' ' corr-id ' ' base64(queue-id)
//!                 ' ' command ' ' padding*
//! padding      := '#'                               (fill to capacity)
//! ```
//!
//! ## Parsing Strategy
//! 1. Strip trailing `#` padding
//! 2. Parse the transmission envelope (tokens may be empty)
//! 3. Dispatch the command by tag, longest declared match first
//! 4. Classify: wrong party, queue-id discipline, or well-formed
//!
//! ## ⚠️ Important Note for Next Developer
//! - A structurally undecodable block becomes the `bad_block` sentinel;
//!   an ill-formed command with a readable envelope keeps its corr id
//!   and becomes `CMD SYNTAX` so the waiting request can be failed
//! - The trailing space after a command is mandatory on the wire
//! - Message bodies are length-prefixed; they may contain spaces, `#`,
//!   or any other byte
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::SecondsFormat;

use smp_common::{CorrelationId, QueueId};

use crate::error::{CoreError, Result};
use crate::protocol::commands::{
    BrokerCommand, BrokerCommandTag, BrokerTransmission, ClientCommand, ClientCommandTag,
    ClientTransmission, CommandError, ProtocolError, QueueIdRule,
};
use crate::protocol::parser::Cursor;

// ============================================
// Constants
// ============================================

/// Prefix of public key blobs on the wire.
pub const KEY_BLOB_PREFIX: &[u8] = b"rsa:";

/// Padding byte used to fill blocks to their plaintext capacity.
pub const PAD_BYTE: u8 = b'#';

// ============================================
// Command Serialization
// ============================================

/// Serializes a client command (no trailing newline, no padding).
#[must_use]
pub fn serialize_client_command(command: &ClientCommand) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(command.tag().wire_tag());
    match command {
        ClientCommand::Create { recipient_key } => {
            out.push(b' ');
            put_key_blob(&mut out, recipient_key);
        }
        ClientCommand::Secure { sender_key } => {
            out.push(b' ');
            put_key_blob(&mut out, sender_key);
        }
        ClientCommand::Send { body } => {
            out.push(b' ');
            put_body(&mut out, body);
        }
        ClientCommand::Subscribe
        | ClientCommand::Acknowledge
        | ClientCommand::Suspend
        | ClientCommand::Delete
        | ClientCommand::Ping => {}
    }
    out
}

/// Serializes a broker command (no trailing newline, no padding).
#[must_use]
pub fn serialize_broker_command(command: &BrokerCommand) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(command.tag().wire_tag());
    match command {
        BrokerCommand::QueueIds {
            recipient_id,
            sender_id,
        } => {
            out.push(b' ');
            out.extend_from_slice(BASE64.encode(recipient_id.as_bytes()).as_bytes());
            out.push(b' ');
            out.extend_from_slice(BASE64.encode(sender_id.as_bytes()).as_bytes());
        }
        BrokerCommand::Message {
            msg_id,
            timestamp,
            body,
        } => {
            out.push(b' ');
            out.extend_from_slice(BASE64.encode(msg_id).as_bytes());
            out.push(b' ');
            out.extend_from_slice(
                timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
                    .as_bytes(),
            );
            out.push(b' ');
            put_body(&mut out, body);
        }
        BrokerCommand::Error(err) => {
            out.push(b' ');
            put_error(&mut out, err);
        }
        BrokerCommand::Unsubscribed | BrokerCommand::Ok | BrokerCommand::Pong => {}
    }
    out
}

fn put_key_blob(out: &mut Vec<u8>, key: &[u8]) {
    out.extend_from_slice(KEY_BLOB_PREFIX);
    out.extend_from_slice(BASE64.encode(key).as_bytes());
}

// Body fields carry their own trailing space so arbitrary bytes stay
// unambiguous inside the space-separated envelope.
fn put_body(out: &mut Vec<u8>, body: &[u8]) {
    out.extend_from_slice(body.len().to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(body);
    out.push(b' ');
}

fn put_error(out: &mut Vec<u8>, err: &ProtocolError) {
    match err {
        ProtocolError::Cmd(sub) => {
            out.extend_from_slice(b"CMD ");
            out.extend_from_slice(sub.wire_tag());
        }
        simple => {
            // simple_wire_tag is total for non-Cmd variants
            if let Some(tag) = simple.simple_wire_tag() {
                out.extend_from_slice(tag);
            }
        }
    }
}

// ============================================
// Command Parsing
// ============================================

/// Parses a client command at the cursor.
///
/// Consumes through the command's own tail (including the body's
/// trailing space for `SEND`); the caller checks what follows.
pub fn parse_client_command(c: &mut Cursor<'_>) -> Option<ClientCommand> {
    c.attempt(|c| {
        let tags: Vec<(ClientCommandTag, &[u8])> = ClientCommandTag::ALL
            .iter()
            .map(|t| (*t, t.wire_tag()))
            .collect();
        let tag = c.one_of(&tags)?;
        match tag {
            ClientCommandTag::Create => {
                c.space()?;
                let recipient_key = parse_key_blob(c)?;
                Some(ClientCommand::Create { recipient_key })
            }
            ClientCommandTag::Secure => {
                c.space()?;
                let sender_key = parse_key_blob(c)?;
                Some(ClientCommand::Secure { sender_key })
            }
            ClientCommandTag::Send => {
                c.space()?;
                let body = parse_body(c)?;
                Some(ClientCommand::Send { body })
            }
            ClientCommandTag::Subscribe => Some(ClientCommand::Subscribe),
            ClientCommandTag::Acknowledge => Some(ClientCommand::Acknowledge),
            ClientCommandTag::Suspend => Some(ClientCommand::Suspend),
            ClientCommandTag::Delete => Some(ClientCommand::Delete),
            ClientCommandTag::Ping => Some(ClientCommand::Ping),
        }
    })
}

/// Parses a broker command at the cursor.
pub fn parse_broker_command(c: &mut Cursor<'_>) -> Option<BrokerCommand> {
    c.attempt(|c| {
        let tags: Vec<(BrokerCommandTag, &[u8])> = BrokerCommandTag::ALL
            .iter()
            .map(|t| (*t, t.wire_tag()))
            .collect();
        let tag = c.one_of(&tags)?;
        match tag {
            BrokerCommandTag::QueueIds => {
                c.space()?;
                let recipient_id = QueueId::from(c.base64()?);
                c.space()?;
                let sender_id = QueueId::from(c.base64()?);
                Some(BrokerCommand::QueueIds {
                    recipient_id,
                    sender_id,
                })
            }
            BrokerCommandTag::Message => {
                c.space()?;
                let msg_id = c.base64()?;
                c.space()?;
                let timestamp = c.datetime()?;
                c.space()?;
                let body = parse_body(c)?;
                Some(BrokerCommand::Message {
                    msg_id,
                    timestamp,
                    body,
                })
            }
            BrokerCommandTag::Error => {
                c.space()?;
                let err = parse_error(c)?;
                Some(BrokerCommand::Error(err))
            }
            BrokerCommandTag::Unsubscribed => Some(BrokerCommand::Unsubscribed),
            BrokerCommandTag::Ok => Some(BrokerCommand::Ok),
            BrokerCommandTag::Pong => Some(BrokerCommand::Pong),
        }
    })
}

/// Parses a wire error (`BLOCK`, `AUTH`, ..., or `CMD <sub>`).
pub fn parse_error(c: &mut Cursor<'_>) -> Option<ProtocolError> {
    c.attempt(|c| {
        if c.tag(b"CMD").is_some() {
            c.space()?;
            let subs: Vec<(CommandError, &[u8])> = CommandError::ALL
                .iter()
                .map(|e| (*e, e.wire_tag()))
                .collect();
            return c.one_of(&subs).map(ProtocolError::Cmd);
        }
        let simples: Vec<(ProtocolError, &[u8])> = ProtocolError::SIMPLE
            .iter()
            .filter_map(|e| e.simple_wire_tag().map(|t| (*e, t)))
            .collect();
        c.one_of(&simples)
    })
}

fn parse_key_blob(c: &mut Cursor<'_>) -> Option<Vec<u8>> {
    c.attempt(|c| {
        c.tag(KEY_BLOB_PREFIX)?;
        c.base64()
    })
}

fn parse_body(c: &mut Cursor<'_>) -> Option<Vec<u8>> {
    c.attempt(|c| {
        let len = c.decimal()?;
        c.space()?;
        let body = c.take(len)?.to_vec();
        c.space()?;
        Some(body)
    })
}

/// Decodes a bare client command, requiring full input consumption.
///
/// # Errors
/// Returns `CoreError::Parse` if the command is ill-formed or followed
/// by trailing bytes.
pub fn decode_client_command(input: &[u8]) -> Result<ClientCommand> {
    let mut c = Cursor::new(input);
    let command = parse_client_command(&mut c).ok_or_else(|| CoreError::parse("client command"))?;
    if !c.at_end() {
        return Err(CoreError::parse("client command: trailing bytes"));
    }
    Ok(command)
}

/// Decodes a bare broker command, requiring full input consumption.
///
/// # Errors
/// Returns `CoreError::Parse` if the command is ill-formed or followed
/// by trailing bytes.
pub fn decode_broker_command(input: &[u8]) -> Result<BrokerCommand> {
    let mut c = Cursor::new(input);
    let command = parse_broker_command(&mut c).ok_or_else(|| CoreError::parse("broker command"))?;
    if !c.at_end() {
        return Err(CoreError::parse("broker command: trailing bytes"));
    }
    Ok(command)
}

// ============================================
// Transmission Framing
// ============================================

/// Builds the signed portion of a client transmission:
/// `corr-id ' ' base64(queue-id) ' ' command`.
///
/// The signature (when present) is computed over exactly these bytes.
#[must_use]
pub fn transmission_body(
    corr_id: &CorrelationId,
    queue_id: &QueueId,
    command: &ClientCommand,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(corr_id.as_bytes());
    out.push(b' ');
    out.extend_from_slice(BASE64.encode(queue_id.as_bytes()).as_bytes());
    out.push(b' ');
    out.extend_from_slice(&serialize_client_command(command));
    out
}

/// Frames a transmission for the wire:
/// `base64(signature) ' ' body ' '`.
///
/// An absent signature is an empty base64 token. The single trailing
/// space is mandatory; block padding is applied by the transport.
#[must_use]
pub fn frame_transmission(signature: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(BASE64.encode(signature).as_bytes());
    out.push(b' ');
    out.extend_from_slice(body);
    out.push(b' ');
    out
}

/// Encodes a broker transmission (empty signature token), used by
/// broker-side test fixtures.
#[must_use]
pub fn encode_broker_transmission(
    corr_id: &CorrelationId,
    queue_id: &QueueId,
    command: &BrokerCommand,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(corr_id.as_bytes());
    body.push(b' ');
    body.extend_from_slice(BASE64.encode(queue_id.as_bytes()).as_bytes());
    body.push(b' ');
    body.extend_from_slice(&serialize_broker_command(command));
    frame_transmission(&[], &body)
}

/// Strips trailing block padding.
#[must_use]
pub fn strip_padding(block: &[u8]) -> &[u8] {
    let end = block
        .iter()
        .rposition(|&b| b != PAD_BYTE)
        .map_or(0, |i| i + 1);
    &block[..end]
}

// ============================================
// Broker Transmission Parsing
// ============================================

/// Parses one decrypted block into a broker transmission.
///
/// Never fails: a structurally undecodable block yields the
/// [`BrokerTransmission::bad_block`] sentinel, and command-level
/// problems are folded into the transmission's `outcome`.
#[must_use]
pub fn parse_broker_transmission(block: &[u8]) -> BrokerTransmission {
    parse_broker_transmission_inner(strip_padding(block))
        .unwrap_or_else(BrokerTransmission::bad_block)
}

fn parse_broker_transmission_inner(content: &[u8]) -> Option<BrokerTransmission> {
    let mut c = Cursor::new(content);

    // Signature: parsed and discarded. Validation is the broker's
    // concern; an empty token is legal.
    let _signature = c.base64().unwrap_or_default();
    c.space()?;

    let corr_id = CorrelationId::from_bytes(c.word());
    c.space()?;

    let queue_id = QueueId::from(c.base64().unwrap_or_default());
    c.space()?;

    let outcome = parse_classified_command(&mut c, &queue_id);
    Some(BrokerTransmission {
        corr_id,
        queue_id,
        outcome,
    })
}

/// Parses the command position and applies party and queue-id
/// discipline.
fn parse_classified_command(
    c: &mut Cursor<'_>,
    queue_id: &QueueId,
) -> std::result::Result<BrokerCommand, ProtocolError> {
    if let Some(command) = parse_broker_command(c) {
        if !tail_is_well_formed(c) {
            return Err(ProtocolError::Cmd(CommandError::Syntax));
        }
        return match (command.tag().queue_id_rule(), queue_id.is_empty()) {
            (QueueIdRule::Required, true) => Err(ProtocolError::Cmd(CommandError::NoQueue)),
            (QueueIdRule::Forbidden, false) => {
                Err(ProtocolError::Cmd(CommandError::HasCredentials))
            }
            _ => Ok(command),
        };
    }

    if let Some(_command) = parse_client_command(c) {
        if !tail_is_well_formed(c) {
            return Err(ProtocolError::Cmd(CommandError::Syntax));
        }
        // A client-party tag from the broker is never acceptable.
        return Err(ProtocolError::Cmd(CommandError::Prohibited));
    }

    Err(ProtocolError::Cmd(CommandError::Syntax))
}

// The mandatory trailing space, then nothing (padding was stripped).
fn tail_is_well_formed(c: &mut Cursor<'_>) -> bool {
    c.space().is_some() && c.at_end()
}

/// Decodes a client transmission, used by broker-side test fixtures.
///
/// # Errors
/// Returns `CoreError::Parse` on any structural or command failure.
pub fn decode_client_transmission(block: &[u8]) -> Result<(Vec<u8>, ClientTransmission)> {
    let content = strip_padding(block);
    let mut c = Cursor::new(content);

    let signature = c.base64().unwrap_or_default();
    c.space()
        .ok_or_else(|| CoreError::parse("transmission: signature separator"))?;

    let corr_id = CorrelationId::from_bytes(c.word());
    c.space()
        .ok_or_else(|| CoreError::parse("transmission: corr-id separator"))?;

    let queue_id = QueueId::from(c.base64().unwrap_or_default());
    c.space()
        .ok_or_else(|| CoreError::parse("transmission: queue-id separator"))?;

    let command =
        parse_client_command(&mut c).ok_or_else(|| CoreError::parse("transmission: command"))?;
    if !tail_is_well_formed(&mut c) {
        return Err(CoreError::parse("transmission: trailing framing"));
    }

    Ok((
        signature,
        ClientTransmission {
            corr_id,
            queue_id,
            command,
        },
    ))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn all_client_commands() -> Vec<ClientCommand> {
        vec![
            ClientCommand::Create {
                recipient_key: b"rsa:1234".to_vec(),
            },
            ClientCommand::Subscribe,
            ClientCommand::Secure {
                sender_key: vec![0x30, 0x82, 0x01, 0x22],
            },
            ClientCommand::Acknowledge,
            ClientCommand::Suspend,
            ClientCommand::Delete,
            ClientCommand::Send {
                body: b"hello world".to_vec(),
            },
            ClientCommand::Ping,
        ]
    }

    fn all_broker_commands() -> Vec<BrokerCommand> {
        vec![
            BrokerCommand::QueueIds {
                recipient_id: QueueId::from_bytes(b"rcv-id-01"),
                sender_id: QueueId::from_bytes(b"snd-id-01"),
            },
            BrokerCommand::Message {
                msg_id: b"msg-7".to_vec(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 3).unwrap(),
                body: b"payload with spaces and # marks".to_vec(),
            },
            BrokerCommand::Unsubscribed,
            BrokerCommand::Ok,
            BrokerCommand::Error(ProtocolError::Auth),
            BrokerCommand::Error(ProtocolError::Cmd(CommandError::Syntax)),
            BrokerCommand::Pong,
        ]
    }

    #[test]
    fn test_client_command_roundtrip() {
        for original in all_client_commands() {
            let encoded = serialize_client_command(&original);
            let decoded = decode_client_command(&encoded).unwrap();
            assert_eq!(original, decoded, "wire form: {:?}", encoded);
        }
    }

    #[test]
    fn test_broker_command_roundtrip() {
        for original in all_broker_commands() {
            let encoded = serialize_broker_command(&original);
            let decoded = decode_broker_command(&encoded).unwrap();
            assert_eq!(original, decoded, "wire form: {:?}", encoded);
        }
    }

    #[test]
    fn test_send_wire_form() {
        let cmd = ClientCommand::Send {
            body: b"hello".to_vec(),
        };
        assert_eq!(serialize_client_command(&cmd), b"SEND 5 hello ");
    }

    #[test]
    fn test_key_blob_wire_form() {
        let cmd = ClientCommand::Create {
            recipient_key: b"abcd".to_vec(),
        };
        assert_eq!(serialize_client_command(&cmd), b"NEW rsa:YWJjZA==");
    }

    #[test]
    fn test_error_wire_forms() {
        let encoded = serialize_broker_command(&BrokerCommand::Error(ProtocolError::Cmd(
            CommandError::NoQueue,
        )));
        assert_eq!(encoded, b"ERR CMD NO_QUEUE");

        let encoded = serialize_broker_command(&BrokerCommand::Error(ProtocolError::NoMessage));
        assert_eq!(encoded, b"ERR NO_MSG");
    }

    #[test]
    fn test_empty_command_rejects_trailing_bytes() {
        assert!(decode_broker_command(b"OK").is_ok());
        assert!(decode_broker_command(b"OKx").is_err());
        assert!(decode_client_command(b"PINGING").is_err());
    }

    #[test]
    fn test_send_body_with_spaces() {
        let cmd = ClientCommand::Send {
            body: b"a b  c".to_vec(),
        };
        let encoded = serialize_client_command(&cmd);
        assert_eq!(decode_client_command(&encoded).unwrap(), cmd);
    }

    #[test]
    fn test_send_length_mismatch_fails() {
        assert!(decode_client_command(b"SEND 10 short ").is_err());
    }

    #[test]
    fn test_message_timestamp_roundtrip() {
        let ts = Utc.timestamp_millis_opt(1_715_934_003_250).unwrap();
        let cmd = BrokerCommand::Message {
            msg_id: b"id".to_vec(),
            timestamp: ts,
            body: b"x".to_vec(),
        };
        let decoded = decode_broker_command(&serialize_broker_command(&cmd)).unwrap();
        assert_eq!(decoded, cmd);
    }

    // ----------------------------------------
    // Transmission framing
    // ----------------------------------------

    fn framed_broker(corr: &str, queue: &[u8], cmd: &BrokerCommand) -> Vec<u8> {
        encode_broker_transmission(
            &CorrelationId::from_bytes(corr.as_bytes()),
            &QueueId::from_bytes(queue),
            cmd,
        )
    }

    #[test]
    fn test_broker_transmission_roundtrip() {
        let block = framed_broker("7", b"queue-1", &BrokerCommand::Ok);
        let parsed = parse_broker_transmission(&block);

        assert_eq!(parsed.corr_id.as_bytes(), b"7");
        assert_eq!(parsed.queue_id.as_bytes(), b"queue-1");
        assert_eq!(parsed.outcome, Ok(BrokerCommand::Ok));
    }

    #[test]
    fn test_broker_transmission_with_padding() {
        let mut block = framed_broker("3", b"q", &BrokerCommand::Pong);
        // PONG must not carry a queue id
        let mut clean = framed_broker("3", b"", &BrokerCommand::Pong);
        block.resize(block.len() + 64, PAD_BYTE);
        clean.resize(clean.len() + 64, PAD_BYTE);

        let parsed = parse_broker_transmission(&clean);
        assert_eq!(parsed.outcome, Ok(BrokerCommand::Pong));

        let parsed = parse_broker_transmission(&block);
        assert_eq!(
            parsed.outcome,
            Err(ProtocolError::Cmd(CommandError::HasCredentials))
        );
    }

    #[test]
    fn test_queue_id_discipline() {
        // OK without a queue id
        let parsed = parse_broker_transmission(&framed_broker("1", b"", &BrokerCommand::Ok));
        assert_eq!(parsed.outcome, Err(ProtocolError::Cmd(CommandError::NoQueue)));

        // IDS with a queue id
        let ids = BrokerCommand::QueueIds {
            recipient_id: QueueId::from_bytes(b"r"),
            sender_id: QueueId::from_bytes(b"s"),
        };
        let parsed = parse_broker_transmission(&framed_broker("2", b"q", &ids));
        assert_eq!(
            parsed.outcome,
            Err(ProtocolError::Cmd(CommandError::HasCredentials))
        );

        // ERR is accepted with or without one
        let err_cmd = BrokerCommand::Error(ProtocolError::Auth);
        for queue in [&b""[..], &b"q"[..]] {
            let parsed = parse_broker_transmission(&framed_broker("3", queue, &err_cmd));
            assert_eq!(parsed.outcome, Ok(err_cmd.clone()));
        }
    }

    #[test]
    fn test_client_tag_from_broker_is_prohibited() {
        let mut body = Vec::new();
        body.extend_from_slice(b"9 ");
        body.extend_from_slice(BASE64.encode(b"q").as_bytes());
        body.extend_from_slice(b" SUB");
        let block = frame_transmission(&[], &body);

        let parsed = parse_broker_transmission(&block);
        assert_eq!(parsed.corr_id.as_bytes(), b"9");
        assert_eq!(
            parsed.outcome,
            Err(ProtocolError::Cmd(CommandError::Prohibited))
        );
    }

    #[test]
    fn test_unparseable_command_keeps_corr_id() {
        let block = frame_transmission(&[], b"5 YQ== WHAT");
        let parsed = parse_broker_transmission(&block);
        assert_eq!(parsed.corr_id.as_bytes(), b"5");
        assert_eq!(parsed.outcome, Err(ProtocolError::Cmd(CommandError::Syntax)));
    }

    #[test]
    fn test_garbage_block_is_bad_block() {
        let parsed = parse_broker_transmission(b"no-spaces-at-all");
        assert!(parsed.is_bad_block());

        let parsed = parse_broker_transmission(&[PAD_BYTE; 32]);
        assert!(parsed.is_bad_block());
    }

    #[test]
    fn test_missing_trailing_space_is_syntax() {
        let mut body = Vec::new();
        body.extend_from_slice(b"4 ");
        body.extend_from_slice(BASE64.encode(b"q").as_bytes());
        body.extend_from_slice(b" OK");
        // frame without the mandatory trailing space
        let mut block = Vec::new();
        block.extend_from_slice(BASE64.encode(b"").as_bytes());
        block.push(b' ');
        block.extend_from_slice(&body);

        let parsed = parse_broker_transmission(&block);
        assert_eq!(parsed.outcome, Err(ProtocolError::Cmd(CommandError::Syntax)));
    }

    #[test]
    fn test_empty_signature_token_accepted() {
        // Leading space means an empty signature token
        let mut block = Vec::new();
        block.push(b' ');
        block.extend_from_slice(b"1 ");
        block.extend_from_slice(BASE64.encode(b"q").as_bytes());
        block.extend_from_slice(b" OK ");

        let parsed = parse_broker_transmission(&block);
        assert_eq!(parsed.outcome, Ok(BrokerCommand::Ok));
    }

    #[test]
    fn test_client_transmission_roundtrip() {
        let corr = CorrelationId::from_counter(12);
        let queue = QueueId::from_bytes(b"snd-id");
        let cmd = ClientCommand::Send {
            body: b"hi there".to_vec(),
        };

        let body = transmission_body(&corr, &queue, &cmd);
        let block = frame_transmission(b"fake-signature", &body);

        let (signature, parsed) = decode_client_transmission(&block).unwrap();
        assert_eq!(signature, b"fake-signature");
        assert_eq!(parsed.corr_id, corr);
        assert_eq!(parsed.queue_id, queue);
        assert_eq!(parsed.command, cmd);
    }

    #[test]
    fn test_client_transmission_empty_queue_and_signature() {
        let corr = CorrelationId::from_counter(0);
        let queue = QueueId::empty();
        let cmd = ClientCommand::Create {
            recipient_key: b"key-bytes".to_vec(),
        };

        let body = transmission_body(&corr, &queue, &cmd);
        let block = frame_transmission(&[], &body);

        let (signature, parsed) = decode_client_transmission(&block).unwrap();
        assert!(signature.is_empty());
        assert!(parsed.queue_id.is_empty());
        assert_eq!(parsed.command, cmd);
    }
}
