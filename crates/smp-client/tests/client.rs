// ============================================
// File: crates/smp-client/tests/client.rs
// ============================================
//! End-to-end client scenarios against a scripted in-memory broker.
//!
//! The broker side is driven directly from each test: it serves the
//! handshake with real RSA/AES material, decodes the client's signed
//! transmissions, and answers (or misbehaves) per script.

use std::sync::Arc;
use std::sync::OnceLock;

use chrono::{TimeZone, Utc};

use smp_client::client::{QueueEvent, SmpClient};
use smp_client::error::ClientError;
use smp_client::handshake::{ClientHello, ServerHeader, RSA_TRANSPORT_MODE};
use smp_client::queue::DeliveryQueue;
use smp_client::ClientConfig;
use smp_common::{CorrelationId, QueueId, SmpServer};
use smp_core::crypto::aead::{open_block, seal_block};
use smp_core::crypto::rsa::{decrypt_oaep, verify_pss};
use smp_core::crypto::{RsaKeyPair, SessionKey, SpkiPublicKey, GCM_TAG_SIZE};
use smp_core::protocol::codec::{
    decode_client_transmission, encode_broker_transmission, transmission_body,
};
use smp_core::protocol::{
    BrokerCommand, ClientCommand, ClientTransmission, CommandError, ProtocolError,
};
use smp_transport::{FramedConnection, MockConnection};

const BLOCK_SIZE: usize = 4096;

// RSA key generation dominates test time; share long-lived pairs.
fn broker_pair() -> &'static RsaKeyPair {
    static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| RsaKeyPair::generate().expect("broker key"))
}

fn alice_pair() -> &'static RsaKeyPair {
    static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| RsaKeyPair::generate().expect("alice key"))
}

fn bob_pair() -> &'static RsaKeyPair {
    static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| RsaKeyPair::generate().expect("bob key"))
}

fn test_server() -> SmpServer {
    SmpServer::new("test.broker", Some(5223))
}

// ============================================
// Scripted broker
// ============================================

/// The broker's half of one connection, driven step by step.
struct ScriptedBroker {
    conn: MockConnection,
    /// Broker-to-client direction (the client's receive key).
    send_key: SessionKey,
    /// Client-to-broker direction (the client's send key).
    recv_key: SessionKey,
}

impl ScriptedBroker {
    /// Serves the handshake: header, key, hello decode, welcome block.
    async fn accept(conn: MockConnection, welcome: &str) -> Self {
        let pair = broker_pair();
        let spki = pair.public_key().spki_der().to_vec();

        let header = ServerHeader {
            block_size: BLOCK_SIZE,
            transport_mode: RSA_TRANSPORT_MODE,
            key_size: spki.len(),
        };
        conn.send_frame(&header.encode()).await.unwrap();
        conn.send_frame(&spki).await.unwrap();

        let wrapped = conn.recv_frame().await.unwrap();
        let hello = ClientHello::decode(&decrypt_oaep(pair, &wrapped).unwrap()).unwrap();
        assert_eq!(hello.block_size, BLOCK_SIZE);

        let mut broker = Self {
            conn,
            send_key: hello.recv_key,
            recv_key: hello.send_key,
        };
        broker.send_raw(welcome.as_bytes()).await;
        broker
    }

    /// Seals and sends one block of `plaintext`.
    async fn send_raw(&mut self, plaintext: &[u8]) {
        let iv = self.send_key.next_iv().unwrap();
        let block = seal_block(
            self.send_key.aes_key(),
            &iv,
            BLOCK_SIZE - GCM_TAG_SIZE,
            plaintext,
        )
        .unwrap();
        self.conn.send_frame(&block).await.unwrap();
    }

    /// Reads and decodes the next signed client transmission.
    async fn read(&mut self) -> (Vec<u8>, ClientTransmission) {
        let frame = self.conn.recv_frame().await.unwrap();
        assert_eq!(frame.len(), BLOCK_SIZE);
        let iv = self.recv_key.next_iv().unwrap();
        let padded = open_block(self.recv_key.aes_key(), &iv, &frame).unwrap();
        decode_client_transmission(&padded).unwrap()
    }

    /// Responds on a correlation id.
    async fn respond(&mut self, corr_id: &CorrelationId, queue_id: &QueueId, cmd: &BrokerCommand) {
        let bytes = encode_broker_transmission(corr_id, queue_id, cmd);
        self.send_raw(&bytes).await;
    }

    /// Pushes an unsolicited command (empty correlation id).
    async fn push(&mut self, queue_id: &QueueId, cmd: &BrokerCommand) {
        let corr_id = CorrelationId::default();
        let bytes = encode_broker_transmission(&corr_id, queue_id, cmd);
        self.send_raw(&bytes).await;
    }

    async fn close(&self) {
        self.conn.close().await.unwrap();
    }
}

/// Connects a client against a broker task serving the given welcome.
async fn connected_client(
    welcome: &'static str,
) -> (SmpClient, Arc<DeliveryQueue<QueueEvent>>, ScriptedBroker) {
    let (client_end, broker_end) = MockConnection::pair();
    let broker = tokio::spawn(ScriptedBroker::accept(broker_end, welcome));

    let deliveries = Arc::new(DeliveryQueue::new(16));
    let client = SmpClient::connect(
        test_server(),
        Arc::new(client_end),
        &ClientConfig::default(),
        Arc::clone(&deliveries),
    )
    .await
    .expect("handshake");

    (client, deliveries, broker.await.unwrap())
}

// ============================================
// Handshake scenarios
// ============================================

#[tokio::test]
async fn handshake_establishes_session() {
    let (client, _deliveries, _broker) = connected_client("0.4.0.0 ").await;
    assert!(client.is_connected());
    assert_eq!(client.block_size(), BLOCK_SIZE);
}

#[tokio::test]
async fn rejects_newer_server_version() {
    let (client_end, broker_end) = MockConnection::pair();
    let broker = tokio::spawn(ScriptedBroker::accept(broker_end, "0.5.0.0 "));

    let result = SmpClient::connect(
        test_server(),
        Arc::new(client_end),
        &ClientConfig::default(),
        Arc::new(DeliveryQueue::new(16)),
    )
    .await;

    assert!(matches!(
        result,
        Err(ClientError::IncompatibleVersion { .. })
    ));
    broker.await.unwrap();
}

#[tokio::test]
async fn rejects_wrong_key_hash() {
    let (client_end, broker_end) = MockConnection::pair();

    // Broker task: the client gives up on the key pin before sending
    // anything, so just serve the header and key.
    let broker = tokio::spawn(async move {
        let spki = broker_pair().public_key().spki_der().to_vec();
        let header = ServerHeader {
            block_size: BLOCK_SIZE,
            transport_mode: RSA_TRANSPORT_MODE,
            key_size: spki.len(),
        };
        broker_end.send_frame(&header.encode()).await.unwrap();
        broker_end.send_frame(&spki).await.unwrap();
    });

    let server = test_server().with_key_hash(smp_common::KeyHash::new([0u8; 32]));
    let result = SmpClient::connect(
        server,
        Arc::new(client_end),
        &ClientConfig::default(),
        Arc::new(DeliveryQueue::new(16)),
    )
    .await;

    assert!(matches!(result, Err(ClientError::KeyHashMismatch)));
    broker.await.unwrap();
}

#[tokio::test]
async fn accepts_pinned_key_hash() {
    let (client_end, broker_end) = MockConnection::pair();
    let broker = tokio::spawn(ScriptedBroker::accept(broker_end, "0.4.1.0 "));

    let server = test_server().with_key_hash(broker_pair().public_key().fingerprint());
    let client = SmpClient::connect(
        server,
        Arc::new(client_end),
        &ClientConfig::default(),
        Arc::new(DeliveryQueue::new(16)),
    )
    .await
    .expect("pinned handshake");

    assert!(client.is_connected());
    broker.await.unwrap();
}

// ============================================
// Queue lifecycle scenarios
// ============================================

#[tokio::test]
async fn create_queue_returns_ids() {
    let (client, _deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let alice = alice_pair();

    let broker_task = tokio::spawn(async move {
        let (signature, transmission) = broker.read().await;
        assert_eq!(transmission.corr_id.as_bytes(), b"0");
        assert!(transmission.queue_id.is_empty());

        // The command carries Alice's key, and the signature verifies
        // under it.
        let ClientCommand::Create { recipient_key } = &transmission.command else {
            panic!("expected NEW, got {:?}", transmission.command);
        };
        let key = SpkiPublicKey::from_spki_der(recipient_key).unwrap();
        let body = transmission_body(
            &transmission.corr_id,
            &transmission.queue_id,
            &transmission.command,
        );
        verify_pss(&key, &body, &signature).unwrap();

        let ids = BrokerCommand::QueueIds {
            recipient_id: QueueId::from_bytes(b"rcv-1"),
            sender_id: QueueId::from_bytes(b"snd-1"),
        };
        broker
            .respond(&transmission.corr_id, &QueueId::empty(), &ids)
            .await;
        broker
    });

    let (rcv_id, snd_id) = client.create_queue(alice).await.unwrap();
    assert_eq!(rcv_id.as_bytes(), b"rcv-1");
    assert_eq!(snd_id.as_bytes(), b"snd-1");
    broker_task.await.unwrap();
}

#[tokio::test]
async fn full_message_flow() {
    let (client, deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let alice = alice_pair();
    let bob = bob_pair();

    let rcv_id = QueueId::from_bytes(b"rcv-queue");
    let snd_id = QueueId::from_bytes(b"snd-queue");
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();

    let broker_task = {
        let rcv_id = rcv_id.clone();
        let snd_id = snd_id.clone();
        tokio::spawn(async move {
            // NEW
            let (_, t) = broker.read().await;
            assert!(matches!(t.command, ClientCommand::Create { .. }));
            let ids = BrokerCommand::QueueIds {
                recipient_id: rcv_id.clone(),
                sender_id: snd_id.clone(),
            };
            broker.respond(&t.corr_id, &QueueId::empty(), &ids).await;

            // SUB
            let (_, t) = broker.read().await;
            assert_eq!(t.command, ClientCommand::Subscribe);
            assert_eq!(t.queue_id, rcv_id);
            broker.respond(&t.corr_id, &rcv_id, &BrokerCommand::Ok).await;

            // KEY carries Bob's sender key
            let (_, t) = broker.read().await;
            let ClientCommand::Secure { sender_key } = &t.command else {
                panic!("expected KEY, got {:?}", t.command);
            };
            assert_eq!(sender_key, &bob_pair().public_key().spki_der().to_vec());
            broker.respond(&t.corr_id, &rcv_id, &BrokerCommand::Ok).await;

            // SEND from Bob on the sender id, signed by Bob
            let (signature, t) = broker.read().await;
            assert_eq!(t.queue_id, snd_id);
            let ClientCommand::Send { body } = &t.command else {
                panic!("expected SEND, got {:?}", t.command);
            };
            assert_eq!(body, b"hello");
            let body_bytes = transmission_body(&t.corr_id, &t.queue_id, &t.command);
            verify_pss(bob_pair().public_key(), &body_bytes, &signature).unwrap();
            broker.respond(&t.corr_id, &snd_id, &BrokerCommand::Ok).await;

            // Unsolicited delivery to Alice
            let msg = BrokerCommand::Message {
                msg_id: b"m-1".to_vec(),
                timestamp: ts,
                body: b"hello".to_vec(),
            };
            broker.push(&rcv_id, &msg).await;

            // ACK
            let (_, t) = broker.read().await;
            assert_eq!(t.command, ClientCommand::Acknowledge);
            broker.respond(&t.corr_id, &rcv_id, &BrokerCommand::Ok).await;
            broker
        })
    };

    // Alice's side
    let (got_rcv, got_snd) = client.create_queue(alice).await.unwrap();
    assert_eq!(got_rcv, rcv_id);
    assert_eq!(got_snd, snd_id);
    client.subscribe(alice, &rcv_id).await.unwrap();
    client
        .secure_queue(alice, &rcv_id, bob.public_key())
        .await
        .unwrap();

    // Bob's side
    client
        .send_message(Some(bob), &snd_id, b"hello".to_vec())
        .await
        .unwrap();

    // The delivery arrives on Alice's queue
    let event = deliveries.dequeue().await.expect("delivery");
    assert_eq!(event.queue_id, rcv_id);
    assert_eq!(event.server, test_server());
    let BrokerCommand::Message { body, timestamp, .. } = event.command else {
        panic!("expected MSG, got {:?}", event.command);
    };
    assert_eq!(body, b"hello");
    assert_eq!(timestamp, ts);

    client.acknowledge(alice, &rcv_id).await.unwrap();
    broker_task.await.unwrap();
}

#[tokio::test]
async fn subscribe_accepts_waiting_message() {
    let (client, deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let alice = alice_pair();
    let rcv_id = QueueId::from_bytes(b"q");
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let broker_task = {
        let rcv_id = rcv_id.clone();
        tokio::spawn(async move {
            let (_, t) = broker.read().await;
            let msg = BrokerCommand::Message {
                msg_id: b"m-0".to_vec(),
                timestamp: ts,
                body: b"backlog".to_vec(),
            };
            broker.respond(&t.corr_id, &rcv_id, &msg).await;
            broker
        })
    };

    client.subscribe(alice, &rcv_id).await.unwrap();

    let event = deliveries.dequeue().await.expect("delivery");
    assert_eq!(event.queue_id, rcv_id);
    assert!(matches!(event.command, BrokerCommand::Message { .. }));
    broker_task.await.unwrap();
}

// ============================================
// Multiplexing and error scenarios
// ============================================

#[tokio::test]
async fn responses_match_by_correlation_id() {
    let (client, _deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let alice = alice_pair();

    let broker_task = tokio::spawn(async move {
        // Read both requests before answering, then answer in reverse
        // order.
        let (_, first) = broker.read().await;
        let (_, second) = broker.read().await;
        assert!(matches!(first.command, ClientCommand::Create { .. }));
        assert_eq!(second.command, ClientCommand::Ping);

        broker
            .respond(&second.corr_id, &QueueId::empty(), &BrokerCommand::Pong)
            .await;
        let ids = BrokerCommand::QueueIds {
            recipient_id: QueueId::from_bytes(b"r"),
            sender_id: QueueId::from_bytes(b"s"),
        };
        broker.respond(&first.corr_id, &QueueId::empty(), &ids).await;
        broker
    });

    let (create_result, ping_result) =
        tokio::join!(client.create_queue(alice), client.ping());
    let (rcv_id, _) = create_result.unwrap();
    assert_eq!(rcv_id.as_bytes(), b"r");
    ping_result.unwrap();
    broker_task.await.unwrap();
}

#[tokio::test]
async fn broker_error_rejects_request() {
    let (client, _deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let snd_id = QueueId::from_bytes(b"locked");

    let broker_task = {
        let snd_id = snd_id.clone();
        tokio::spawn(async move {
            let (_, t) = broker.read().await;
            broker
                .respond(
                    &t.corr_id,
                    &snd_id,
                    &BrokerCommand::Error(ProtocolError::Auth),
                )
                .await;
            broker
        })
    };

    let result = client.send_message(None, &snd_id, b"x".to_vec()).await;
    assert!(matches!(
        result,
        Err(ClientError::Protocol(ProtocolError::Auth))
    ));
    broker_task.await.unwrap();
}

#[tokio::test]
async fn prohibited_party_response_rejects_request() {
    let (client, _deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let queue = QueueId::from_bytes(b"q");

    let broker_task = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let (_, t) = broker.read().await;
            // A client-party tag coming back from the broker
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&encode_broker_transmission(
                &t.corr_id,
                &queue,
                &BrokerCommand::Ok,
            ));
            // Swap the serialized OK for SUB, keeping the framing
            let text = String::from_utf8(bytes).unwrap().replace("OK ", "SUB ");
            broker.send_raw(text.as_bytes()).await;
            broker
        })
    };

    let result = client.send_message(None, &queue, b"x".to_vec()).await;
    assert!(matches!(
        result,
        Err(ClientError::Protocol(ProtocolError::Cmd(
            CommandError::Prohibited
        )))
    ));
    broker_task.await.unwrap();
}

#[tokio::test]
async fn unexpected_response_is_reported() {
    let (client, _deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let queue = QueueId::from_bytes(b"q");

    let broker_task = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let (_, t) = broker.read().await;
            broker.respond(&t.corr_id, &queue, &BrokerCommand::Ok).await;
            broker
        })
    };

    // PING must come back as PONG, not OK
    let result = client.ping().await;
    assert!(matches!(
        result,
        Err(ClientError::UnexpectedResponse { .. })
    ));
    broker_task.await.unwrap();
}

#[tokio::test]
async fn disconnect_rejects_pending_and_closes_deliveries() {
    let (client, deliveries, mut broker) = connected_client("0.4.0.0 ").await;

    let broker_task = tokio::spawn(async move {
        // Swallow the request and hang up instead of answering
        let _ = broker.read().await;
        broker.close().await;
    });

    let result = client.ping().await;
    assert!(matches!(result, Err(ClientError::Disconnected)));

    // The loop has shut everything down
    assert_eq!(deliveries.dequeue().await, None);
    assert!(!client.is_connected());

    // New requests fail fast
    assert!(matches!(
        client.ping().await,
        Err(ClientError::Disconnected)
    ));
    broker_task.await.unwrap();
}

#[tokio::test]
async fn unsolicited_end_is_delivered() {
    let (client, deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let rcv_id = QueueId::from_bytes(b"ended-queue");

    broker.push(&rcv_id, &BrokerCommand::Unsubscribed).await;

    let event = deliveries.dequeue().await.expect("push");
    assert_eq!(event.queue_id, rcv_id);
    assert_eq!(event.command, BrokerCommand::Unsubscribed);
    assert!(client.is_connected());
}

#[tokio::test]
async fn undecryptable_block_is_skipped() {
    let (client, deliveries, mut broker) = connected_client("0.4.0.0 ").await;
    let rcv_id = QueueId::from_bytes(b"q");

    // A block of the right size that will not authenticate
    broker.conn.send_frame(&vec![0u8; BLOCK_SIZE]).await.unwrap();
    // Burn the IV the client spent on it
    let _ = broker.send_key.next_iv().unwrap();

    // The connection survives and later pushes still arrive
    broker.push(&rcv_id, &BrokerCommand::Unsubscribed).await;
    let event = deliveries.dequeue().await.expect("push after bad block");
    assert_eq!(event.command, BrokerCommand::Unsubscribed);
    assert!(client.is_connected());
}
