//! An in-memory AWS IoT broker behind the [`WsTransport`] seam.
//!
//! It checks the presigned handshake path against its own copy of the
//! device identity, then answers MQTT packets: CONNACK for CONNECT, SUBACK
//! and UNSUBACK for (un)subscriptions, and an echo of every PUBLISH to a
//! subscribed topic. Responses are queued and delivered on the next poll.

use std::collections::VecDeque;

use iotws_auth::{ConnectionIdentity, verify_presigned_path};
use iotws_stream::{HandshakeRequest, WsEvent, WsTransport};
use tracing::debug;

use crate::packet;

#[derive(Debug, Clone)]
enum Pending {
    Connected,
    Disconnected,
    Frame(Vec<u8>),
}

/// Scripted broker state, inspectable from tests.
#[derive(Debug)]
pub struct FakeBroker {
    identity: ConnectionIdentity,
    pending: VecDeque<Pending>,
    /// Every handshake path presented, in order.
    pub handshakes: Vec<String>,
    /// Every frame received from the device.
    pub received: Vec<Vec<u8>>,
    /// Currently subscribed topics.
    pub subscriptions: Vec<String>,
    /// CONNACK return code to answer with.
    pub connack_code: u8,
    /// Split outbound frames into chunks of this size.
    pub chunk: Option<usize>,
    connected: bool,
}

impl FakeBroker {
    /// A broker that accepts handshakes signed for `identity`.
    pub fn new(identity: ConnectionIdentity) -> Self {
        Self {
            identity,
            pending: VecDeque::new(),
            handshakes: Vec::new(),
            received: Vec::new(),
            subscriptions: Vec::new(),
            connack_code: 0,
            chunk: None,
            connected: false,
        }
    }

    /// Whether a WebSocket connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Push a message to the device as if another client had published it.
    pub fn inject_publish(&mut self, topic: &str, payload: &[u8]) {
        self.queue_frame(packet::publish(topic, payload, None));
    }

    /// Close the connection from the broker side.
    pub fn drop_connection(&mut self) {
        self.connected = false;
        self.pending.push_back(Pending::Disconnected);
    }

    fn queue_frame(&mut self, frame: Vec<u8>) {
        match self.chunk {
            Some(size) if size > 0 => {
                for piece in frame.chunks(size) {
                    self.pending.push_back(Pending::Frame(piece.to_vec()));
                }
            }
            _ => self.pending.push_back(Pending::Frame(frame)),
        }
    }

    fn handle_packet(&mut self, frame: &[u8]) {
        let Some((header, body)) = packet::split(frame) else {
            debug!(len = frame.len(), "Broker got a partial packet");
            return;
        };
        match header >> 4 {
            packet::CONNECT => self.queue_frame(vec![0x20, 0x02, 0x00, self.connack_code]),
            packet::PUBLISH => {
                let (topic, _) = packet::read_string(body);
                if self.subscriptions.iter().any(|s| s == topic) {
                    self.queue_frame(frame.to_vec());
                }
            }
            packet::SUBSCRIBE => {
                let id = [body[0], body[1]];
                let (topic, rest) = packet::read_string(&body[2..]);
                self.subscriptions.push(topic.to_owned());
                self.queue_frame(vec![0x90, 0x03, id[0], id[1], rest[0]]);
            }
            packet::UNSUBSCRIBE => {
                let id = [body[0], body[1]];
                let (topic, _) = packet::read_string(&body[2..]);
                self.subscriptions.retain(|s| s != topic);
                self.queue_frame(vec![0xB0, 0x02, id[0], id[1]]);
            }
            packet::DISCONNECT => self.drop_connection(),
            other => debug!(packet_type = other, "Broker ignores packet"),
        }
    }
}

impl WsTransport for FakeBroker {
    fn begin(&mut self, request: &HandshakeRequest<'_>) {
        self.handshakes.push(request.path.to_owned());
        let accepted = request.host == self.identity.host
            && request.protocol == "mqtt"
            && request.use_ssl
            && verify_presigned_path(&self.identity, request.path).is_ok();
        if accepted {
            self.connected = true;
            self.pending.push_back(Pending::Connected);
        } else {
            self.pending.push_back(Pending::Disconnected);
        }
    }

    fn poll(&mut self, on_event: &mut dyn FnMut(WsEvent<'_>)) {
        while let Some(event) = self.pending.pop_front() {
            match event {
                Pending::Connected => on_event(WsEvent::Connected),
                Pending::Disconnected => on_event(WsEvent::Disconnected),
                Pending::Frame(data) => on_event(WsEvent::Binary(&data)),
            }
        }
    }

    fn send_binary(&mut self, data: &[u8]) -> bool {
        if !self.connected {
            return false;
        }
        self.received.push(data.to_vec());
        self.handle_packet(data);
        true
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.pending.clear();
    }
}
