//! A minimal MQTT 3.1.1 packet layer over a [`ByteStream`].
//!
//! Each outbound packet is one `write`, so one WebSocket frame. Inbound bytes
//! are accumulated until a whole packet is present, since the broker may
//! split packets across frames.

use std::collections::VecDeque;

use iotws_mqtt::{ConnectOptions, Message, MqttError, MqttProtocol, MqttResult, QoS};
use iotws_stream::ByteStream;

use crate::packet;

/// Polls spent waiting for an acknowledgement before giving up.
const ACK_POLLS: usize = 16;
const KEEP_ALIVE_SECS: u16 = 60;

/// Packet layer state.
#[derive(Debug, Default)]
pub struct MiniMqtt {
    session: bool,
    next_id: u16,
    inbound: Vec<u8>,
    packets: VecDeque<(u8, Vec<u8>)>,
}

impl MiniMqtt {
    /// A fresh, disconnected packet layer.
    pub fn new() -> Self {
        Self::default()
    }

    fn packet_id(&mut self) -> u16 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    fn send(stream: &mut dyn ByteStream, packet: &[u8]) -> MqttResult<()> {
        if stream.write(packet) == packet.len() {
            Ok(())
        } else {
            Err(MqttError::NotConnected)
        }
    }

    fn fill(&mut self, stream: &mut dyn ByteStream) {
        let mut buf = [0u8; 64];
        loop {
            let n = stream.read(&mut buf);
            if n == 0 {
                break;
            }
            self.inbound.extend_from_slice(&buf[..n]);
        }
        while let Some(len) = packet::packet_len(&self.inbound) {
            let raw: Vec<u8> = self.inbound.drain(..len).collect();
            if let Some((header, body)) = packet::split(&raw) {
                self.packets.push_back((header, body.to_vec()));
            }
        }
    }

    fn wait_for(&mut self, stream: &mut dyn ByteStream, packet_type: u8) -> MqttResult<Vec<u8>> {
        for _ in 0..ACK_POLLS {
            self.fill(stream);
            if let Some(pos) = self.packets.iter().position(|(h, _)| h >> 4 == packet_type) {
                if let Some((_, body)) = self.packets.remove(pos) {
                    return Ok(body);
                }
            }
            if !stream.connected() {
                self.session = false;
                return Err(MqttError::NotConnected);
            }
        }
        Err(MqttError::Protocol(format!("no packet of type {packet_type}")))
    }
}

impl MqttProtocol for MiniMqtt {
    fn connect(&mut self, stream: &mut dyn ByteStream, options: &ConnectOptions) -> MqttResult<()> {
        self.inbound.clear();
        self.packets.clear();

        let mut body = Vec::new();
        packet::put_string(&mut body, "MQTT");
        body.push(options.version);
        body.push(0x02);
        body.extend_from_slice(&KEEP_ALIVE_SECS.to_be_bytes());
        packet::put_string(&mut body, &options.client_id);
        Self::send(stream, &packet::frame(packet::CONNECT << 4, &body))?;

        let ack = self.wait_for(stream, packet::CONNACK)?;
        match ack.get(1).copied() {
            Some(0) => {
                self.session = true;
                Ok(())
            }
            Some(code) => Err(MqttError::ConnectionRefused(code)),
            None => Err(MqttError::Protocol("short CONNACK".to_owned())),
        }
    }

    fn is_connected(&self) -> bool {
        self.session
    }

    fn poll(
        &mut self,
        stream: &mut dyn ByteStream,
        on_message: &mut dyn FnMut(Message<'_>),
    ) -> MqttResult<()> {
        self.fill(stream);
        if !stream.connected() {
            self.session = false;
            return Err(MqttError::NotConnected);
        }
        // Late acknowledgements carry nothing the wrapper needs.
        while let Some((header, body)) = self.packets.pop_front() {
            if header >> 4 != packet::PUBLISH {
                continue;
            }
            let qos = QoS::try_from((header >> 1) & 0x03)?;
            let (topic, mut payload) = packet::read_string(&body);
            if qos != QoS::AtMostOnce {
                payload = &payload[2..];
            }
            on_message(Message {
                topic,
                payload,
                qos,
                retained: header & 0x01 != 0,
            });
        }
        Ok(())
    }

    fn disconnect(&mut self, stream: &mut dyn ByteStream) {
        if self.session {
            let _ = Self::send(stream, &packet::frame(packet::DISCONNECT << 4, &[]));
        }
        self.session = false;
    }

    fn publish(
        &mut self,
        stream: &mut dyn ByteStream,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> MqttResult<()> {
        let id = (qos != QoS::AtMostOnce).then(|| (self.packet_id(), u8::from(qos)));
        let mut packet = packet::publish(topic, payload, id);
        if retained {
            packet[0] |= 0x01;
        }
        Self::send(stream, &packet)
    }

    fn subscribe(&mut self, stream: &mut dyn ByteStream, topic: &str, qos: QoS) -> MqttResult<()> {
        let mut body = self.packet_id().to_be_bytes().to_vec();
        packet::put_string(&mut body, topic);
        body.push(u8::from(qos));
        Self::send(stream, &packet::frame((packet::SUBSCRIBE << 4) | 0x02, &body))?;

        let ack = self.wait_for(stream, packet::SUBACK)?;
        match ack.get(2).copied() {
            Some(0x80) | None => Err(MqttError::Protocol(format!("subscription to {topic} rejected"))),
            Some(_) => Ok(()),
        }
    }

    fn unsubscribe(&mut self, stream: &mut dyn ByteStream, topic: &str) -> MqttResult<()> {
        let mut body = self.packet_id().to_be_bytes().to_vec();
        packet::put_string(&mut body, topic);
        Self::send(stream, &packet::frame((packet::UNSUBSCRIBE << 4) | 0x02, &body))
    }
}
