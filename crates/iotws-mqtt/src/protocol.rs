//! The seam to an MQTT packet layer.
//!
//! Framing, packet ids, keep-alive and QoS handshakes belong to the packet
//! layer. It reads and writes its packets through the [`ByteStream`] it is
//! handed on every call, and owns no socket of its own.

use iotws_stream::ByteStream;

use crate::error::{MqttError, MqttResult};
use crate::params::ConnectOptions;

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum QoS {
    /// Fire and forget.
    #[default]
    AtMostOnce = 0,
    /// Acknowledged delivery, possibly duplicated.
    AtLeastOnce = 1,
    /// Exactly-once delivery.
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = MqttError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(MqttError::InvalidQos(other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos as u8
    }
}

/// An inbound PUBLISH, borrowed from the packet layer for the duration of a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    /// Topic the message was published to.
    pub topic: &'a str,
    /// Raw payload.
    pub payload: &'a [u8],
    /// Delivery QoS.
    pub qos: QoS,
    /// Whether the broker delivered a retained message.
    pub retained: bool,
}

/// An MQTT packet layer driven over a byte stream.
pub trait MqttProtocol {
    /// Send CONNECT and wait for CONNACK.
    ///
    /// # Errors
    /// Returns [`MqttError::ConnectionRefused`] when the broker refuses, or
    /// another [`MqttError`] when the exchange fails.
    fn connect(&mut self, stream: &mut dyn ByteStream, options: &ConnectOptions) -> MqttResult<()>;

    /// Whether an MQTT session is established.
    fn is_connected(&self) -> bool;

    /// Process whatever is readable, delivering inbound PUBLISH packets to
    /// `on_message`, and service keep-alive.
    ///
    /// # Errors
    /// Returns an [`MqttError`] when the session broke.
    fn poll(
        &mut self,
        stream: &mut dyn ByteStream,
        on_message: &mut dyn FnMut(Message<'_>),
    ) -> MqttResult<()>;

    /// Send DISCONNECT and drop the session.
    fn disconnect(&mut self, stream: &mut dyn ByteStream);

    /// Publish `payload` to `topic`.
    ///
    /// # Errors
    /// Returns an [`MqttError`] when the packet could not be sent or acknowledged.
    fn publish(
        &mut self,
        stream: &mut dyn ByteStream,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> MqttResult<()>;

    /// Subscribe to a topic filter.
    ///
    /// # Errors
    /// Returns an [`MqttError`] when the broker rejected the subscription.
    fn subscribe(&mut self, stream: &mut dyn ByteStream, topic: &str, qos: QoS) -> MqttResult<()>;

    /// Unsubscribe from a topic filter.
    ///
    /// # Errors
    /// Returns an [`MqttError`] when the packet could not be sent.
    fn unsubscribe(&mut self, stream: &mut dyn ByteStream, topic: &str) -> MqttResult<()>;
}
