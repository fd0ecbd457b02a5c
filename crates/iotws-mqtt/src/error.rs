//! MQTT client errors.

use iotws_stream::StreamError;

/// Errors returned by [`IotMqttClient`](crate::IotMqttClient) and
/// [`MqttProtocol`](crate::MqttProtocol) implementations.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The byte stream could not be opened.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The operation needs an established MQTT session.
    #[error("MQTT session is not connected")]
    NotConnected,

    /// A QoS level outside 0..=2.
    #[error("invalid QoS level: {0}")]
    InvalidQos(u8),

    /// The broker refused the session, with the CONNACK return code.
    #[error("connection refused by broker (return code {0})")]
    ConnectionRefused(u8),

    /// The packet layer failed.
    #[error("MQTT protocol error: {0}")]
    Protocol(String),
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;
