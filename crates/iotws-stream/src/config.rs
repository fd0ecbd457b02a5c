//! Bridge tuning.

use std::time::Duration;

use iotws_core::IotConfig;

/// Buffer size and handshake timing of a [`WebSocketStream`](crate::WebSocketStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Capacity of the inbound ring buffer. One byte is never usable.
    pub buffer_size: usize,
    /// How long `connect` waits for the transport to report a connection.
    pub connect_timeout: Duration,
    /// Sleep between transport polls while waiting.
    pub poll_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            connect_timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl From<&IotConfig> for StreamConfig {
    fn from(config: &IotConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}
