//! MQTT over WebSockets for AWS IoT.
//!
//! [`IotMqttClient`] ties together a [`ByteStream`](iotws_stream::ByteStream)
//! (normally an [`iotws_stream::WebSocketStream`] over a presigned handshake)
//! and an MQTT packet layer behind the [`MqttProtocol`] seam, and routes
//! inbound messages to per-topic callbacks.

mod client;
mod error;
mod params;
mod protocol;
mod router;

pub use client::IotMqttClient;
pub use error::{MqttError, MqttResult};
pub use params::{ConnectOptions, MQTT_VERSION_3_1_1, MqttParams};
pub use protocol::{Message, MqttProtocol, QoS};
pub use router::{MessageCallback, SubscriptionRouter, topic_matches};
