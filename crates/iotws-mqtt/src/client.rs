//! The AWS IoT MQTT client wrapper.

use iotws_stream::ByteStream;
use tracing::{debug, info, warn};

use crate::error::{MqttError, MqttResult};
use crate::params::ConnectOptions;
use crate::protocol::{MqttProtocol, QoS};
use crate::router::SubscriptionRouter;

/// An MQTT session over a [`ByteStream`], with per-topic callbacks.
///
/// The client owns the stream and the packet layer. Nothing happens in the
/// background: inbound messages are only delivered from
/// [`yield_now`](Self::yield_now).
#[derive(Debug)]
pub struct IotMqttClient<S, Q> {
    stream: S,
    protocol: Q,
    options: ConnectOptions,
    router: SubscriptionRouter,
}

impl<S: ByteStream, Q: MqttProtocol> IotMqttClient<S, Q> {
    /// Create a disconnected client.
    #[must_use]
    pub fn new(stream: S, protocol: Q, options: ConnectOptions) -> Self {
        Self {
            stream,
            protocol,
            options,
            router: SubscriptionRouter::new(),
        }
    }

    /// Open the stream from scratch and establish the MQTT session.
    ///
    /// # Errors
    /// [`MqttError::Stream`] when the WebSocket could not be opened, or the
    /// packet layer's error when the broker refused the session.
    pub fn connect(&mut self) -> MqttResult<()> {
        self.stream.stop();
        self.stream.connect()?;
        debug!(
            client_id = %self.options.client_id,
            version = self.options.version,
            "Sending MQTT connect"
        );
        self.protocol.connect(&mut self.stream, &self.options)?;
        info!(client_id = %self.options.client_id, "MQTT session established");
        Ok(())
    }

    /// Whether both the stream and the MQTT session are up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.connected() && self.protocol.is_connected()
    }

    /// Process pending inbound traffic and run subscription callbacks.
    ///
    /// # Errors
    /// Returns the packet layer's error when the session broke.
    pub fn yield_now(&mut self) -> MqttResult<()> {
        let router = &mut self.router;
        self.protocol.poll(&mut self.stream, &mut |message| {
            router.dispatch(message.topic, message.payload);
        })
    }

    /// End the MQTT session and close the stream.
    pub fn disconnect(&mut self) {
        self.protocol.disconnect(&mut self.stream);
        self.stream.stop();
        info!(client_id = %self.options.client_id, "MQTT session closed");
    }

    /// Publish `payload` to `topic` as given.
    ///
    /// # Errors
    /// [`MqttError::NotConnected`] without a session, otherwise the packet
    /// layer's error.
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> MqttResult<()> {
        self.ensure_connected()?;
        self.protocol
            .publish(&mut self.stream, topic, payload, qos, retained)
    }

    /// Subscribe to `topic` and route its messages to `callback`.
    ///
    /// Subscribing again to the same topic replaces the callback. If the
    /// broker rejects the subscription the callback is not kept.
    ///
    /// # Errors
    /// [`MqttError::NotConnected`] without a session, otherwise the packet
    /// layer's error.
    pub fn subscribe<F>(&mut self, topic: &str, qos: QoS, callback: F) -> MqttResult<()>
    where
        F: FnMut(&str, &[u8]) + 'static,
    {
        self.ensure_connected()?;
        if let Err(e) = self.protocol.subscribe(&mut self.stream, topic, qos) {
            warn!(topic, error = %e, "Subscribe failed");
            return Err(e);
        }
        self.router.insert(topic, Box::new(callback));
        Ok(())
    }

    /// Drop the callback for `topic` and unsubscribe from it.
    ///
    /// The callback is removed even when the unsubscribe packet fails.
    ///
    /// # Errors
    /// [`MqttError::NotConnected`] without a session, otherwise the packet
    /// layer's error.
    pub fn unsubscribe(&mut self, topic: &str) -> MqttResult<()> {
        self.router.remove(topic);
        self.ensure_connected()?;
        self.protocol.unsubscribe(&mut self.stream, topic)
    }

    /// Session options in use.
    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Registered subscription callbacks.
    #[must_use]
    pub fn router(&self) -> &SubscriptionRouter {
        &self.router
    }

    /// The underlying stream.
    #[must_use]
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// The underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// The packet layer.
    #[must_use]
    pub fn protocol(&self) -> &Q {
        &self.protocol
    }

    fn ensure_connected(&self) -> MqttResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(MqttError::NotConnected)
        }
    }
}
