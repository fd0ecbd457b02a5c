//! Connection parameters handed to the transport at connect time.

use std::sync::Arc;

use iotws_auth::{AuthError, ConnectionIdentity, DateTimeProvider, RequestSigner, SignError};
use iotws_core::IotConfig;
use tracing::debug;

/// WebSocket subprotocol spoken by the AWS IoT broker.
pub const MQTT_SUBPROTOCOL: &str = "mqtt";

/// Where and how the bridge connects.
pub trait WebSocketParams {
    /// Broker host.
    fn host(&self) -> &str;

    /// Broker port.
    fn port(&self) -> u16;

    /// Request path. May sign on first use.
    ///
    /// # Errors
    /// Returns a [`SignError`] when no path can be produced.
    fn path(&mut self) -> Result<String, SignError>;

    /// Expected TLS certificate fingerprint, empty for none.
    fn fingerprint(&self) -> &str;

    /// WebSocket subprotocol.
    fn protocol(&self) -> &str;

    /// Whether to use TLS.
    fn use_ssl(&self) -> bool;
}

/// Parameters of a SigV4-authenticated AWS IoT connection.
///
/// The signed path is computed on first request and reused until
/// [`invalidate_path`](Self::invalidate_path) is called, so reconnects keep
/// the first signing time. A path is valid for 24 hours; long-lived
/// devices should invalidate it before reconnecting after that.
#[derive(Debug)]
pub struct AwsConnectionParams<D> {
    identity: Arc<ConnectionIdentity>,
    signer: RequestSigner<D>,
    path: Option<String>,
    fingerprint: String,
    client_id: String,
}

impl<D: DateTimeProvider> AwsConnectionParams<D> {
    /// Create parameters for `identity`, signing with time readings from `clock`.
    #[must_use]
    pub fn new(identity: Arc<ConnectionIdentity>, clock: D) -> Self {
        Self {
            identity,
            signer: RequestSigner::new(clock),
            path: None,
            fingerprint: String::new(),
            client_id: String::new(),
        }
    }

    /// Build the identity and client id from configuration.
    ///
    /// # Errors
    /// Returns an [`AuthError`] when credentials are missing or the host
    /// cannot be resolved.
    pub fn from_config(config: &IotConfig, clock: D) -> Result<Self, AuthError> {
        let identity = ConnectionIdentity::try_from(config)?;
        Ok(Self::new(Arc::new(identity), clock).with_client_id(config.client_id.clone()))
    }

    /// Pin the broker's TLS certificate fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    /// Set the MQTT client identifier presented after the handshake.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// The shared identity.
    #[must_use]
    pub fn identity(&self) -> &Arc<ConnectionIdentity> {
        &self.identity
    }

    /// The MQTT client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The memoized signed path, if one has been computed.
    #[must_use]
    pub fn cached_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Drop the memoized path so the next request signs afresh.
    pub fn invalidate_path(&mut self) {
        if self.path.take().is_some() {
            debug!("Invalidated signed handshake path");
        }
    }

    /// The signer's time source.
    pub fn clock_mut(&mut self) -> &mut D {
        self.signer.clock_mut()
    }
}

impl<D: DateTimeProvider> WebSocketParams for AwsConnectionParams<D> {
    fn host(&self) -> &str {
        &self.identity.host
    }

    fn port(&self) -> u16 {
        self.identity.port
    }

    fn path(&mut self) -> Result<String, SignError> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let path = self.signer.sign(&self.identity)?;
        self.path = Some(path.clone());
        Ok(path)
    }

    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn protocol(&self) -> &str {
        MQTT_SUBPROTOCOL
    }

    fn use_ssl(&self) -> bool {
        true
    }
}
