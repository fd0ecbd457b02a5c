//! Configuration management for iotws.
//!
//! All configuration is driven by environment variables, in the same style
//! as the AWS SDKs (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, ...).

use std::env;
use std::str::FromStr;

use crate::error::{IotError, IotResult};
use crate::types::AwsRegion;

/// Default TLS port of the AWS IoT WebSocket endpoint.
const DEFAULT_PORT: u16 = 443;
/// Default size of the inbound frame buffer, in bytes.
const DEFAULT_BUFFER_SIZE: usize = 1000;
/// Default handshake timeout, in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
/// Default interval between transport polls during the handshake.
const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Global configuration for a device connection.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IotConfig {
    /// AWS region of the IoT endpoint.
    pub region: AwsRegion,
    /// Account-specific endpoint prefix, e.g. `A2MBBEONHC9LUG`.
    pub endpoint: String,
    /// Explicit broker host. Derived from `endpoint` and `region` when empty.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// IAM access key id.
    pub access_key_id: Option<String>,
    /// IAM secret access key.
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    /// MQTT client identifier.
    pub client_id: String,
    /// Capacity of the inbound ring buffer.
    pub buffer_size: usize,
    /// Handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Poll interval during the handshake, in milliseconds.
    pub poll_interval_ms: u64,
    /// Log level.
    pub log_level: String,
}

impl std::fmt::Debug for IotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IotConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("client_id", &self.client_id)
            .field("buffer_size", &self.buffer_size)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for IotConfig {
    fn default() -> Self {
        Self {
            region: AwsRegion::default(),
            endpoint: String::new(),
            host: String::new(),
            port: DEFAULT_PORT,
            access_key_id: None,
            secret_access_key: None,
            client_id: default_client_id(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_level: "info".to_owned(),
        }
    }
}

impl IotConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns [`IotError::InvalidConfig`] if a numeric variable does not parse.
    pub fn from_env() -> IotResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// [`IotConfig::from_env`] is this function over the process environment.
    ///
    /// # Errors
    /// Returns [`IotError::InvalidConfig`] if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IotResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("AWS_IOT_REGION").or_else(|| lookup("DEFAULT_REGION")) {
            config.region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("AWS_IOT_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = lookup("AWS_IOT_HOST") {
            config.host = v;
        }
        if let Some(v) = lookup("AWS_IOT_PORT") {
            config.port = parse_value("AWS_IOT_PORT", &v)?;
        }
        config.access_key_id = lookup("AWS_ACCESS_KEY_ID").or_else(|| lookup("ACCESS_KEY"));
        config.secret_access_key =
            lookup("AWS_SECRET_ACCESS_KEY").or_else(|| lookup("SECRET_KEY"));
        if let Some(v) = lookup("MQTT_CLIENT_ID") {
            config.client_id = v;
        }
        if let Some(v) = lookup("WS_BUFFER_SIZE") {
            config.buffer_size = parse_value("WS_BUFFER_SIZE", &v)?;
        }
        if let Some(v) = lookup("WS_CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms = parse_value("WS_CONNECT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("WS_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_value("WS_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The broker host: `host` when set, otherwise derived from the endpoint.
    ///
    /// # Errors
    /// Returns [`IotError::MissingConfig`] when neither a host nor an endpoint is set.
    pub fn resolved_host(&self) -> IotResult<String> {
        if !self.host.is_empty() {
            return Ok(self.host.clone());
        }
        if self.endpoint.is_empty() {
            return Err(IotError::MissingConfig("AWS_IOT_HOST or AWS_IOT_ENDPOINT"));
        }
        Ok(self.region.iot_host(&self.endpoint))
    }

    /// The endpoint prefix: `endpoint` when set, otherwise the first label of `host`.
    #[must_use]
    pub fn resolved_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        self.host
            .split('.')
            .next()
            .unwrap_or_default()
            .to_owned()
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> IotResult<T> {
    value.trim().parse().map_err(|_| IotError::InvalidConfig {
        key,
        value: value.to_owned(),
    })
}

fn default_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("iotws-{}", &id[..8])
}
