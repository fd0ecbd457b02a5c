//! Session parameters for the MQTT connect.

use iotws_auth::DateTimeProvider;
use iotws_stream::{AwsConnectionParams, WebSocketParams};

/// Protocol level of MQTT 3.1.1, the version AWS IoT speaks.
pub const MQTT_VERSION_3_1_1: u8 = 4;

/// Where the MQTT session goes and who it is.
pub trait MqttParams {
    /// Broker host.
    fn host(&self) -> &str;
    /// Broker port.
    fn port(&self) -> u16;
    /// MQTT protocol level.
    fn version(&self) -> u8;
    /// Client identifier.
    fn client_id(&self) -> &str;
}

impl<D: DateTimeProvider> MqttParams for AwsConnectionParams<D> {
    fn host(&self) -> &str {
        WebSocketParams::host(self)
    }

    fn port(&self) -> u16 {
        WebSocketParams::port(self)
    }

    fn version(&self) -> u8 {
        MQTT_VERSION_3_1_1
    }

    fn client_id(&self) -> &str {
        AwsConnectionParams::client_id(self)
    }
}

/// The CONNECT packet fields the wrapper controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// MQTT protocol level.
    pub version: u8,
    /// Client identifier.
    pub client_id: String,
}

impl ConnectOptions {
    /// MQTT 3.1.1 options for `client_id`.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            version: MQTT_VERSION_3_1_1,
            client_id: client_id.into(),
        }
    }

    /// Read the options from connection parameters.
    pub fn from_params(params: &impl MqttParams) -> Self {
        Self {
            version: params.version(),
            client_id: params.client_id().to_owned(),
        }
    }
}
