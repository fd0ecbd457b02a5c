//! Configuration, error and shared types for AWS IoT MQTT over WebSockets.
//!
//! This crate holds the pieces every other `iotws` crate depends on: the
//! environment-driven [`IotConfig`], the core [`IotError`] type, and the
//! [`AwsRegion`] identifier used to derive broker host names.

mod config;
mod error;
mod types;

pub use config::IotConfig;
pub use error::{IotError, IotResult};
pub use types::AwsRegion;
