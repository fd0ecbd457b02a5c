//! Error types for the iotws core.

/// Core error type for configuration and shared types.
#[derive(Debug, thiserror::Error)]
pub enum IotError {
    /// A configuration value is present but cannot be used.
    #[error("invalid value for {key}: {value}")]
    InvalidConfig {
        /// The environment variable or field name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A required configuration value is absent.
    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),
}

/// Convenience result type for core operations.
pub type IotResult<T> = Result<T, IotError>;
