//! Common AWS type definitions shared across crates.

use std::fmt;

/// AWS Region identifier, e.g. `us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when none is configured.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the AWS IoT data endpoint host for an account endpoint prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use iotws_core::AwsRegion;
    ///
    /// let region = AwsRegion::new("us-east-1");
    /// assert_eq!(
    ///     region.iot_host("A2MBBEONHC9LUG"),
    ///     "A2MBBEONHC9LUG.iot.us-east-1.amazonaws.com"
    /// );
    /// ```
    #[must_use]
    pub fn iot_host(&self, endpoint: &str) -> String {
        format!("{endpoint}.iot.{}.amazonaws.com", self.0)
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
