//! Error types for signing and presigned path handling.

use iotws_core::IotError;

/// Errors produced while building an identity or inspecting a presigned path.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A credential needed for signing is not configured.
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    /// The surrounding configuration is unusable.
    #[error(transparent)]
    Config(#[from] IotError),

    /// The `X-Amz-Credential` value does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The signing algorithm is not `AWS4-HMAC-SHA256`.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required presigned query parameter is missing or malformed.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// The presigned path carries a parameter this protocol never signs.
    #[error("Unexpected query parameter: {0}")]
    UnexpectedQueryParam(String),

    /// The presigned path is past `X-Amz-Date` + `X-Amz-Expires`.
    #[error("Request has expired")]
    RequestExpired,

    /// The recomputed signature does not match the one in the path.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// Signing itself failed.
    #[error(transparent)]
    Sign(#[from] SignError),
}

/// Errors produced by a signing call.
///
/// A failed signing call means "do not attempt a connection this cycle".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// The time source could not supply a reading.
    #[error("no date/time reading available")]
    TimeUnavailable,

    /// The time source returned something other than a `yyyyMMddHHmmss` UTC stamp.
    #[error("invalid date/time reading: {0:?}")]
    InvalidTimestamp(String),
}
