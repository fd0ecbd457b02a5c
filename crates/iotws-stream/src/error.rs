//! Stream error types.

use std::time::Duration;

use iotws_auth::SignError;

/// Errors returned by [`WebSocketStream::connect`](crate::WebSocketStream::connect).
///
/// Data-path operations never fail; they report zero bytes instead.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// No handshake path could be signed, so no connection was attempted.
    #[error("failed to sign handshake: {0}")]
    Signing(#[from] SignError),

    /// The transport did not report a connection within the timeout.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The transport reported a disconnect before the handshake completed.
    #[error("handshake rejected by {host}:{port}")]
    HandshakeRejected {
        /// Broker host.
        host: String,
        /// Broker port.
        port: u16,
    },
}
