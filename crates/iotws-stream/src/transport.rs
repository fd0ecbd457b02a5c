//! The seam to a message-oriented WebSocket client.
//!
//! Implementations own the socket, the TLS session and the upgrade handshake.
//! The bridge only tells them where to connect and drains their events.

/// Everything a transport needs to open the upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeRequest<'a> {
    /// Broker host.
    pub host: &'a str,
    /// Broker port.
    pub port: u16,
    /// Request path, including the signed query string.
    pub path: &'a str,
    /// Expected TLS certificate fingerprint. Empty means no pinning.
    pub fingerprint: &'a str,
    /// Value of the `Sec-WebSocket-Protocol` header.
    pub protocol: &'a str,
    /// Whether to connect over TLS.
    pub use_ssl: bool,
}

/// An event delivered by [`WsTransport::poll`].
///
/// Frame payloads are borrowed from the transport and only valid during the
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsEvent<'a> {
    /// The upgrade handshake completed.
    Connected,
    /// The connection closed or was never established.
    Disconnected,
    /// A text frame arrived.
    Text(&'a [u8]),
    /// A binary frame arrived.
    Binary(&'a [u8]),
}

/// A WebSocket client driven by explicit polling.
pub trait WsTransport {
    /// Start connecting. Completion is reported later through [`poll`](Self::poll).
    fn begin(&mut self, request: &HandshakeRequest<'_>);

    /// Service the connection, delivering any pending events to `on_event`.
    fn poll(&mut self, on_event: &mut dyn FnMut(WsEvent<'_>));

    /// Send one binary frame. Returns `false` if the frame was not sent.
    fn send_binary(&mut self, data: &[u8]) -> bool;

    /// Close the connection. Idempotent.
    fn disconnect(&mut self);
}

impl<T: WsTransport + ?Sized> WsTransport for Box<T> {
    fn begin(&mut self, request: &HandshakeRequest<'_>) {
        (**self).begin(request);
    }

    fn poll(&mut self, on_event: &mut dyn FnMut(WsEvent<'_>)) {
        (**self).poll(on_event);
    }

    fn send_binary(&mut self, data: &[u8]) -> bool {
        (**self).send_binary(data)
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}
