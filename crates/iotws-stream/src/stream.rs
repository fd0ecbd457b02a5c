//! Byte-stream view of a WebSocket connection.
//!
//! An MQTT client expects a socket it can read byte by byte. The broker speaks
//! MQTT inside WebSocket frames. [`WebSocketStream`] sits between the two:
//! every inbound text or binary frame is appended to a ring buffer, and reads
//! drain that buffer; every write becomes exactly one binary frame.
//!
//! ```text
//!   Disconnected --connect()--> Handshaking --Connected event--> Connected
//!        ^                          |                               |
//!        +------ timeout/reject ----+                               |
//!        +------------- Disconnected event or stop() ---------------+
//! ```
//!
//! Each transition back to `Disconnected` discards buffered bytes, so data
//! from a previous session is never delivered to the next one.

use std::io;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::params::WebSocketParams;
use crate::ring::RingBuffer;
use crate::transport::{HandshakeRequest, WsEvent, WsTransport};

/// Lifecycle of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Disconnected,
    /// `connect` is waiting for the transport.
    Handshaking,
    /// Frames are flowing.
    Connected,
}

/// The socket-like capability a protocol client is written against.
///
/// Apart from `connect`, no operation fails: when the stream is not connected
/// they report zero bytes or `None`.
pub trait ByteStream {
    /// Open the connection, blocking until it is up or has failed.
    ///
    /// # Errors
    /// Returns a [`StreamError`] when no connection could be established.
    fn connect(&mut self) -> Result<(), StreamError>;

    /// Send `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Send a single byte.
    fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Number of bytes ready to read.
    fn available(&mut self) -> usize;

    /// Read one byte.
    fn read_byte(&mut self) -> Option<u8>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// The next byte, without consuming it.
    fn peek(&mut self) -> Option<u8>;

    /// Push out anything buffered for sending.
    fn flush(&mut self) {}

    /// Close the connection and discard buffered bytes.
    fn stop(&mut self);

    /// Whether the connection is up.
    fn connected(&self) -> bool;
}

/// A [`ByteStream`] over a polled, frame-oriented transport.
///
/// Single-threaded: frames only arrive while one of the methods below polls
/// the transport.
#[derive(Debug)]
pub struct WebSocketStream<T, P> {
    transport: T,
    params: P,
    config: StreamConfig,
    fifo: RingBuffer,
    state: ConnectionState,
}

impl<T: WsTransport, P: WebSocketParams> WebSocketStream<T, P> {
    /// Create a disconnected bridge with default tuning.
    #[must_use]
    pub fn new(transport: T, params: P) -> Self {
        Self::with_config(transport, params, StreamConfig::default())
    }

    /// Create a disconnected bridge.
    pub fn with_config(transport: T, params: P, config: StreamConfig) -> Self {
        Self {
            transport,
            params,
            fifo: RingBuffer::new(config.buffer_size),
            config,
            state: ConnectionState::Disconnected,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection parameters.
    #[must_use]
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Connection parameters, e.g. to invalidate a cached path.
    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open the connection.
    ///
    /// An existing connection is stopped first. The transport is then polled
    /// every `poll_interval` until it reports a connection, reports a
    /// disconnect, or `connect_timeout` elapses.
    ///
    /// # Errors
    /// [`StreamError::Signing`] if no path could be produced (the transport is
    /// not touched), [`StreamError::HandshakeRejected`] or
    /// [`StreamError::HandshakeTimeout`] otherwise.
    pub fn connect(&mut self) -> Result<(), StreamError> {
        if self.state != ConnectionState::Disconnected {
            self.stop();
        }

        let path = self.params.path()?;
        let request = HandshakeRequest {
            host: self.params.host(),
            port: self.params.port(),
            path: &path,
            fingerprint: self.params.fingerprint(),
            protocol: self.params.protocol(),
            use_ssl: self.params.use_ssl(),
        };
        info!(host = request.host, port = request.port, "Opening WebSocket connection");

        self.state = ConnectionState::Handshaking;
        self.transport.begin(&request);

        let started = Instant::now();
        while started.elapsed() < self.config.connect_timeout {
            self.poll_transport();
            match self.state {
                ConnectionState::Connected => {
                    info!(elapsed = ?started.elapsed(), "WebSocket connected");
                    return Ok(());
                }
                ConnectionState::Disconnected => {
                    warn!("WebSocket handshake rejected");
                    self.transport.disconnect();
                    return Err(StreamError::HandshakeRejected {
                        host: self.params.host().to_owned(),
                        port: self.params.port(),
                    });
                }
                ConnectionState::Handshaking => thread::sleep(self.config.poll_interval),
            }
        }

        warn!(timeout = ?self.config.connect_timeout, "WebSocket handshake timed out");
        self.stop();
        Err(StreamError::HandshakeTimeout(self.config.connect_timeout))
    }

    /// Send `data` as one binary frame. Returns `data.len()`, or 0 if not
    /// connected or the transport refused the frame.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if !self.connected() {
            return 0;
        }
        if self.transport.send_binary(data) {
            trace!(len = data.len(), "Sent binary frame");
            data.len()
        } else {
            warn!(len = data.len(), "Transport refused binary frame");
            0
        }
    }

    /// Send a single byte as its own frame.
    pub fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Poll the transport and return the number of buffered bytes.
    pub fn available(&mut self) -> usize {
        if !self.connected() {
            return 0;
        }
        self.poll_transport();
        self.fifo.len()
    }

    /// Poll the transport and take one buffered byte.
    pub fn read_byte(&mut self) -> Option<u8> {
        if !self.connected() {
            return None;
        }
        self.poll_transport();
        self.fifo.pop()
    }

    /// Poll the transport and take up to `buf.len()` buffered bytes.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.connected() {
            return 0;
        }
        self.poll_transport();
        let n = buf.len().min(self.fifo.len());
        if self.fifo.pop_into(&mut buf[..n]) { n } else { 0 }
    }

    /// The next buffered byte. Does not poll.
    pub fn peek(&self) -> Option<u8> {
        if !self.connected() {
            return None;
        }
        self.fifo.peek()
    }

    /// Nothing is buffered on the send side, so this does nothing.
    pub fn flush(&mut self) {}

    /// Disconnect the transport and discard buffered bytes.
    pub fn stop(&mut self) {
        if self.state != ConnectionState::Disconnected {
            info!("Closing WebSocket connection");
        }
        self.state = ConnectionState::Disconnected;
        self.fifo.clear();
        self.transport.disconnect();
    }

    /// Whether the connection is up.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn poll_transport(&mut self) {
        let state = &mut self.state;
        let fifo = &mut self.fifo;
        self.transport
            .poll(&mut |event| handle_event(state, fifo, event));
    }
}

fn handle_event(state: &mut ConnectionState, fifo: &mut RingBuffer, event: WsEvent<'_>) {
    match event {
        WsEvent::Connected => {
            debug!("Transport reported connected");
            fifo.clear();
            *state = ConnectionState::Connected;
        }
        WsEvent::Disconnected => {
            if *state != ConnectionState::Disconnected {
                info!(dropped = fifo.len(), "Transport reported disconnected");
            }
            fifo.clear();
            *state = ConnectionState::Disconnected;
        }
        WsEvent::Text(data) | WsEvent::Binary(data) => {
            if *state != ConnectionState::Connected {
                trace!(len = data.len(), "Ignoring frame outside a connection");
                return;
            }
            if !fifo.push_slice(data) {
                warn!(
                    len = data.len(),
                    buffered = fifo.len(),
                    capacity = fifo.capacity(),
                    "Inbound buffer full, dropping frame"
                );
            }
        }
    }
}

impl<T: WsTransport, P: WebSocketParams> ByteStream for WebSocketStream<T, P> {
    fn connect(&mut self) -> Result<(), StreamError> {
        WebSocketStream::connect(self)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        WebSocketStream::write(self, data)
    }

    fn available(&mut self) -> usize {
        WebSocketStream::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        WebSocketStream::read_byte(self)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        WebSocketStream::read(self, buf)
    }

    fn peek(&mut self) -> Option<u8> {
        WebSocketStream::peek(self)
    }

    fn stop(&mut self) {
        WebSocketStream::stop(self);
    }

    fn connected(&self) -> bool {
        WebSocketStream::connected(self)
    }
}

/// Non-blocking reads: `WouldBlock` when nothing is buffered, `NotConnected`
/// when the connection is down.
impl<T: WsTransport, P: WebSocketParams> io::Read for WebSocketStream<T, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.connected() {
            return Err(io::ErrorKind::NotConnected.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match WebSocketStream::read(self, buf) {
            0 if !self.connected() => Err(io::ErrorKind::NotConnected.into()),
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }
}

impl<T: WsTransport, P: WebSocketParams> io::Write for WebSocketStream<T, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.connected() {
            return Err(io::ErrorKind::NotConnected.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match WebSocketStream::write(self, buf) {
            0 => Err(io::ErrorKind::WriteZero.into()),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
