//! Fixed-capacity circular byte buffer.
//!
//! The buffer sits between the transport's event callback (producer) and the
//! protocol layer's reads (consumer). Both run on the same thread, interleaved
//! within one poll, so no locking is involved.
//!
//! Full and empty are ordinary conditions on a live connection and are
//! reported through return values only: a push that does not fit is dropped
//! whole, a pop that cannot be satisfied changes nothing.

use tracing::debug;

/// Circular byte store with a capacity fixed at (re)initialization.
///
/// At most `capacity - 1` bytes are ever held: a write that would bring the
/// size to `capacity` or beyond is rejected.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer {
    data: Vec<u8>,
    size: usize,
    begin: usize,
    end: usize,
}

impl RingBuffer {
    /// Allocate a buffer of exactly `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut buffer = Self::default();
        buffer.init(capacity);
        buffer
    }

    /// Release the current storage and allocate `capacity` fresh bytes, empty.
    pub fn init(&mut self, capacity: usize) {
        self.data = vec![0; capacity];
        self.clear();
    }

    /// Forget all buffered bytes, keeping the storage.
    pub fn clear(&mut self) {
        self.size = 0;
        self.begin = 0;
        self.end = 0;
    }

    /// Size of the backing storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The next byte, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        if self.size == 0 {
            return None;
        }
        Some(self.data[self.begin])
    }

    /// Append one byte. Returns `false` (and drops it) when the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.push_slice(&[byte])
    }

    /// Append `bytes` as a whole, or not at all.
    ///
    /// Returns `false` without touching the buffer when `bytes` does not fit.
    pub fn push_slice(&mut self, bytes: &[u8]) -> bool {
        let len = bytes.len();
        let capacity = self.capacity();
        if self.size + len >= capacity {
            debug!(len, size = self.size, capacity, "ring buffer full, dropping write");
            return false;
        }
        if len == 0 {
            return true;
        }

        // Split the copy at the physical end of the storage.
        let first = len.min(capacity - self.end);
        self.data[self.end..self.end + first].copy_from_slice(&bytes[..first]);
        self.data[..len - first].copy_from_slice(&bytes[first..]);

        self.end = (self.end + len) % capacity;
        self.size += len;
        true
    }

    /// Remove and return the next byte, or `None` when empty.
    pub fn pop(&mut self) -> Option<u8> {
        if self.size == 0 {
            debug!("ring buffer empty");
            return None;
        }
        let byte = self.data[self.begin];
        self.begin = (self.begin + 1) % self.capacity();
        self.size -= 1;
        Some(byte)
    }

    /// Fill `buf` completely from the front of the buffer.
    ///
    /// Returns `false` without touching the buffer when fewer than
    /// `buf.len()` bytes are buffered.
    pub fn pop_into(&mut self, buf: &mut [u8]) -> bool {
        let len = buf.len();
        if len > self.size {
            debug!(len, size = self.size, "ring buffer holds too few bytes");
            return false;
        }
        if len == 0 {
            return true;
        }

        let capacity = self.capacity();
        let first = len.min(capacity - self.begin);
        buf[..first].copy_from_slice(&self.data[self.begin..self.begin + first]);
        buf[first..].copy_from_slice(&self.data[..len - first]);

        self.begin = (self.begin + len) % capacity;
        self.size -= len;
        true
    }
}
