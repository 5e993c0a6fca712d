//! Playback buffer for downstream audio.
//!
//! Owned by the receive loop alone, so no locking. Appends accumulate until
//! the target size is reached or the turn completes, and the whole buffer is
//! taken at once.

use bytes::{Bytes, BytesMut};

/// About one second of 24kHz 16-bit mono audio.
pub const DEFAULT_PLAYBACK_TARGET_BYTES: usize = 48_000;

#[derive(Debug)]
pub struct PlaybackBuffer {
    buf: BytesMut,
    target: usize,
}

impl PlaybackBuffer {
    pub fn new(target: usize) -> Self {
        let target = target.max(1);
        Self {
            buf: BytesMut::with_capacity(target),
            target,
        }
    }

    pub fn append(&mut self, pcm: &[u8]) {
        self.buf.extend_from_slice(pcm);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Whether the buffer has reached its flush threshold.
    pub fn should_flush(&self) -> bool {
        self.buf.len() >= self.target
    }

    /// Take the whole buffer, leaving it empty.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Drop buffered audio unread. Returns the number of bytes dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        dropped
    }
}

impl Default for PlaybackBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYBACK_TARGET_BYTES)
    }
}
