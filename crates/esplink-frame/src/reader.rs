use std::io::{ErrorKind, Read};

use crate::decoder::{DecoderConfig, DecoderStats, StreamDecoder};
use crate::error::{FrameError, Result};
use crate::packet::Packet;

/// Default number of bytes requested per `read` call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256;

/// Reads complete packets from any `Read` byte source.
///
/// Handles partial reads and line noise internally; callers always get
/// checksum-validated packets.
pub struct PacketReader<T> {
    inner: T,
    decoder: StreamDecoder,
    chunk: Vec<u8>,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new packet reader with explicit decoder configuration.
    pub fn with_config(inner: T, config: DecoderConfig) -> Self {
        Self {
            inner,
            decoder: StreamDecoder::with_config(config),
            chunk: vec![0u8; DEFAULT_READ_CHUNK_SIZE],
        }
    }

    /// Set how many bytes each `read` call asks for (at least 1).
    pub fn set_read_chunk_size(&mut self, size: usize) {
        self.chunk.resize(size.max(1), 0);
    }

    pub fn read_chunk_size(&self) -> usize {
        self.chunk.len()
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached. A
    /// partially received frame at EOF is dropped.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.decoder.next_packet() {
                return Ok(packet);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.decoder.push(&self.chunk[..read]);
        }
    }

    /// Link-health counters of the underlying decoder.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Bytes of an incomplete frame still held by the decoder.
    pub fn buffered(&self) -> &[u8] {
        self.decoder.buffered()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Packet>;

    /// Yields packets until EOF.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
