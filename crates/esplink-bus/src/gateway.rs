use std::io::{ErrorKind, Read, Write};

use esplink_frame::{DecoderConfig, DecoderStats, Packet, StreamDecoder};

use crate::bus::PacketBus;
use crate::error::{BusError, Result};

/// Composes one [`StreamDecoder`] with one [`PacketBus`].
///
/// Inbound chunks are reassembled and every validated packet is dispatched
/// before `receive` returns.
#[derive(Debug, Default)]
pub struct Gateway {
    decoder: StreamDecoder,
    bus: PacketBus,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder_config(config: DecoderConfig) -> Self {
        Self::from_parts(StreamDecoder::with_config(config), PacketBus::new())
    }

    pub fn from_parts(decoder: StreamDecoder, bus: PacketBus) -> Self {
        Self { decoder, bus }
    }

    /// Feed one inbound chunk. Returns the number of packets dispatched.
    pub fn receive(&mut self, chunk: &[u8]) -> usize {
        let bus = &mut self.bus;
        let mut dispatched = 0usize;
        self.decoder.feed_with(chunk, |packet| {
            bus.dispatch(&packet);
            dispatched += 1;
        });
        dispatched
    }

    /// Read one chunk from `source` into `buf` and feed it.
    ///
    /// Returns `Ok(None)` at end of stream, otherwise the number of packets
    /// dispatched from that chunk.
    pub fn pump<R: Read>(&mut self, source: &mut R, buf: &mut [u8]) -> Result<Option<usize>> {
        loop {
            match source.read(buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(self.receive(&buf[..n]))),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(BusError::Io(err)),
            }
        }
    }

    /// Transmit through the bus.
    pub fn send(&mut self, packet: &Packet) -> Result<bool> {
        self.bus.send(packet)
    }

    /// Attach the outbound sink.
    pub fn attach<W: Write + Send + 'static>(&mut self, sink: W) {
        self.bus.attach(sink);
    }

    pub fn bus(&self) -> &PacketBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut PacketBus {
        &mut self.bus
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn buffered(&self) -> &[u8] {
        self.decoder.buffered()
    }
}
