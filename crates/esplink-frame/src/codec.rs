//! `tokio_util` codec over [`StreamDecoder`], for async byte sources.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::decoder::{DecoderConfig, DecoderStats, StreamDecoder};
use crate::error::{FrameError, Result};
use crate::packet::Packet;

/// Frames an async byte stream into [`Packet`]s.
///
/// Every byte handed to `decode` moves into the inner decoder, so resync and
/// the overflow watermark behave exactly as with [`StreamDecoder::feed`].
#[derive(Debug, Default)]
pub struct PacketCodec {
    decoder: StreamDecoder,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            decoder: StreamDecoder::with_config(config),
        }
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if !src.is_empty() {
            self.decoder.push(&src[..]);
            src.clear();
        }
        Ok(self.decoder.next_packet())
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        item.encode(dst)
    }
}

impl<'a> Encoder<&'a Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a Packet, dst: &mut BytesMut) -> Result<()> {
        item.encode(dst)
    }
}
