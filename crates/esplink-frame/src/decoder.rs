use bytes::{Buf, BytesMut};

use crate::checksum::checksum;
use crate::packet::{Packet, HEADER_SIZE, MIN_FRAME_SIZE, SYNC_BYTE};

/// Default reassembly watermark: anything above this after a pass is flushed.
pub const DEFAULT_MAX_BUFFERED: usize = 100;

/// Configuration for the stream decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Bytes left buffered after a pass above which the whole buffer is
    /// discarded. Default: 100.
    pub max_buffered: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
        }
    }
}

/// Link-health counters accumulated by a [`StreamDecoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Packets decoded and emitted.
    pub packets: u64,
    /// Bytes skipped while seeking a sync byte.
    pub unexpected_bytes: u64,
    /// Sync bytes dropped because the header checksum did not match.
    pub header_errors: u64,
    /// Complete frames dropped because the payload checksum did not match.
    pub payload_errors: u64,
    /// Times the buffer exceeded the watermark and was flushed.
    pub overflows: u64,
}

enum Step {
    Packet(Packet),
    Retry,
    NeedMore,
}

/// Reassembles packets from an arbitrarily chunked byte stream.
///
/// After every call the buffer is either empty or starts with a sync byte
/// and holds less than one complete frame.
#[derive(Debug)]
pub struct StreamDecoder {
    buf: BytesMut,
    config: DecoderConfig,
    stats: DecoderStats,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            buf: BytesMut::new(),
            config,
            stats: DecoderStats::default(),
        }
    }

    /// Feed a chunk and return every packet it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Packet> {
        let mut packets = Vec::new();
        self.feed_with(chunk, |packet| packets.push(packet));
        packets
    }

    /// Feed a chunk and hand each completed packet to `on_packet`.
    pub fn feed_with(&mut self, chunk: &[u8], mut on_packet: impl FnMut(Packet)) {
        self.push(chunk);
        while let Some(packet) = self.next_packet() {
            on_packet(packet);
        }
    }

    /// Append bytes without processing them.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pull the next complete packet out of the buffer.
    ///
    /// Returns `None` once the buffer settles without a complete frame; the
    /// overflow watermark is enforced at that point.
    pub fn next_packet(&mut self) -> Option<Packet> {
        loop {
            match self.step() {
                Step::Packet(packet) => return Some(packet),
                Step::Retry => continue,
                Step::NeedMore => {
                    self.enforce_watermark();
                    return None;
                }
            }
        }
    }

    /// Bytes currently held in the reassembly buffer.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Drop any partially buffered frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn step(&mut self) -> Step {
        self.skip_to_sync();

        if self.buf.len() < MIN_FRAME_SIZE {
            return Step::NeedMore;
        }

        let data_len = usize::from(u16::from_be_bytes([self.buf[1], self.buf[2]]));
        let optional_len = usize::from(self.buf[3]);
        let header_crc = checksum(&self.buf[1..5]);
        if header_crc != self.buf[5] {
            tracing::info!(
                expected = self.buf[5],
                actual = header_crc,
                "bad header checksum"
            );
            self.stats.header_errors += 1;
            // Slip a single byte: the sync may have been a 0x55 inside data.
            self.buf.advance(1);
            return Step::Retry;
        }

        let total_len = HEADER_SIZE + data_len + optional_len + 1;
        if self.buf.len() < total_len {
            return Step::NeedMore;
        }

        let frame = self.buf.split_to(total_len).freeze();
        let payload_crc = checksum(&frame[HEADER_SIZE..total_len - 1]);
        if payload_crc != frame[total_len - 1] {
            tracing::info!(
                expected = frame[total_len - 1],
                actual = payload_crc,
                len = total_len,
                "bad payload checksum"
            );
            self.stats.payload_errors += 1;
            return Step::Retry;
        }

        match Packet::decode(frame) {
            Ok(packet) => {
                self.stats.packets += 1;
                tracing::debug!(
                    packet_type = packet.packet_type(),
                    data_len,
                    optional_len,
                    "decoded packet"
                );
                Step::Packet(packet)
            }
            Err(err) => {
                // Unreachable given the length check above.
                tracing::warn!(error = %err, "validated frame failed to decode");
                Step::Retry
            }
        }
    }

    fn skip_to_sync(&mut self) {
        let skip = self
            .buf
            .iter()
            .position(|&b| b == SYNC_BYTE)
            .unwrap_or(self.buf.len());
        for &byte in &self.buf[..skip] {
            tracing::debug!(byte, "unexpected byte");
        }
        self.stats.unexpected_bytes += skip as u64;
        self.buf.advance(skip);
    }

    fn enforce_watermark(&mut self) {
        if self.buf.len() > self.config.max_buffered {
            tracing::warn!(
                buffered = self.buf.len(),
                max = self.config.max_buffered,
                "reassembly buffer overflow, flushing"
            );
            self.stats.overflows += 1;
            self.buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn frame(packet: &Packet) -> Vec<u8> {
        packet.to_bytes().unwrap().to_vec()
    }

    fn sample() -> Packet {
        Packet::new(0x01, vec![0xF6, 0x30, 0x00], vec![0x01, 0xFF])
    }

    #[test]
    fn decodes_whole_frame() {
        let mut decoder = StreamDecoder::new();
        let packets = decoder.feed(&frame(&sample()));

        assert_eq!(packets, vec![sample()]);
        assert!(decoder.buffered().is_empty());
        assert_eq!(decoder.stats().packets, 1);
    }

    #[test]
    fn resyncs_over_leading_noise() {
        let mut wire = vec![0x01, 0x02];
        wire.extend(frame(&sample()));

        let mut decoder = StreamDecoder::new();
        let packets = decoder.feed(&wire);

        assert_eq!(packets, vec![sample()]);
        assert_eq!(decoder.stats().unexpected_bytes, 2);
        assert!(decoder.buffered().is_empty());
    }

    #[test]
    fn bad_header_checksum_slips_one_byte() {
        let mut wire = frame(&sample());
        wire[5] ^= 0xFF;

        let mut decoder = StreamDecoder::new();
        let packets = decoder.feed(&wire);

        assert!(packets.is_empty());
        assert_eq!(decoder.stats().header_errors, 1);
        // Only the sync byte was slipped; the rest was discarded as noise.
        assert_eq!(decoder.stats().unexpected_bytes, wire.len() as u64 - 1);
        assert!(decoder.buffered().is_empty());
    }

    #[test]
    fn bad_header_checksum_discards_only_sync_byte() {
        // Header corruption with a trailing sync byte: after the slip the
        // decoder seeks to the next 0x55 and waits there.
        let mut wire = frame(&sample());
        wire[5] ^= 0xFF;
        wire.truncate(7);
        wire.push(SYNC_BYTE);

        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(&wire).is_empty());
        assert_eq!(decoder.stats().header_errors, 1);
        assert_eq!(decoder.buffered(), &[SYNC_BYTE]);
    }

    #[test]
    fn spurious_sync_inside_noise_recovers_next_frame() {
        let mut wire = vec![SYNC_BYTE, 0x00, 0x01, 0x02, 0x03, 0x04];
        wire.extend(frame(&sample()));

        let mut decoder = StreamDecoder::new();
        let packets = decoder.feed(&wire);

        assert_eq!(packets, vec![sample()]);
        assert_eq!(decoder.stats().header_errors, 1);
    }

    #[test]
    fn bad_payload_checksum_consumes_frame() {
        let mut wire = frame(&sample());
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let mut decoder = StreamDecoder::new();
        let packets = decoder.feed(&wire);

        assert!(packets.is_empty());
        assert!(decoder.buffered().is_empty());
        assert_eq!(decoder.stats().payload_errors, 1);
    }

    #[test]
    fn bad_payload_then_good_frame() {
        let mut wire = frame(&sample());
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let second = Packet::new(0x05, vec![0x08], Bytes::new());
        wire.extend(frame(&second));

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&wire), vec![second]);
    }

    #[test]
    fn chunked_delivery_at_every_offset() {
        let wire = frame(&sample());
        for split in 1..wire.len() {
            let mut decoder = StreamDecoder::new();
            assert!(decoder.feed(&wire[..split]).is_empty(), "split {split}");
            assert_eq!(decoder.feed(&wire[split..]), vec![sample()], "split {split}");
            assert!(decoder.buffered().is_empty());
        }
    }

    #[test]
    fn byte_by_byte_delivery() {
        let wire = frame(&sample());
        let mut decoder = StreamDecoder::new();
        let mut packets = Vec::new();
        for byte in wire {
            packets.extend(decoder.feed(&[byte]));
        }
        assert_eq!(packets, vec![sample()]);
    }

    #[test]
    fn partial_frame_is_retained_from_sync() {
        let wire = frame(&sample());
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[0xAA, 0xBB]);
        decoder.feed(&wire[..4]);
        assert_eq!(decoder.buffered(), &wire[..4]);
    }

    #[test]
    fn multi_frame_batch_in_order() {
        let first = sample();
        let second = Packet::new(0x02, vec![0x00], Bytes::new());
        let mut wire = frame(&first);
        wire.extend(frame(&second));

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&wire), vec![first, second]);
        assert_eq!(decoder.stats().packets, 2);
    }

    #[test]
    fn feed_with_callback_sees_every_packet() {
        let mut wire = frame(&sample());
        wire.extend(frame(&sample()));

        let mut decoder = StreamDecoder::new();
        let mut seen = 0;
        decoder.feed_with(&wire, |packet| {
            assert_eq!(packet, sample());
            seen += 1;
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn overflow_of_non_sync_bytes_empties_buffer() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(&[0x00; 101]).is_empty());
        assert!(decoder.buffered().is_empty());
    }

    #[test]
    fn overflow_flushes_long_incomplete_frame() {
        let big = Packet::new(0x01, vec![0xAB; 200], Bytes::new());
        let wire = frame(&big);

        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(&wire[..150]).is_empty());
        assert!(decoder.buffered().is_empty());
        assert_eq!(decoder.stats().overflows, 1);
    }

    #[test]
    fn large_frame_in_one_chunk_is_decoded() {
        let big = Packet::new(0x01, vec![0xAB; 200], Bytes::new());
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&frame(&big)), vec![big]);
    }

    #[test]
    fn custom_watermark() {
        let big = Packet::new(0x01, vec![0xAB; 200], Bytes::new());
        let wire = frame(&big);

        let mut decoder = StreamDecoder::with_config(DecoderConfig { max_buffered: 1024 });
        assert!(decoder.feed(&wire[..150]).is_empty());
        assert_eq!(decoder.buffered().len(), 150);
        assert_eq!(decoder.feed(&wire[150..]), vec![big]);
    }

    #[test]
    fn clear_drops_partial_frame() {
        let wire = frame(&sample());
        let mut decoder = StreamDecoder::new();
        decoder.feed(&wire[..5]);
        decoder.clear();
        assert!(decoder.buffered().is_empty());
        assert!(decoder.feed(&wire[5..]).is_empty());
    }
}
