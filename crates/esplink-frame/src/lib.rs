//! Sync-byte packet framing for a serial gateway.
//!
//! Every packet travels as:
//! - a `0x55` sync byte
//! - a 4-byte header (16-bit data length, 8-bit optional length, type)
//!   followed by its CRC-8
//! - data, optional data, and a CRC-8 over both
//!
//! [`StreamDecoder`] reassembles packets from arbitrarily chunked input and
//! resynchronizes after corruption. [`Packet`] also has a dotted hex text
//! form for naming packets outside the binary channel.

pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod decoder;
pub mod error;
pub mod packet;
pub mod reader;
mod text;
pub mod writer;

pub use checksum::checksum;
#[cfg(feature = "async")]
pub use codec::PacketCodec;
pub use decoder::{DecoderConfig, DecoderStats, StreamDecoder, DEFAULT_MAX_BUFFERED};
pub use error::{FrameError, Result, TextError};
pub use packet::{
    Packet, HEADER_SIZE, MAX_DATA_LEN, MAX_OPTIONAL_LEN, MIN_FRAME_SIZE, SYNC_BYTE,
};
pub use reader::{PacketReader, DEFAULT_READ_CHUNK_SIZE};
pub use writer::PacketWriter;
