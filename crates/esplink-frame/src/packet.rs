use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::checksum;
use crate::error::{FrameError, Result};

/// Start-of-frame marker.
pub const SYNC_BYTE: u8 = 0x55;

/// Sync (1) + data length (2) + optional length (1) + type (1) + header CRC (1).
pub const HEADER_SIZE: usize = 6;

/// Smallest possible frame: header plus the trailing payload CRC.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 1;

/// Largest `data` length the 16-bit length field can carry.
pub const MAX_DATA_LEN: usize = u16::MAX as usize;

/// Largest `optional_data` length the 8-bit length field can carry.
pub const MAX_OPTIONAL_LEN: usize = u8::MAX as usize;

/// A protocol packet.
///
/// Immutable once built. Decoded packets share the frame buffer they were
/// sliced from, so cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    packet_type: u8,
    data: Bytes,
    optional_data: Bytes,
}

impl Packet {
    /// Create a packet from explicit fields.
    ///
    /// Field widths are checked at [`Packet::encode`] time, not here.
    pub fn new(packet_type: u8, data: impl Into<Bytes>, optional_data: impl Into<Bytes>) -> Self {
        Self {
            packet_type,
            data: data.into(),
            optional_data: optional_data.into(),
        }
    }

    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn optional_data(&self) -> &Bytes {
        &self.optional_data
    }

    /// The total wire size of this packet once framed.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.data.len() + self.optional_data.len()
    }

    /// Encode this packet into the wire format.
    ///
    /// Wire format (lengths big-endian):
    /// ```text
    /// ┌──────┬──────────┬─────────┬──────┬────────┬──────┬──────────┬────────┐
    /// │ 0x55 │ Data len │ Opt len │ Type │ CRC8   │ Data │ Opt data │ CRC8   │
    /// │      │ (2B BE)  │ (1B)    │ (1B) │ header │      │          │ payload│
    /// └──────┴──────────┴─────────┴──────┴────────┴──────┴──────────┴────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.data.len() > MAX_DATA_LEN {
            return Err(FrameError::DataTooLong {
                len: self.data.len(),
                max: MAX_DATA_LEN,
            });
        }
        if self.optional_data.len() > MAX_OPTIONAL_LEN {
            return Err(FrameError::OptionalDataTooLong {
                len: self.optional_data.len(),
                max: MAX_OPTIONAL_LEN,
            });
        }

        let data_len = self.data.len() as u16;
        let header = [
            (data_len >> 8) as u8,
            data_len as u8,
            self.optional_data.len() as u8,
            self.packet_type,
        ];

        dst.reserve(self.wire_size());
        dst.put_u8(SYNC_BYTE);
        dst.put_slice(&header);
        dst.put_u8(checksum(&header));

        let payload_start = dst.len();
        dst.put_slice(&self.data);
        dst.put_slice(&self.optional_data);
        let payload_crc = checksum(&dst[payload_start..]);
        dst.put_u8(payload_crc);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode one complete frame.
    ///
    /// The caller has already validated both checksums; they are not
    /// re-checked. Data fields are zero-copy slices of `frame`.
    pub fn decode(frame: Bytes) -> Result<Self> {
        if frame.len() < MIN_FRAME_SIZE {
            return Err(FrameError::Truncated {
                needed: MIN_FRAME_SIZE,
                available: frame.len(),
            });
        }

        let data_len = usize::from(u16::from_be_bytes([frame[1], frame[2]]));
        let optional_len = usize::from(frame[3]);
        let packet_type = frame[4];

        let needed = MIN_FRAME_SIZE + data_len + optional_len;
        if frame.len() < needed {
            return Err(FrameError::Truncated {
                needed,
                available: frame.len(),
            });
        }

        let data_end = HEADER_SIZE + data_len;
        Ok(Self {
            packet_type,
            data: frame.slice(HEADER_SIZE..data_end),
            optional_data: frame.slice(data_end..data_end + optional_len),
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet(0x{:02X}, ", self.packet_type)?;
        write_hex_list(f, &self.data)?;
        f.write_str(", ")?;
        write_hex_list(f, &self.optional_data)?;
        f.write_str(")")
    }
}

fn write_hex_list(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("[")?;
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "0x{byte:02X}")?;
    }
    f.write_str("]")
}
