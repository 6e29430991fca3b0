/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The data field does not fit the 16-bit length field.
    #[error("data too long ({len} bytes, max {max})")]
    DataTooLong { len: usize, max: usize },

    /// The optional data field does not fit the 8-bit length field.
    #[error("optional data too long ({len} bytes, max {max})")]
    OptionalDataTooLong { len: usize, max: usize },

    /// The frame is shorter than its header declares.
    #[error("truncated frame (need {needed} bytes, have {available})")]
    Truncated { needed: usize, available: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Errors produced when parsing the dotted hex text form of a packet.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The text did not split into exactly three dot-separated fields.
    #[error("expected 3 dot-separated fields, found {0}")]
    FieldCount(usize),

    /// A field was not valid hex (odd length or non-hex digit).
    #[error("invalid hex in {field} field: {source}")]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },

    /// The packet type field did not decode to exactly one byte.
    #[error("packet type must be exactly 1 byte, found {0}")]
    PacketTypeLength(usize),
}

pub type Result<T> = std::result::Result<T, FrameError>;
