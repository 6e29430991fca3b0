//! Dotted hex text form of a packet: `<type>.<data>.<optional_data>`.
//!
//! Used wherever a packet must be named as a string, e.g. a replay link or
//! a command line argument.

use std::str::FromStr;

use crate::error::TextError;
use crate::packet::Packet;

impl Packet {
    /// Render as lowercase dotted hex, e.g. `05.08.` for type 5, data `[8]`.
    pub fn to_text(&self) -> String {
        format!(
            "{}.{}.{}",
            hex::encode([self.packet_type()]),
            hex::encode(self.data()),
            hex::encode(self.optional_data())
        )
    }

    /// Parse the dotted hex form produced by [`Packet::to_text`].
    pub fn from_text(s: &str) -> Result<Self, TextError> {
        let fields: Vec<&str> = s.split('.').collect();
        let [packet_type, data, optional_data] = fields.as_slice() else {
            return Err(TextError::FieldCount(fields.len()));
        };

        let packet_type = decode_field("packet type", packet_type)?;
        let data = decode_field("data", data)?;
        let optional_data = decode_field("optional data", optional_data)?;

        let [packet_type] = packet_type.as_slice() else {
            return Err(TextError::PacketTypeLength(packet_type.len()));
        };

        Ok(Packet::new(*packet_type, data, optional_data))
    }
}

impl FromStr for Packet {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Packet::from_text(s)
    }
}

fn decode_field(field: &'static str, text: &str) -> Result<Vec<u8>, TextError> {
    hex::decode(text).map_err(|source| TextError::InvalidHex { field, source })
}
