//! Gateway between a device speaking a sync-framed serial protocol and code
//! that observes and injects its packets.
//!
//! # Crate Structure
//!
//! - [`frame`]: Checksums, packet codec (binary and text), stream decoder
//! - [`bus`]: Observer fan-out, transmit path, and the decoder/bus gateway

/// Re-export frame types.
pub mod frame {
    pub use esplink_frame::*;
}

/// Re-export bus types.
pub mod bus {
    pub use esplink_bus::*;
}
