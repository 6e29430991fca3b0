//! Packet fan-out and transmit path.
//!
//! A [`PacketBus`] is an explicit instance owned by whatever composes the
//! system, usually a [`Gateway`]. Observers run synchronously in
//! registration order; [`channel`] offers a bounded queue for consumers that
//! may be slow.

pub mod bus;
pub mod channel;
pub mod error;
pub mod gateway;
pub mod history;

pub use bus::{Observer, PacketBus, Transmitter};
pub use channel::{channel, ChannelObserver};
pub use error::{BusError, Result};
pub use gateway::Gateway;
pub use history::{PacketHistory, DEFAULT_HISTORY};
