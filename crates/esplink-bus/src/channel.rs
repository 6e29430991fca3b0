//! Message-passing alternative to synchronous observers.
//!
//! A [`ChannelObserver`] hands packets to a bounded queue consumed on another
//! thread. When the consumer falls behind, packets are dropped rather than
//! stalling frame reassembly.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use esplink_frame::Packet;

use crate::bus::{Observer, Transmitter};

/// Create a bounded observer/receiver pair.
pub fn channel(capacity: usize) -> (ChannelObserver, Receiver<Packet>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (ChannelObserver { tx, dropped: 0 }, rx)
}

/// Observer that forwards packets into a bounded channel.
#[derive(Debug)]
pub struct ChannelObserver {
    tx: SyncSender<Packet>,
    dropped: u64,
}

impl Observer for ChannelObserver {
    fn on_packet(&mut self, packet: &Packet, _tx: &mut Transmitter) {
        match self.tx.try_send(packet.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(packet)) => {
                self.dropped += 1;
                tracing::warn!(%packet, dropped = self.dropped, "consumer lagging, packet dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("packet consumer gone");
            }
        }
    }
}
