use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use esplink_frame::Packet;

use crate::bus::{Observer, Transmitter};

/// Number of packets kept by [`PacketHistory::default`].
pub const DEFAULT_HISTORY: usize = 10;

/// Keeps the most recent packets seen on a bus, newest first.
///
/// Clones share the same storage: register one clone on the bus and read
/// snapshots from another.
#[derive(Debug, Clone)]
pub struct PacketHistory {
    inner: Arc<Mutex<VecDeque<Packet>>>,
    capacity: usize,
}

impl Default for PacketHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl PacketHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record a packet, evicting the oldest once full.
    pub fn record(&self, packet: Packet) {
        if self.capacity == 0 {
            return;
        }
        let mut packets = self.lock();
        packets.push_front(packet);
        packets.truncate(self.capacity);
    }

    /// Copy of the retained packets, newest first.
    pub fn snapshot(&self) -> Vec<Packet> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Packet>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Observer for PacketHistory {
    fn on_packet(&mut self, packet: &Packet, _tx: &mut Transmitter) {
        self.record(packet.clone());
    }
}
