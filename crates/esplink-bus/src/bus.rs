use std::io::Write;

use esplink_frame::{Packet, PacketWriter};

use crate::error::Result;

type Sink = Box<dyn Write + Send>;

/// Receives every packet dispatched on a [`PacketBus`].
///
/// Called synchronously on the dispatching thread, so implementations must
/// not block. The [`Transmitter`] lets an observer send packets of its own
/// while the dispatch is running.
pub trait Observer: Send {
    fn on_packet(&mut self, packet: &Packet, tx: &mut Transmitter);
}

impl<F> Observer for F
where
    F: FnMut(&Packet) + Send,
{
    fn on_packet(&mut self, packet: &Packet, _tx: &mut Transmitter) {
        self(packet)
    }
}

/// The outbound half of the bus.
#[derive(Default)]
pub struct Transmitter {
    writer: Option<PacketWriter<Sink>>,
}

impl Transmitter {
    /// Encode `packet` and write it to the sink.
    ///
    /// Returns `Ok(false)` without writing when no sink is attached. Field
    /// width violations are reported either way.
    pub fn send(&mut self, packet: &Packet) -> Result<bool> {
        match &mut self.writer {
            Some(writer) => {
                writer.send(packet)?;
                Ok(true)
            }
            None => {
                packet.to_bytes()?;
                tracing::debug!(%packet, "tx skipped, no sink attached");
                Ok(false)
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.writer.is_some()
    }
}

/// Ordered fan-out of decoded packets plus the outbound transmit path.
#[derive(Default)]
pub struct PacketBus {
    observers: Vec<Box<dyn Observer>>,
    tx: Transmitter,
}

impl PacketBus {
    /// Create a bus with no observers and no sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. Registration order is dispatch order.
    pub fn register<O: Observer + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Register a plain closure.
    pub fn register_fn<F>(&mut self, observer: F)
    where
        F: FnMut(&Packet) + Send + 'static,
    {
        self.register(observer);
    }

    /// Deliver `packet` to every observer, in registration order.
    pub fn dispatch(&mut self, packet: &Packet) {
        tracing::debug!(%packet, observers = self.observers.len(), "rx");
        for observer in &mut self.observers {
            observer.on_packet(packet, &mut self.tx);
        }
    }

    /// Encode and transmit `packet`. See [`Transmitter::send`].
    pub fn send(&mut self, packet: &Packet) -> Result<bool> {
        self.tx.send(packet)
    }

    /// Attach the outbound byte sink, replacing any previous one.
    pub fn attach<W: Write + Send + 'static>(&mut self, sink: W) {
        self.tx.writer = Some(PacketWriter::new(Box::new(sink)));
    }

    /// Detach and return the outbound sink.
    pub fn detach(&mut self) -> Option<Box<dyn Write + Send>> {
        self.tx.writer.take().map(PacketWriter::into_inner)
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_attached()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for PacketBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketBus")
            .field("observers", &self.observers.len())
            .field("attached", &self.is_attached())
            .finish()
    }
}
