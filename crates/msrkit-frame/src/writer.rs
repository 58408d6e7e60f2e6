use msrkit_transport::Transport;
use tracing::{debug, trace};

use crate::error::Result;
use crate::packet::segment;

/// Writes complete messages to a [`Transport`] as packet sequences.
pub struct PacketWriter<T> {
    inner: T,
}

impl<T: Transport> PacketWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Segment `message` and write every packet in order (blocking).
    ///
    /// The first failed write aborts the send; packets already written are
    /// not retracted. Returns the number of packets written.
    pub fn send(&mut self, message: &[u8]) -> Result<usize> {
        let packets = segment(message);
        for (index, packet) in packets.iter().enumerate() {
            trace!(index, bytes = ?packet.as_bytes(), "packet out");
            self.inner.write(packet.as_bytes())?;
        }
        debug!(len = message.len(), packets = packets.len(), "message sent");
        Ok(packets.len())
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
