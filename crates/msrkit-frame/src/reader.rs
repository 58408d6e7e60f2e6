use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::packet::{Packet, MAX_PAYLOAD};

const INITIAL_BUFFER_CAPACITY: usize = 4 * MAX_PAYLOAD;

/// Incremental message reassembly, one packet at a time.
///
/// The session feeds each packet as it arrives and learns from the return
/// value whether the message is complete. Flag violations are reported on
/// the packet that commits them.
#[derive(Debug)]
pub struct PacketAssembler {
    buf: BytesMut,
    packets: usize,
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            packets: 0,
        }
    }

    /// Accept the next packet.
    ///
    /// Returns `Ok(Some(message))` once an end-flagged packet completes the
    /// message, after which the assembler is ready for the next message.
    pub fn push(&mut self, packet: &Packet) -> Result<Option<Bytes>> {
        let index = self.packets;
        match (index == 0, packet.is_start()) {
            (true, false) => return Err(FrameError::MissingStart),
            (false, true) => return Err(FrameError::MisplacedStart { index }),
            _ => {}
        }

        trace!(index, control = packet.control(), payload = ?packet.payload(), "packet in");
        self.buf.extend_from_slice(packet.payload());
        self.packets += 1;

        if packet.is_end() {
            self.packets = 0;
            return Ok(Some(self.buf.split().freeze()));
        }
        Ok(None)
    }

    /// Number of packets accepted for the message in progress.
    pub fn packets(&self) -> usize {
        self.packets
    }

    /// Whether no message is in progress.
    pub fn is_idle(&self) -> bool {
        self.packets == 0
    }

    /// Drop any partially assembled message.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.packets = 0;
    }
}

impl Default for PacketAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::segment;

    #[test]
    fn single_packet_message() {
        let mut assembler = PacketAssembler::new();
        let packets = segment(b"\x1b0");
        let msg = assembler.push(&packets[0]).unwrap().unwrap();
        assert_eq!(msg.as_ref(), b"\x1b0");
        assert!(assembler.is_idle());
    }

    #[test]
    fn multi_packet_message() {
        let payload: Vec<u8> = (0..150u8).collect();
        let packets = segment(&payload);
        let mut assembler = PacketAssembler::new();

        assert!(assembler.push(&packets[0]).unwrap().is_none());
        assert!(assembler.push(&packets[1]).unwrap().is_none());
        assert_eq!(assembler.packets(), 2);
        let msg = assembler.push(&packets[2]).unwrap().unwrap();
        assert_eq!(msg.as_ref(), payload.as_slice());
    }

    #[test]
    fn back_to_back_messages() {
        let mut assembler = PacketAssembler::new();
        let first = segment(b"one");
        let second = segment(b"two");
        assert_eq!(assembler.push(&first[0]).unwrap().unwrap().as_ref(), b"one");
        assert_eq!(assembler.push(&second[0]).unwrap().unwrap().as_ref(), b"two");
    }

    #[test]
    fn continuation_without_start_rejected() {
        let payload = vec![7u8; 100];
        let packets = segment(&payload);
        let mut assembler = PacketAssembler::new();
        let err = assembler.push(&packets[1]).unwrap_err();
        assert!(matches!(err, FrameError::MissingStart));
    }

    #[test]
    fn second_start_rejected() {
        let packets = segment(&[1u8; 100]);
        let mut assembler = PacketAssembler::new();
        assembler.push(&packets[0]).unwrap();
        let err = assembler.push(&packets[0]).unwrap_err();
        assert!(matches!(err, FrameError::MisplacedStart { index: 1 }));

        assembler.clear();
        assert!(assembler.is_idle());
    }
}
