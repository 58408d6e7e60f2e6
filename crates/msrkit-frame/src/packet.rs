use bytes::Bytes;
use msrkit_transport::{Report, REPORT_SIZE};

use crate::error::{FrameError, Result};
use crate::reader::PacketAssembler;

/// Control-byte flag marking the first packet of a message.
pub const START_FLAG: u8 = 0x80;

/// Control-byte flag marking the last packet of a message.
pub const END_FLAG: u8 = 0x40;

/// Control-byte mask for the valid payload length.
pub const LENGTH_MASK: u8 = 0x3F;

/// Maximum payload bytes carried by one packet.
pub const MAX_PAYLOAD: usize = REPORT_SIZE - 1;

/// One fixed-size transport packet.
///
/// Byte 0 is the control byte; bytes 1..=63 are payload, of which only the
/// first [`len`](Packet::len) are meaningful.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    bytes: Report,
}

impl Packet {
    /// Build a packet from flags and a payload chunk of at most 63 bytes.
    fn new(start: bool, end: bool, chunk: &[u8]) -> Self {
        debug_assert!(chunk.len() <= MAX_PAYLOAD);
        let mut bytes = [0u8; REPORT_SIZE];
        let mut control = chunk.len() as u8 & LENGTH_MASK;
        if start {
            control |= START_FLAG;
        }
        if end {
            control |= END_FLAG;
        }
        bytes[0] = control;
        bytes[1..=chunk.len()].copy_from_slice(chunk);
        Self { bytes }
    }

    /// Wrap a report received from the transport.
    pub fn from_report(bytes: Report) -> Self {
        Self { bytes }
    }

    /// The control byte.
    pub fn control(&self) -> u8 {
        self.bytes[0]
    }

    pub fn is_start(&self) -> bool {
        self.control() & START_FLAG != 0
    }

    pub fn is_end(&self) -> bool {
        self.control() & END_FLAG != 0
    }

    /// Declared payload length (0..=63).
    pub fn len(&self) -> usize {
        usize::from(self.control() & LENGTH_MASK)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The declared payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..=self.len()]
    }

    /// The full 64-byte report, as written to the transport.
    pub fn as_bytes(&self) -> &Report {
        &self.bytes
    }
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("start", &self.is_start())
            .field("end", &self.is_end())
            .field("payload", &self.payload())
            .finish()
    }
}

/// Split a message into transport packets.
///
/// Interior packets carry 63 bytes. An empty message still produces one
/// packet with both flags set and length zero.
pub fn segment(message: &[u8]) -> Vec<Packet> {
    if message.is_empty() {
        return vec![Packet::new(true, true, &[])];
    }

    let count = message.len().div_ceil(MAX_PAYLOAD);
    message
        .chunks(MAX_PAYLOAD)
        .enumerate()
        .map(|(i, chunk)| Packet::new(i == 0, i + 1 == count, chunk))
        .collect()
}

/// Concatenate the payloads of a complete packet sequence.
pub fn reassemble(packets: &[Packet]) -> Result<Bytes> {
    let (last, init) = packets.split_last().ok_or(FrameError::EmptySequence)?;

    let mut assembler = PacketAssembler::new();
    for (index, packet) in init.iter().enumerate() {
        if assembler.push(packet)?.is_some() {
            return Err(FrameError::MisplacedEnd { index });
        }
    }
    assembler.push(last)?.ok_or(FrameError::MissingEnd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn segment_reassemble_lengths() {
        for len in [0usize, 1, 63, 64, 126, 189] {
            let msg = message(len);
            let packets = segment(&msg);
            let back = reassemble(&packets).unwrap();
            assert_eq!(back.as_ref(), msg.as_slice(), "length {len}");
        }
    }

    #[test]
    fn packet_counts_and_flags() {
        assert_eq!(segment(&message(63)).len(), 1);
        assert_eq!(segment(&message(64)).len(), 2);
        assert_eq!(segment(&message(189)).len(), 3);

        let packets = segment(&message(100));
        assert_eq!(packets[0].control(), START_FLAG | 63);
        assert_eq!(packets[1].control(), END_FLAG | 37);
    }

    #[test]
    fn empty_message_is_single_packet() {
        let packets = segment(&[]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].control(), START_FLAG | END_FLAG);
        assert!(packets[0].is_empty());
    }

    #[test]
    fn reset_command_wire_bytes() {
        let packets = segment(&[0x1B, b'a']);
        assert_eq!(packets[0].as_bytes()[..3], [0xC2, 0x1B, b'a']);
        assert!(packets[0].as_bytes()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reassemble_empty_sequence_rejected() {
        assert!(matches!(reassemble(&[]), Err(FrameError::EmptySequence)));
    }

    #[test]
    fn reassemble_missing_start_rejected() {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = END_FLAG | 1;
        report[1] = b'x';
        let err = reassemble(&[Packet::from_report(report)]).unwrap_err();
        assert!(matches!(err, FrameError::MissingStart));
    }

    #[test]
    fn reassemble_misplaced_start_rejected() {
        let mut packets = segment(&message(100));
        let mut second = *packets[1].as_bytes();
        second[0] |= START_FLAG;
        packets[1] = Packet::from_report(second);

        let err = reassemble(&packets).unwrap_err();
        assert!(matches!(err, FrameError::MisplacedStart { index: 1 }));
    }

    #[test]
    fn reassemble_end_flag_checks() {
        let mut packets = segment(&message(130));
        let mut first = *packets[0].as_bytes();
        first[0] |= END_FLAG;
        packets[0] = Packet::from_report(first);
        assert!(matches!(
            reassemble(&packets),
            Err(FrameError::MisplacedEnd { index: 0 })
        ));

        let packets = segment(&message(100));
        assert!(matches!(
            reassemble(&packets[..1]),
            Err(FrameError::MissingEnd)
        ));
    }

    #[test]
    fn payload_ignores_bytes_past_declared_length() {
        let mut report = [0xEEu8; REPORT_SIZE];
        report[0] = START_FLAG | END_FLAG | 2;
        report[1] = b'o';
        report[2] = b'k';
        let packet = Packet::from_report(report);
        assert_eq!(packet.payload(), b"ok");
        assert_eq!(reassemble(&[packet]).unwrap().as_ref(), b"ok");
    }
}
