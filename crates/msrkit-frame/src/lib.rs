//! Wire framing for MSR605-family card writers.
//!
//! Three layers live here, bottom to top:
//! - 64-byte transport packets: a control byte (start flag, end flag, 6-bit
//!   length) followed by up to 63 payload bytes
//! - ESC-prefixed commands and the trailing `ESC <status>` marker
//! - the `ESC s … ? FS` track block used by read/write-track commands
//!
//! Callers hand in whole messages and get whole messages back.

pub mod command;
pub mod error;
pub mod packet;
pub mod reader;
pub mod status;
pub mod track_block;
pub mod writer;

pub use command::{build_command, command_name, ESC, FS};
pub use error::{FrameError, Result};
pub use packet::{reassemble, segment, Packet, END_FLAG, LENGTH_MASK, MAX_PAYLOAD, START_FLAG};
pub use reader::PacketAssembler;
pub use status::{extract_status, Status, StatusReply};
pub use track_block::{
    decode_iso_block, decode_iso_response, decode_track_block, decode_track_block_prefix,
    decode_track_response, encode_track_block, TrackSet, BLOCK_TERMINATOR, MAX_TRACK_LEN,
};
pub use writer::PacketWriter;
