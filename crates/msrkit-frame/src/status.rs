use bytes::Bytes;
use tracing::debug;

use crate::command::ESC;
use crate::error::{FrameError, Result};

/// A device status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// `'0'`
    Ok,
    /// `'1'`
    ReadWrite,
    /// `'2'`
    InvalidCommandFormat,
    /// `'4'`
    InvalidCommand,
    /// `'9'`
    WriteSwipe,
    /// `'A'`
    Fail,
    /// Any byte outside the documented set.
    Unknown(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' => Self::Ok,
            b'1' => Self::ReadWrite,
            b'2' => Self::InvalidCommandFormat,
            b'4' => Self::InvalidCommand,
            b'9' => Self::WriteSwipe,
            b'A' => Self::Fail,
            other => Self::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Ok => b'0',
            Self::ReadWrite => b'1',
            Self::InvalidCommandFormat => b'2',
            Self::InvalidCommand => b'4',
            Self::WriteSwipe => b'9',
            Self::Fail => b'A',
            Self::Unknown(byte) => byte,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// `Ok(())` for [`Status::Ok`], otherwise the status as a frame error.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(FrameError::Status(self))
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::ReadWrite => f.write_str("read/write error"),
            Self::InvalidCommandFormat => f.write_str("invalid command format"),
            Self::InvalidCommand => f.write_str("invalid command"),
            Self::WriteSwipe => f.write_str("write mode swipe error"),
            Self::Fail => f.write_str("fail"),
            Self::Unknown(byte) => write!(f, "unknown status byte 0x{byte:02X}"),
        }
    }
}

/// A response split around its status marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    /// Bytes before the status marker.
    pub data: Bytes,
    /// Bytes after the status byte.
    pub result: Bytes,
}

/// Locate the status marker in a generic response and check it.
///
/// The marker is the *last* `ESC` in the message; the byte after it is the
/// status. Responses whose payload may itself contain `ESC` after the
/// status (raw track reads) must be parsed length-delimited instead, see
/// [`decode_track_response`](crate::track_block::decode_track_response).
pub fn extract_status(message: &Bytes) -> Result<StatusReply> {
    let esc = message
        .iter()
        .rposition(|&b| b == ESC)
        .ok_or(FrameError::MissingStatus)?;
    let byte = *message.get(esc + 1).ok_or(FrameError::MissingStatus)?;

    let status = Status::from_byte(byte);
    debug!(%status, at = esc, len = message.len(), "response status");
    status.into_result()?;

    Ok(StatusReply {
        data: message.slice(..esc),
        result: message.slice(esc + 2..),
    })
}
