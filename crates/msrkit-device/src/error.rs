use std::time::Duration;

use msrkit_codec::CodecError;
use msrkit_frame::{FrameError, Status};
use msrkit_transport::TransportError;

/// Errors that can occur in device session operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Framing error or non-OK device status.
    #[error("frame error: {0}")]
    Frame(#[source] FrameError),

    /// Track data could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// No packet arrived within the per-packet deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// A caller-supplied argument was rejected before any I/O.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The device replied with something the command does not allow.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A blocking I/O task panicked or was cancelled.
    #[error("I/O task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DeviceError {
    /// The device status carried by this error, if it is a status error.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Frame(FrameError::Status(status)) => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<FrameError> for DeviceError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Transport(err) => Self::Transport(err),
            other => Self::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
