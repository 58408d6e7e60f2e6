use msrkit_transport::TransportError;

use crate::status::Status;

/// Errors that can occur while framing or unframing device messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A packet sequence with no packets was handed to reassembly.
    #[error("empty packet sequence")]
    EmptySequence,

    /// The first packet of a message lacks the start-of-message flag.
    #[error("first packet lacks the start-of-message flag")]
    MissingStart,

    /// A packet other than the first carries the start-of-message flag.
    #[error("start-of-message flag on packet {index} (must be first)")]
    MisplacedStart { index: usize },

    /// A packet other than the last carries the end-of-message flag.
    #[error("end-of-message flag on packet {index} (must be last)")]
    MisplacedEnd { index: usize },

    /// The last packet of a sequence lacks the end-of-message flag.
    #[error("last packet lacks the end-of-message flag")]
    MissingEnd,

    /// No status marker could be located in a response.
    #[error("response carries no status marker")]
    MissingStatus,

    /// The device answered with a status other than OK.
    #[error("device status: {0}")]
    Status(Status),

    /// A track block is structurally malformed.
    #[error("malformed track block: {0}")]
    TrackBlock(String),

    /// Track data does not fit the one-byte length field.
    #[error("track {track} data too long ({len} bytes, max {max})")]
    TrackTooLong { track: usize, len: usize, max: usize },

    /// A transport failure while writing packets.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Whether this error indicates the packet stream lost synchronisation.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            Self::EmptySequence
                | Self::MissingStart
                | Self::MisplacedStart { .. }
                | Self::MisplacedEnd { .. }
                | Self::MissingEnd
                | Self::MissingStatus
                | Self::TrackBlock(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desync_covers_stream_errors_only() {
        assert!(FrameError::MissingStart.is_desync());
        assert!(FrameError::MisplacedEnd { index: 1 }.is_desync());
        assert!(FrameError::MissingStatus.is_desync());
        assert!(FrameError::TrackBlock("bad marker".to_string()).is_desync());

        assert!(!FrameError::Status(Status::Fail).is_desync());
        assert!(!FrameError::TrackTooLong {
            track: 1,
            len: 300,
            max: 255
        }
        .is_desync());
        assert!(!FrameError::Transport(TransportError::Closed).is_desync());
    }
}
