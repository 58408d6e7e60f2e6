use std::fmt;
use std::io;

use msrkit_codec::CodecError;
use msrkit_device::DeviceError;
use msrkit_frame::FrameError;
use msrkit_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const DEVICE_STATUS: i32 = 70;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Status(_) => CliError::new(DEVICE_STATUS, format!("{context}: {err}")),
        FrameError::TrackTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other if other.is_desync() => CliError::new(
            DATA_INVALID,
            format!("{context}: {other} (run `msrkit reset` to resynchronise)"),
        ),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Transport(err) => transport_error(context, err),
        DeviceError::Frame(err) => frame_error(context, err),
        DeviceError::Codec(err) => codec_error(context, err),
        DeviceError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        DeviceError::InvalidParameter(_) => CliError::new(USAGE, format!("{context}: {err}")),
        DeviceError::UnexpectedResponse(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use msrkit_frame::Status;

    use super::*;

    #[test]
    fn device_errors_map_to_exit_codes() {
        let timeout = device_error("read", DeviceError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.code, TIMEOUT);
        assert!(timeout.message.starts_with("read: "));

        let status = device_error("write", FrameError::Status(Status::WriteSwipe).into());
        assert_eq!(status.code, DEVICE_STATUS);

        let usage = device_error("bpi", DeviceError::InvalidParameter("x".to_string()));
        assert_eq!(usage.code, USAGE);

        let framing = device_error("read", FrameError::MissingStatus.into());
        assert_eq!(framing.code, DATA_INVALID);
        assert!(framing.message.contains("msrkit reset"));

        let too_long = frame_error(
            "write",
            FrameError::TrackTooLong {
                track: 1,
                len: 300,
                max: 255,
            },
        );
        assert_eq!(too_long.code, USAGE);
        assert!(!too_long.message.contains("msrkit reset"));
    }

    #[test]
    fn transport_errors_map_to_exit_codes() {
        let open = transport_error(
            "open",
            TransportError::Open {
                vendor_id: 0x0801,
                product_id: 0x0003,
                reason: "no device".to_string(),
            },
        );
        assert_eq!(open.code, TRANSPORT_ERROR);

        let denied = transport_error(
            "open",
            TransportError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(denied.code, PERMISSION_DENIED);
    }
}
