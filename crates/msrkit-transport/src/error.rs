/// Errors that can occur while moving reports to and from the device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device could not be opened.
    #[error("failed to open device {vendor_id:04x}:{product_id:04x}: {reason}")]
    Open {
        vendor_id: u16,
        product_id: u16,
        reason: String,
    },

    /// The HID layer reported a failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// An I/O error occurred on the underlying handle.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes than a full report were accepted by the device.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
