use std::sync::Arc;

use crate::error::Result;

/// Size of one transport report (one HID report, without report ID).
pub const REPORT_SIZE: usize = 64;

/// USB vendor ID of the MSR605 family.
pub const VENDOR_ID: u16 = 0x0801;

/// USB product ID of the MSR605 family.
pub const PRODUCT_ID: u16 = 0x0003;

/// One fixed-size transport report.
pub type Report = [u8; REPORT_SIZE];

/// A blocking report transport to an already-opened device.
///
/// Methods take `&self` so that a second caller (for example a reset issued
/// while a swipe wait is blocked in [`read`](Transport::read)) can write
/// concurrently. Implementations that need exclusive access internally must
/// not hold it across an unbounded wait.
pub trait Transport: Send + Sync + 'static {
    /// Write one report. `report` is at most [`REPORT_SIZE`] bytes; shorter
    /// slices are zero-padded by the implementation.
    fn write(&self, report: &[u8]) -> Result<()>;

    /// Block until one report is available and copy it into `report`.
    fn read(&self, report: &mut Report) -> Result<()>;

    /// Release the underlying handle. Subsequent calls return
    /// [`TransportError::Closed`](crate::TransportError::Closed).
    fn close(&self) -> Result<()>;
}

impl<T: Transport> Transport for Arc<T> {
    fn write(&self, report: &[u8]) -> Result<()> {
        (**self).write(report)
    }

    fn read(&self, report: &mut Report) -> Result<()> {
        (**self).read(report)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn arc_forwards_to_inner_transport() {
        let mock = Arc::new(MockTransport::new());
        let shared: Arc<MockTransport> = Arc::clone(&mock);

        Transport::write(&shared, &[0xC2, 0x1B, b'a']).unwrap();
        Transport::close(&shared).unwrap();

        assert_eq!(mock.written().len(), 1);
        assert!(mock.is_closed());
    }

    #[test]
    fn device_identifiers() {
        assert_eq!(VENDOR_ID, 0x0801);
        assert_eq!(PRODUCT_ID, 0x0003);
        assert_eq!(REPORT_SIZE, 64);
    }
}
