use std::sync::{Mutex, MutexGuard};

use hidapi::{HidApi, HidDevice};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{Report, Transport, PRODUCT_ID, REPORT_SIZE, VENDOR_ID};

/// How long a single poll holds the device lock while waiting for a report.
const READ_POLL_MS: i32 = 50;

/// USB HID transport to an MSR605-family device.
///
/// The device handle lives behind a mutex. [`read`](Transport::read) polls in
/// short slices and releases the lock between polls, so a reset can be
/// written while a swipe wait is in progress.
pub struct HidTransport {
    device: Mutex<Option<HidDevice>>,
    product: Option<String>,
    manufacturer: Option<String>,
}

impl HidTransport {
    /// Open the first device matching the MSR605 vendor/product IDs.
    pub fn open() -> Result<Self> {
        Self::open_ids(VENDOR_ID, PRODUCT_ID)
    }

    /// Open the first device matching explicit vendor/product IDs.
    pub fn open_ids(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = HidApi::new().map_err(|err| TransportError::Open {
            vendor_id,
            product_id,
            reason: err.to_string(),
        })?;
        let device = api
            .open(vendor_id, product_id)
            .map_err(|err| TransportError::Open {
                vendor_id,
                product_id,
                reason: err.to_string(),
            })?;

        let product = device.get_product_string().ok().flatten();
        let manufacturer = device.get_manufacturer_string().ok().flatten();
        info!(
            vendor_id = format_args!("{vendor_id:04x}"),
            product_id = format_args!("{product_id:04x}"),
            product = product.as_deref().unwrap_or("unknown"),
            "opened HID device"
        );

        Ok(Self {
            device: Mutex::new(Some(device)),
            product,
            manufacturer,
        })
    }

    /// Product string reported by the device, if any.
    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Manufacturer string reported by the device, if any.
    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Option<HidDevice>> {
        self.device.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for HidTransport {
    fn write(&self, report: &[u8]) -> Result<()> {
        if report.len() > REPORT_SIZE {
            return Err(TransportError::ShortWrite {
                written: 0,
                expected: report.len(),
            });
        }

        // Leading zero is the report ID; the device uses unnumbered reports.
        let mut buf = [0u8; REPORT_SIZE + 1];
        buf[1..=report.len()].copy_from_slice(report);

        let guard = self.lock();
        let device = guard.as_ref().ok_or(TransportError::Closed)?;
        let written = device
            .write(&buf)
            .map_err(|err| TransportError::Hid(err.to_string()))?;
        trace!(written, "HID write");
        if written < REPORT_SIZE {
            return Err(TransportError::ShortWrite {
                written,
                expected: REPORT_SIZE,
            });
        }
        Ok(())
    }

    fn read(&self, report: &mut Report) -> Result<()> {
        loop {
            let guard = self.lock();
            let device = guard.as_ref().ok_or(TransportError::Closed)?;
            let read = device
                .read_timeout(report, READ_POLL_MS)
                .map_err(|err| TransportError::Hid(err.to_string()))?;
            drop(guard);

            if read > 0 {
                trace!(read, "HID read");
                report[read..].fill(0);
                return Ok(());
            }
        }
    }

    fn close(&self) -> Result<()> {
        if self.lock().take().is_some() {
            debug!("HID device released");
        }
        Ok(())
    }
}

impl std::fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidTransport")
            .field("product", &self.product)
            .field("manufacturer", &self.manufacturer)
            .field("open", &self.lock().is_some())
            .finish()
    }
}
