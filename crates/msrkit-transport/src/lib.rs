//! Report-level transport abstraction for MSR605-family card writers.
//!
//! The device speaks in fixed 64-byte HID reports. This crate is the lowest
//! layer of msrkit: it moves whole reports and nothing else.
//! - [`Transport`] is the blocking write/read/close boundary
//! - [`HidTransport`] opens the device through hidapi (`hid` feature)
//! - [`MockTransport`] scripts reports for hardware-free tests
//!
//! Report-ID framing is handled by the implementations and is invisible to
//! the layers above.

pub mod error;
#[cfg(feature = "hid")]
pub mod hid;
pub mod mock;
pub mod traits;

pub use error::{Result, TransportError};
#[cfg(feature = "hid")]
pub use hid::HidTransport;
pub use mock::MockTransport;
pub use traits::{Report, Transport, PRODUCT_ID, REPORT_SIZE, VENDOR_ID};
