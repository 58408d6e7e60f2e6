//! Drive MSR605-family magnetic stripe reader/writers.
//!
//! msrkit speaks the device's ESC command protocol over USB HID and encodes
//! and decodes the raw track bitstream it exchanges with the card.
//!
//! # Crate Structure
//!
//! - [`transport`]: report transport abstraction, mock and HID (behind `hid` feature)
//! - [`frame`]: 64-byte packet framing, commands, status and track blocks
//! - [`codec`]: raw track bit packing, presets and account number checks
//! - [`device`]: async command session

/// Re-export transport types.
pub mod transport {
    pub use msrkit_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msrkit_frame::*;
}

/// Re-export codec types.
pub mod codec {
    pub use msrkit_codec::*;
}

/// Re-export device session types.
pub mod device {
    pub use msrkit_device::*;
}
