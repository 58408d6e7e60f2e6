//! Command session for MSR605-family magnetic stripe reader/writers.
//!
//! [`Device`] wraps an opened [`Transport`](msrkit_transport::Transport) and
//! exposes one async method per device command. Each call sends one command
//! and waits for its response with a per-packet deadline: the short check
//! timeout for configuration commands, the long swipe timeout for commands
//! that wait for a card.

pub mod config;
pub mod device;
pub mod error;
pub mod led;
pub mod settings;

pub use config::{parse_duration, DeviceConfig};
pub use device::{Device, ResetHandle};
pub use error::{DeviceError, Result};
pub use led::LedMode;
pub use settings::{Coercivity, Density, TrackSelection};
