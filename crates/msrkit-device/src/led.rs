use std::fmt;

use msrkit_frame::command::code;
use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

/// Front-panel LED states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
    AllOff,
    AllOn,
    GreenOn,
    YellowOn,
    RedOn,
}

impl LedMode {
    /// The command code that selects this mode.
    pub fn op(self) -> u8 {
        match self {
            Self::AllOff => code::LED_ALL_OFF,
            Self::AllOn => code::LED_ALL_ON,
            Self::GreenOn => code::LED_GREEN,
            Self::YellowOn => code::LED_YELLOW,
            Self::RedOn => code::LED_RED,
        }
    }
}

impl TryFrom<u8> for LedMode {
    type Error = DeviceError;

    fn try_from(op: u8) -> Result<Self, Self::Error> {
        match op {
            code::LED_ALL_OFF => Ok(Self::AllOff),
            code::LED_ALL_ON => Ok(Self::AllOn),
            code::LED_GREEN => Ok(Self::GreenOn),
            code::LED_YELLOW => Ok(Self::YellowOn),
            code::LED_RED => Ok(Self::RedOn),
            other => Err(DeviceError::InvalidParameter(format!(
                "LED mode must be 0x81..=0x85, got 0x{other:02X}"
            ))),
        }
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AllOff => "all-off",
            Self::AllOn => "all-on",
            Self::GreenOn => "green",
            Self::YellowOn => "yellow",
            Self::RedOn => "red",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_round_trip() {
        for op in 0x81..=0x85u8 {
            assert_eq!(LedMode::try_from(op).unwrap().op(), op);
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(LedMode::try_from(0x80).is_err());
        assert!(LedMode::try_from(0x86).is_err());
    }
}
