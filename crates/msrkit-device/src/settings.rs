use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Write coercivity of the card stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercivity {
    Low,
    High,
}

impl fmt::Display for Coercivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("lo-co"),
            Self::High => f.write_str("hi-co"),
        }
    }
}

/// Recording density of one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    /// Leave the track's current density unchanged.
    #[default]
    Leave,
    /// 75 bits per inch.
    Low,
    /// 210 bits per inch.
    High,
}

impl Density {
    /// Map a bits-per-inch value; `0` means leave unchanged.
    pub fn from_bpi(bpi: u16) -> Result<Self> {
        match bpi {
            0 => Ok(Self::Leave),
            75 => Ok(Self::Low),
            210 => Ok(Self::High),
            other => Err(DeviceError::InvalidParameter(format!(
                "density must be 0, 75 or 210 bpi, got {other}"
            ))),
        }
    }

    pub fn bpi(self) -> u16 {
        match self {
            Self::Leave => 0,
            Self::Low => 75,
            Self::High => 210,
        }
    }

    /// Parameter byte of the set-density command for track `index` (0-based).
    ///
    /// Track 1 takes the density itself as a byte; tracks 2 and 3 use
    /// selector bytes. [`Density::Leave`] sends nothing.
    pub(crate) fn param(self, index: usize) -> Option<u8> {
        match (index, self) {
            (_, Self::Leave) => None,
            (0, Self::Low) => Some(75),
            (0, Self::High) => Some(210),
            (1, Self::Low) => Some(0xA0),
            (1, Self::High) => Some(0xA1),
            (_, Self::Low) => Some(0xC0),
            (_, Self::High) => Some(0xC1),
        }
    }
}

/// A set of tracks 1..=3, encoded as the erase bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrackSelection(u8);

impl TrackSelection {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b111);

    pub fn new(track1: bool, track2: bool, track3: bool) -> Self {
        Self(u8::from(track1) | u8::from(track2) << 1 | u8::from(track3) << 2)
    }

    /// Build from a list of track numbers (1..=3).
    pub fn from_tracks(tracks: &[u8]) -> Result<Self> {
        tracks.iter().try_fold(Self::NONE, |acc, &track| match track {
            1..=3 => Ok(Self(acc.0 | 1 << (track - 1))),
            other => Err(DeviceError::InvalidParameter(format!(
                "track number must be 1..=3, got {other}"
            ))),
        })
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, track: u8) -> bool {
        (1..=3).contains(&track) && self.0 & (1 << (track - 1)) != 0
    }
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks: Vec<String> = (1..=3u8)
            .filter(|&t| self.contains(t))
            .map(|t| t.to_string())
            .collect();
        f.write_str(&tracks.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_params() {
        assert_eq!(Density::High.param(0), Some(0xD2));
        assert_eq!(Density::Low.param(0), Some(0x4B));
        assert_eq!(Density::Low.param(1), Some(0xA0));
        assert_eq!(Density::High.param(1), Some(0xA1));
        assert_eq!(Density::Low.param(2), Some(0xC0));
        assert_eq!(Density::High.param(2), Some(0xC1));
        assert_eq!(Density::Leave.param(1), None);
    }

    #[test]
    fn density_from_bpi() {
        assert_eq!(Density::from_bpi(0).unwrap(), Density::Leave);
        assert_eq!(Density::from_bpi(210).unwrap().bpi(), 210);
        assert!(matches!(
            Density::from_bpi(100),
            Err(DeviceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn selection_mask() {
        assert_eq!(TrackSelection::new(true, false, true).mask(), 0b101);
        assert_eq!(TrackSelection::from_tracks(&[2, 3]).unwrap().mask(), 0b110);
        assert!(TrackSelection::from_tracks(&[]).unwrap().is_empty());
        assert!(TrackSelection::from_tracks(&[4]).is_err());
        assert_eq!(TrackSelection::ALL.to_string(), "1,2,3");
        assert!(!TrackSelection::ALL.contains(0));
    }
}
