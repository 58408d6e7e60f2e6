use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Parity scheme of the per-character parity bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    Odd,
    Even,
}

/// How trailing zero-valued characters are trimmed after decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingTrim {
    /// Cut before the last non-zero character. On a well-formed track that
    /// character is the LRC, so the output is exactly the data characters.
    /// A track whose LRC happens to be zero loses its last data character.
    #[default]
    ExcludeLastNonNull,
    /// Cut after the last non-zero character, keeping a non-zero LRC
    /// character in the output.
    ThroughLastNonNull,
}

/// Per-track codec configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackFormat {
    offset: u8,
    bits_per_char: u8,
    bits_per_byte: u8,
    parity: Parity,
    trim: TrailingTrim,
}

impl TrackFormat {
    /// Smallest accepted bit width (characters and transport bytes).
    pub const MIN_BITS: u8 = 4;
    /// Largest accepted bit width (characters and transport bytes).
    pub const MAX_BITS: u8 = 8;

    /// Build a format.
    ///
    /// `bits_per_char` counts the parity bit. `bits_per_byte` is how many
    /// low bits of each transport byte carry track data.
    pub fn new(offset: u8, bits_per_char: u8, bits_per_byte: u8, parity: Parity) -> Result<Self> {
        if !(Self::MIN_BITS..=Self::MAX_BITS).contains(&bits_per_char) {
            return Err(CodecError::InvalidBitsPerChar(bits_per_char));
        }
        if !(Self::MIN_BITS..=Self::MAX_BITS).contains(&bits_per_byte) {
            return Err(CodecError::InvalidBitsPerByte(bits_per_byte));
        }
        let span = 1u16 << (bits_per_char - 1);
        if u16::from(offset) + span - 1 > u16::from(u8::MAX) {
            return Err(CodecError::OffsetOverflow {
                offset,
                bits_per_char,
            });
        }

        Ok(Self {
            offset,
            bits_per_char,
            bits_per_byte,
            parity,
            trim: TrailingTrim::default(),
        })
    }

    /// Build the conventional format for a character width: offset `'0'`
    /// for 4 and 5 bits, `' '` otherwise, odd parity, 8 bits per byte.
    pub fn for_bits(bits_per_char: u8) -> Result<Self> {
        let offset = match bits_per_char {
            4 | 5 => b'0',
            _ => b' ',
        };
        Self::new(offset, bits_per_char, 8, Parity::Odd)
    }

    /// ISO 7811 layout for `track` (1..=3).
    pub fn iso(track: u8) -> Result<Self> {
        Preset::Iso.format(track)
    }

    /// AAMVA layout for `track` (1..=3).
    pub fn aamva(track: u8) -> Result<Self> {
        Preset::Aamva.format(track)
    }

    pub fn with_trim(mut self, trim: TrailingTrim) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn bits_per_char(&self) -> u8 {
        self.bits_per_char
    }

    pub fn bits_per_byte(&self) -> u8 {
        self.bits_per_byte
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn trim(&self) -> TrailingTrim {
        self.trim
    }

    /// Data bits per character (parity excluded).
    pub fn data_bits(&self) -> u8 {
        self.bits_per_char - 1
    }

    /// Highest encodable character.
    pub fn max_char(&self) -> u8 {
        self.offset + ((1u8 << self.data_bits()) - 1)
    }

    /// Whether `byte` can be encoded under this format.
    pub fn is_encodable(&self, byte: u8) -> bool {
        (self.offset..=self.max_char()).contains(&byte)
    }

    /// Fold lower-case letters to upper case when upper case is encodable,
    /// and drop every other character outside the encodable range.
    pub fn sanitize(&self, text: &[u8]) -> Vec<u8> {
        text.iter()
            .filter_map(|&b| {
                if self.is_encodable(b) {
                    Some(b)
                } else if b.is_ascii_lowercase() && self.is_encodable(b.to_ascii_uppercase()) {
                    Some(b.to_ascii_uppercase())
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Named per-track layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Track 1 alphanumeric at 210 bpi, tracks 2 and 3 numeric at 75/210 bpi.
    Iso,
    /// Like ISO, but track 3 is alphanumeric.
    Aamva,
}

impl Preset {
    /// Bits per character (parity included) for tracks 1..=3.
    pub fn bits_per_char(self) -> [u8; 3] {
        match self {
            Self::Iso => [7, 5, 5],
            Self::Aamva => [7, 5, 7],
        }
    }

    /// Recording density for tracks 1..=3.
    pub fn bits_per_inch(self) -> [u16; 3] {
        [210, 75, 210]
    }

    /// Codec format for `track` (1..=3).
    pub fn format(self, track: u8) -> Result<TrackFormat> {
        let index = match track {
            1..=3 => usize::from(track - 1),
            other => return Err(CodecError::InvalidTrack(other)),
        };
        TrackFormat::for_bits(self.bits_per_char()[index])
    }

    /// Codec formats for all three tracks.
    pub fn formats(self) -> Result<[TrackFormat; 3]> {
        Ok([self.format(1)?, self.format(2)?, self.format(3)?])
    }
}
