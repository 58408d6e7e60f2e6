/// Errors raised by track format validation and the raw codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("bits per character must be 4..=8, got {0}")]
    InvalidBitsPerChar(u8),

    #[error("bits per byte must be 4..=8, got {0}")]
    InvalidBitsPerByte(u8),

    #[error("character offset {offset} overflows a byte at {bits_per_char} bits per character")]
    OffsetOverflow { offset: u8, bits_per_char: u8 },

    #[error("character 0x{byte:02X} at index {index} outside encodable range 0x{min:02X}..=0x{max:02X}")]
    CharOutOfRange {
        index: usize,
        byte: u8,
        min: u8,
        max: u8,
    },

    #[error("track number must be 1..=3, got {0}")]
    InvalidTrack(u8),

    #[error("account number has no digits")]
    EmptyPan,

    #[error("account number has an unknown digit at position {index}")]
    UnknownDigit { index: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
