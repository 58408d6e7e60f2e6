use bytes::{BufMut, Bytes, BytesMut};

/// Escape byte that opens every command, status marker and track marker.
pub const ESC: u8 = 0x1B;

/// File separator closing a track block (after `'?'`).
pub const FS: u8 = 0x1C;

/// Command code bytes (the byte following [`ESC`]).
pub mod code {
    pub const RESET: u8 = b'a';
    pub const WRITE_ISO: u8 = b'w';
    pub const READ_ISO: u8 = b'r';
    pub const WRITE_RAW: u8 = b'n';
    pub const READ_RAW: u8 = b'm';
    pub const ERASE: u8 = b'c';
    pub const TEST_COMMUNICATION: u8 = b'e';
    pub const TEST_SENSOR: u8 = 0x86;
    pub const TEST_RAM: u8 = 0x87;
    pub const SET_BPI: u8 = b'b';
    pub const SET_BPC: u8 = b'o';
    pub const SET_LO_CO: u8 = b'x';
    pub const SET_HI_CO: u8 = b'y';
    pub const GET_COERCIVITY: u8 = b'd';
    pub const MODEL: u8 = b't';
    pub const FIRMWARE: u8 = b'v';
    pub const LED_ALL_OFF: u8 = 0x81;
    pub const LED_ALL_ON: u8 = 0x82;
    pub const LED_GREEN: u8 = 0x83;
    pub const LED_YELLOW: u8 = 0x84;
    pub const LED_RED: u8 = 0x85;
}

/// Build a command message: `ESC code params…`.
pub fn build_command(code: u8, params: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 + params.len());
    buf.put_u8(ESC);
    buf.put_u8(code);
    buf.put_slice(params);
    buf.freeze()
}

/// Human-readable name for a command code.
pub fn command_name(code: u8) -> &'static str {
    match code {
        code::RESET => "reset",
        code::WRITE_ISO => "write-iso",
        code::READ_ISO => "read-iso",
        code::WRITE_RAW => "write-raw",
        code::READ_RAW => "read-raw",
        code::ERASE => "erase",
        code::TEST_COMMUNICATION => "test-communication",
        code::TEST_SENSOR => "test-sensor",
        code::TEST_RAM => "test-ram",
        code::SET_BPI => "set-bpi",
        code::SET_BPC => "set-bpc",
        code::SET_HI_CO => "set-hi-co",
        code::SET_LO_CO => "set-lo-co",
        code::GET_COERCIVITY => "get-coercivity",
        code::MODEL => "model",
        code::FIRMWARE => "firmware",
        code::LED_ALL_OFF..=code::LED_RED => "led",
        _ => "unknown",
    }
}
