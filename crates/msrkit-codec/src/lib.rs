//! Encoding and decoding of magnetic stripe track data.
//!
//! Track characters are packed as fixed-width bit groups (data bits plus a
//! parity bit) into transport bytes, followed by a longitudinal redundancy
//! check character. [`TrackFormat`] carries the knobs; [`encode_raw`] and
//! [`decode_raw`] do the work. The [`pan`] module validates primary account
//! numbers found in decoded text.

pub mod error;
pub mod format;
pub mod pan;
pub mod raw;

pub use error::{CodecError, Result};
pub use format::{Parity, Preset, TrackFormat, TrailingTrim};
pub use pan::Pan;
pub use raw::{decode_raw, encode_raw, DecodedTrack};
