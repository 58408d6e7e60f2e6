//! Bit-level packing of track characters.
//!
//! On the wire a track is one continuous bit stream, most significant bit
//! first, where each transport byte contributes its low `bits_per_byte`
//! bits. The stream is a run of `bits_per_char` groups: the data bits
//! least significant first, then the parity bit. The final group is the
//! LRC, the XOR of all data values, with its own parity bit.

use serde::Serialize;
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::format::{Parity, TrackFormat, TrailingTrim};

/// Result of decoding one raw track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedTrack {
    /// Decoded characters, offset applied.
    pub chars: Vec<u8>,
    /// Parity check per character, parallel to `chars`.
    pub parity_ok: Vec<bool>,
    /// Whether the XOR of every decoded data value is zero.
    pub lrc_ok: bool,
}

impl DecodedTrack {
    /// The characters as text. Decoded characters are always ASCII for
    /// formats whose range stays below 0x80.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.chars).into_owned()
    }

    /// Whether every character passed its parity check.
    pub fn parity_valid(&self) -> bool {
        self.parity_ok.iter().all(|&ok| ok)
    }

    /// Parity and LRC both hold.
    pub fn is_valid(&self) -> bool {
        self.lrc_ok && self.parity_valid()
    }
}

/// Decode a raw track bitstream.
pub fn decode_raw(raw: &[u8], format: &TrackFormat) -> DecodedTrack {
    if raw.is_empty() {
        return DecodedTrack {
            lrc_ok: true,
            ..DecodedTrack::default()
        };
    }

    let bpc = u32::from(format.bits_per_char());
    let bpb = u32::from(format.bits_per_byte());
    let byte_mask = (1u32 << bpb) - 1;

    let mut chars = Vec::with_capacity(raw.len() * bpb as usize / bpc as usize);
    let mut parity_ok = Vec::with_capacity(chars.capacity());
    let mut lrc = 0u8;
    let mut last_non_null = None;

    let mut bits = 0u32;
    let mut count = 0u32;
    for &byte in raw {
        bits = (bits << bpb) | (u32::from(byte) & byte_mask);
        count += bpb;

        while count >= bpc {
            count -= bpc;
            let group = (bits >> count) as u8;
            bits &= (1u32 << count) - 1;

            let (value, ones) = unpack_group(group, format.data_bits());
            if value != 0 {
                last_non_null = Some(chars.len());
            }
            lrc ^= value;
            chars.push(format.offset() + value);
            parity_ok.push(match format.parity() {
                Parity::Odd => ones % 2 == 1,
                Parity::Even => ones % 2 == 0,
            });
        }
    }

    let keep = match (last_non_null, format.trim()) {
        (None, _) => 0,
        (Some(last), TrailingTrim::ExcludeLastNonNull) => last,
        (Some(last), TrailingTrim::ThroughLastNonNull) => last + 1,
    };
    trace!(groups = chars.len(), keep, lrc, "decoded raw track");
    chars.truncate(keep);
    parity_ok.truncate(keep);

    DecodedTrack {
        chars,
        parity_ok,
        lrc_ok: lrc == 0,
    }
}

/// Encode track characters, appending the LRC character.
///
/// Fails on the first character outside the format's encodable range.
pub fn encode_raw(chars: &[u8], format: &TrackFormat) -> Result<Vec<u8>> {
    let bpc = u32::from(format.bits_per_char());
    let bpb = u32::from(format.bits_per_byte());
    let byte_mask = (1u32 << bpb) - 1;
    let total_bits = (chars.len() + 1) * bpc as usize;

    let mut raw = Vec::with_capacity(total_bits.div_ceil(bpb as usize));
    let mut lrc = 0u8;
    let mut bits = 0u32;
    let mut count = 0u32;

    let mut push_group = |group: u8, raw: &mut Vec<u8>| {
        bits = (bits << bpc) | u32::from(group);
        count += bpc;
        while count >= bpb {
            count -= bpb;
            raw.push(((bits >> count) & byte_mask) as u8);
            bits &= (1u32 << count) - 1;
        }
    };

    for (index, &byte) in chars.iter().enumerate() {
        if !format.is_encodable(byte) {
            return Err(CodecError::CharOutOfRange {
                index,
                byte,
                min: format.offset(),
                max: format.max_char(),
            });
        }
        let value = byte - format.offset();
        lrc ^= value;
        push_group(pack_group(value, format), &mut raw);
    }
    push_group(pack_group(lrc, format), &mut raw);

    if count > 0 {
        // Left-align the tail so the decoder sees the pending bits first.
        raw.push(((bits << (bpb - count)) & byte_mask) as u8);
    }

    trace!(chars = chars.len(), bytes = raw.len(), lrc, "encoded raw track");
    Ok(raw)
}

/// Split a bit group into its data value and the number of set bits
/// (parity bit included).
fn unpack_group(group: u8, data_bits: u8) -> (u8, u32) {
    // The group's low bit is parity; the bit above it is the last data
    // bit on the wire, i.e. the value's most significant bit.
    (reverse_bits(group >> 1, data_bits), group.count_ones())
}

fn pack_group(value: u8, format: &TrackFormat) -> u8 {
    let ones = value.count_ones();
    let parity_bit = match format.parity() {
        Parity::Odd => u8::from(ones % 2 == 0),
        Parity::Even => u8::from(ones % 2 == 1),
    };
    (reverse_bits(value, format.data_bits()) << 1) | parity_bit
}

/// Reverse the low `width` bits of `value`.
fn reverse_bits(value: u8, width: u8) -> u8 {
    value.reverse_bits() >> (8 - width)
}
