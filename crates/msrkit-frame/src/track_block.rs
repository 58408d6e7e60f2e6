//! The `ESC s … ? FS` container carrying per-track data.
//!
//! Raw blocks are length-delimited: each present track is
//! `ESC <n> <len> <data>`. ISO read responses omit the length byte and
//! each track runs until the next marker or the terminator.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::command::{ESC, FS};
use crate::error::{FrameError, Result};
use crate::status::{extract_status, Status};

/// Byte opening a track block after [`ESC`].
pub const BLOCK_START: u8 = b's';

/// Two bytes closing a track block.
pub const BLOCK_TERMINATOR: [u8; 2] = [b'?', FS];

/// Maximum data bytes per track (one-byte length field).
pub const MAX_TRACK_LEN: usize = u8::MAX as usize;

/// One buffer per physical track, track 1 first.
pub type TrackSet = [Vec<u8>; 3];

/// Encode a track block. Empty tracks are omitted.
pub fn encode_track_block(tracks: [&[u8]; 3]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(4 + tracks.iter().map(|t| t.len() + 3).sum::<usize>());
    buf.put_slice(&[ESC, BLOCK_START]);

    for (i, data) in tracks.iter().enumerate() {
        if data.is_empty() {
            continue;
        }
        let len = u8::try_from(data.len()).map_err(|_| FrameError::TrackTooLong {
            track: i + 1,
            len: data.len(),
            max: MAX_TRACK_LEN,
        })?;
        buf.put_slice(&[ESC, i as u8 + 1, len]);
        buf.put_slice(data);
    }

    buf.put_slice(&BLOCK_TERMINATOR);
    Ok(buf.freeze())
}

/// Decode a length-delimited track block.
///
/// Bytes after the terminator are ignored; use
/// [`decode_track_block_prefix`] to get at them.
pub fn decode_track_block(block: &[u8]) -> Result<TrackSet> {
    decode_track_block_prefix(block).map(|(tracks, _)| tracks)
}

/// Decode a length-delimited track block at the start of `block`, returning
/// the tracks and whatever follows the terminator.
pub fn decode_track_block_prefix(block: &[u8]) -> Result<(TrackSet, &[u8])> {
    let mut rest = strip_block_start(block)?;
    let mut tracks = TrackSet::default();
    let mut next = 1u8;

    loop {
        if let Some(after) = rest.strip_prefix(&BLOCK_TERMINATOR) {
            return Ok((tracks, after));
        }
        let track = expect_marker(rest, next)?;
        let len = *rest.get(2).ok_or_else(|| truncated(track))? as usize;
        let data = rest.get(3..3 + len).ok_or_else(|| truncated(track))?;
        tracks[usize::from(track - 1)] = data.to_vec();
        rest = &rest[3 + len..];
        next = track + 1;
    }
}

/// Decode the track block of an ISO read response.
pub fn decode_iso_block(block: &[u8]) -> Result<TrackSet> {
    decode_iso_block_prefix(block).map(|(tracks, _)| tracks)
}

fn decode_iso_block_prefix(block: &[u8]) -> Result<(TrackSet, &[u8])> {
    let mut rest = strip_block_start(block)?;
    let mut tracks = TrackSet::default();
    let mut next = 1u8;

    loop {
        if let Some(after) = rest.strip_prefix(&BLOCK_TERMINATOR) {
            return Ok((tracks, after));
        }
        let track = expect_marker(rest, next)?;
        let body = &rest[2..];
        let end = iso_track_end(body).ok_or(FrameError::TrackBlock(
            "missing block terminator".to_string(),
        ))?;
        tracks[usize::from(track - 1)] = body[..end].to_vec();
        rest = &body[end..];
        next = track + 1;
    }
}

/// Parse a raw read response: `<track block> ESC <status>`.
///
/// The status is taken from immediately after the block terminator, so
/// track data containing `ESC` cannot be mistaken for the status marker.
pub fn decode_track_response(message: &Bytes) -> Result<TrackSet> {
    decode_block_response(message, decode_track_block_prefix)
}

/// Parse an ISO read response: `<ISO track block> ESC <status>`.
pub fn decode_iso_response(message: &Bytes) -> Result<TrackSet> {
    decode_block_response(message, decode_iso_block_prefix)
}

fn decode_block_response(
    message: &Bytes,
    decode: fn(&[u8]) -> Result<(TrackSet, &[u8])>,
) -> Result<TrackSet> {
    if !message.starts_with(&[ESC, BLOCK_START]) {
        // No block at all: the device answered with a bare status.
        extract_status(message)?;
        return Err(FrameError::TrackBlock(
            "response carries no track block".to_string(),
        ));
    }

    let (tracks, tail) = decode(&message[..])?;
    match tail {
        [ESC, status, extra @ ..] => {
            if !extra.is_empty() {
                debug!(extra = extra.len(), "bytes after track response status");
            }
            Status::from_byte(*status).into_result()?;
            Ok(tracks)
        }
        _ => Err(FrameError::MissingStatus),
    }
}

fn strip_block_start(block: &[u8]) -> Result<&[u8]> {
    block
        .strip_prefix(&[ESC, BLOCK_START])
        .ok_or_else(|| FrameError::TrackBlock("block does not start with ESC 's'".to_string()))
}

/// Check that `rest` opens with a marker for a track numbered `next..=3`.
fn expect_marker(rest: &[u8], next: u8) -> Result<u8> {
    match rest {
        [] | [_] => Err(FrameError::TrackBlock(
            "missing block terminator".to_string(),
        )),
        _ if next > 3 => Err(FrameError::TrackBlock(
            "missing block terminator".to_string(),
        )),
        [ESC, track, ..] if (next..=3).contains(track) => Ok(*track),
        [ESC, track, ..] => Err(FrameError::TrackBlock(format!(
            "unexpected track marker {track} (expected {next}..=3)"
        ))),
        [byte, ..] => Err(FrameError::TrackBlock(format!(
            "expected track marker, found 0x{byte:02X}"
        ))),
    }
}

/// Offset of the next `ESC` or block terminator in ISO track data.
fn iso_track_end(body: &[u8]) -> Option<usize> {
    body.iter().enumerate().find_map(|(i, &b)| {
        (b == ESC || body[i..].starts_with(&BLOCK_TERMINATOR)).then_some(i)
    })
}

fn truncated(track: u8) -> FrameError {
    FrameError::TrackBlock(format!("track {track} data truncated"))
}
