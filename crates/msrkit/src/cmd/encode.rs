//! Offline track encoding and decoding.

use msrkit_codec::{decode_raw, encode_raw};
use serde::Serialize;

use crate::cmd::{DecodeArgs, EncodeArgs};
use crate::exit::{codec_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{parse_hex, print_record, print_tracks, to_hex, OutputFormat, TrackOutput};

#[derive(Serialize)]
struct EncodeOutput {
    track: u8,
    text: String,
    hex: String,
    len: usize,
}

pub fn run_encode(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let fmt = args.layout.format(args.track)?;
    let text = if args.sanitize {
        fmt.sanitize(args.text.as_bytes())
    } else {
        args.text.into_bytes()
    };
    let raw = encode_raw(&text, &fmt).map_err(|e| codec_error("encode", e))?;

    let out = EncodeOutput {
        track: args.track,
        text: String::from_utf8_lossy(&text).into_owned(),
        hex: to_hex(&raw),
        len: raw.len(),
    };
    print_record(&out, &[("hex", out.hex.clone())], format);
    Ok(SUCCESS)
}

pub fn run_decode(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let fmt = args.layout.format(args.track)?;
    let raw = parse_hex(&args.hex)?;
    let decoded = decode_raw(&raw, &fmt);

    print_tracks(&[TrackOutput::decoded(args.track, &decoded, None)], format);
    Ok(if decoded.is_valid() { SUCCESS } else { DATA_INVALID })
}
