use msrkit_codec::{encode_raw, Preset};
use tracing::info;

use crate::cmd::session::Session;
use crate::cmd::WriteArgs;
use crate::exit::{codec_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_ack, prompt_swipe, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let mut texts: [Vec<u8>; 3] = [&args.track1, &args.track2, &args.track3]
        .map(|t| t.as_deref().map(|s| s.as_bytes().to_vec()).unwrap_or_default());
    if texts.iter().all(Vec::is_empty) {
        return Err(CliError::new(
            USAGE,
            "nothing to write: pass at least one of --track1, --track2, --track3",
        ));
    }

    let formats = args.layout.formats()?;
    if !args.iso {
        if args.sanitize {
            for (text, fmt) in texts.iter_mut().zip(formats.iter()) {
                *text = fmt.sanitize(text);
            }
        }
        // Fail on unencodable text before opening the device.
        for (index, (text, fmt)) in texts.iter().zip(formats.iter()).enumerate() {
            encode_raw(text, fmt).map_err(|e| codec_error(&format!("track {}", index + 1), e))?;
        }
    }

    let mut session = Session::open(&args.device)?;
    let tracks = [texts[0].as_slice(), texts[1].as_slice(), texts[2].as_slice()];

    if args.iso {
        prompt_swipe("write");
        session.run("write", |d| d.write_iso_tracks(tracks))?;
    } else {
        if !args.no_configure {
            let preset = Preset::from(args.layout.preset);
            let [b1, b2, b3] = preset.bits_per_char();
            let [d1, d2, d3] = preset.bits_per_inch();
            info!(?preset, "configuring track layout");
            session.run("bpc", |d| d.set_bits_per_char(b1, b2, b3))?;
            session.run("bpi", |d| d.set_bits_per_inch(d1, d2, d3))?;
        }
        prompt_swipe("write");
        session.run("write", |d| d.write_track_text(tracks, &formats))?;
    }
    session.close()?;

    print_ack("write", format);
    Ok(SUCCESS)
}
