use msrkit_codec::decode_raw;

use crate::cmd::session::Session;
use crate::cmd::ReadArgs;
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_tracks, prompt_swipe, OutputFormat, TrackOutput};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let formats = args.layout.formats()?;
    let mut session = Session::open(&args.device)?;
    prompt_swipe("read");

    let tracks: Vec<TrackOutput> = if args.iso {
        let tracks = session.run("read", |d| d.read_iso_tracks())?;
        tracks
            .iter()
            .zip(1u8..)
            .map(|(data, n)| TrackOutput::text(n, data))
            .collect()
    } else {
        let raw = session.run("read", |d| d.read_raw_tracks())?;
        raw.iter()
            .zip(formats.iter())
            .zip(1u8..)
            .map(|((data, fmt), n)| {
                let decoded = decode_raw(data, fmt);
                TrackOutput::decoded(n, &decoded, args.show_raw.then_some(data.as_slice()))
            })
            .collect()
    };
    session.close()?;

    print_tracks(&tracks, format);

    let damaged = tracks
        .iter()
        .any(|t| t.parity_ok == Some(false) || t.lrc_ok == Some(false));
    Ok(if damaged { DATA_INVALID } else { SUCCESS })
}
