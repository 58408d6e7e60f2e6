use msrkit_device::TrackSelection;
use tracing::info;

use crate::cmd::session::Session;
use crate::cmd::EraseArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_ack, prompt_swipe, OutputFormat};

pub fn run(args: EraseArgs, format: OutputFormat) -> CliResult<i32> {
    let tracks = TrackSelection::from_tracks(&args.tracks).map_err(|e| device_error("erase", e))?;
    let mut session = Session::open(&args.device)?;
    info!(%tracks, "swipe card to erase");
    prompt_swipe("erase");
    session.run("erase", |d| d.erase(tracks))?;
    session.close()?;
    print_ack("erase", format);
    Ok(SUCCESS)
}
