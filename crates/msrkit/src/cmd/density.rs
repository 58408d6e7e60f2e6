use crate::cmd::session::Session;
use crate::cmd::{BpcArgs, BpiArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_ack, OutputFormat};

pub fn run_bpi(args: BpiArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.device)?;
    session.run("bpi", |d| {
        d.set_bits_per_inch(args.track1, args.track2, args.track3)
    })?;
    session.close()?;
    print_ack("bpi", format);
    Ok(SUCCESS)
}

pub fn run_bpc(args: BpcArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.device)?;
    session.run("bpc", |d| {
        d.set_bits_per_char(args.track1, args.track2, args.track3)
    })?;
    session.close()?;
    print_ack("bpc", format);
    Ok(SUCCESS)
}
