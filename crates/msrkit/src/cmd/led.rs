use msrkit_device::LedMode;

use crate::cmd::session::Session;
use crate::cmd::LedArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: LedArgs, format: OutputFormat) -> CliResult<i32> {
    let mode = LedMode::from(args.mode);
    let mut session = Session::open(&args.device)?;
    session.run("led", |d| d.set_led(mode))?;
    // close() sends a reset first; leave the LEDs as set.
    session.release()?;
    print_ack("led", format);
    Ok(SUCCESS)
}
