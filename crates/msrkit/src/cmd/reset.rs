use crate::cmd::session::Session;
use crate::cmd::DeviceArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args)?;
    session.run("reset", |d| d.reset())?;
    session.close()?;
    print_ack("reset", format);
    Ok(SUCCESS)
}
