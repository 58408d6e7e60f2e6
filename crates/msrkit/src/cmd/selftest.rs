use serde::Serialize;

use crate::cmd::session::Session;
use crate::cmd::{SelftestArgs, SelftestKind};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, prompt_swipe, OutputFormat};

#[derive(Serialize)]
struct SelftestOutput {
    test: &'static str,
    passed: bool,
}

pub fn run(args: SelftestArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.device)?;
    let test = match args.kind {
        SelftestKind::Communication => {
            session.run("communication test", |d| d.test_communication())?;
            "communication"
        }
        SelftestKind::Sensor => {
            prompt_swipe("test the sensor");
            session.run("sensor test", |d| d.test_sensor())?;
            "sensor"
        }
        SelftestKind::Ram => {
            session.run("ram test", |d| d.test_ram())?;
            "ram"
        }
    };
    session.close()?;

    let out = SelftestOutput { test, passed: true };
    print_record(&out, &[(test, "passed".to_string())], format);
    Ok(SUCCESS)
}
