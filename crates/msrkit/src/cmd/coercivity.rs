use msrkit_device::Coercivity;
use serde::Serialize;

use crate::cmd::session::Session;
use crate::cmd::CoercivityArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct CoercivityOutput {
    coercivity: Coercivity,
    changed: bool,
}

pub fn run(args: CoercivityArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.device)?;
    let out = match args.set {
        Some(set) => {
            let coercivity = Coercivity::from(set);
            session.run("set coercivity", |d| d.set_coercivity(coercivity))?;
            CoercivityOutput {
                coercivity,
                changed: true,
            }
        }
        None => CoercivityOutput {
            coercivity: session.run("coercivity", |d| d.coercivity())?,
            changed: false,
        },
    };
    session.close()?;

    print_record(
        &out,
        &[("coercivity", out.coercivity.to_string())],
        format,
    );
    Ok(SUCCESS)
}
