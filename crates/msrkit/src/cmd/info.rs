use msrkit_device::Coercivity;
use serde::Serialize;

use crate::cmd::session::Session;
use crate::cmd::DeviceArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    model: String,
    firmware: String,
    coercivity: Coercivity,
    product: Option<String>,
    manufacturer: Option<String>,
}

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args)?;
    let model = session.run("model", |d| d.model())?;
    let firmware = session.run("firmware", |d| d.firmware_version())?;
    let coercivity = session.run("coercivity", |d| d.coercivity())?;
    let (product, manufacturer) = session.hid_strings();
    session.close()?;

    let out = InfoOutput {
        model,
        firmware,
        coercivity,
        product,
        manufacturer,
    };
    let fields = [
        ("model", out.model.clone()),
        ("firmware", out.firmware.clone()),
        ("coercivity", out.coercivity.to_string()),
        ("product", out.product.clone().unwrap_or_else(|| "-".to_string())),
        (
            "manufacturer",
            out.manufacturer.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    print_record(&out, &fields, format);
    Ok(SUCCESS)
}
