use msrkit_codec::Pan;
use serde::Serialize;

use crate::cmd::PanArgs;
use crate::exit::{codec_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct PanOutput {
    pan: Pan,
    digits: usize,
    luhn_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    mii: Option<&'static str>,
}

pub fn run(args: PanArgs, format: OutputFormat) -> CliResult<i32> {
    let pan = Pan::parse(&args.number).map_err(|e| codec_error("pan", e))?;
    let out = PanOutput {
        digits: pan.len(),
        luhn_valid: pan.is_luhn_valid(),
        mii: pan.mii(),
        pan,
    };

    let fields = [
        ("pan", out.pan.to_string()),
        ("luhn", if out.luhn_valid { "valid" } else { "invalid" }.to_string()),
        ("mii", out.mii.unwrap_or("-").to_string()),
    ];
    print_record(&out, &fields, format);
    Ok(if out.luhn_valid { SUCCESS } else { DATA_INVALID })
}
