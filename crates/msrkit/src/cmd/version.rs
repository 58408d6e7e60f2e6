use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("msrkit {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: msrkit");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("MSRKIT_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "device: vid={:04x} pid={:04x}",
        msrkit_transport::VENDOR_ID,
        msrkit_transport::PRODUCT_ID
    );
    println!("features: hid={}, cli=true", cfg!(feature = "hid"));

    Ok(SUCCESS)
}
