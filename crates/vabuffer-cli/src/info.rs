// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use clap::Args as ClapArgs;
use serde::Serialize;
use vabuffer::va::VaDriver;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// DRM render node
    #[arg(short, long, default_value = "/dev/dri/renderD128")]
    device: String,
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    device: String,
    library_version: String,
    libva_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    va_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor: Option<String>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing info command: {:?}", args);

    let libva_available = vabuffer::is_available()?;
    if !libva_available {
        return Err(CliError::VaUnavailable(
            "libva is missing required entry points".to_string(),
        ));
    }

    let driver = VaDriver::open_drm(&args.device)?;
    let va_version = driver
        .version()
        .map(|(major, minor)| format!("{}.{}", major, minor));
    let vendor = match driver.vendor() {
        Ok(vendor) => Some(vendor),
        Err(e) => {
            log::warn!("Vendor string not available: {}", e);
            None
        }
    };

    let info = DeviceInfo {
        device: args.device,
        library_version: env!("CARGO_PKG_VERSION").to_string(),
        libva_available,
        va_version,
        vendor,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&info)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_info(&info);
    }

    Ok(())
}

fn print_text_info(info: &DeviceInfo) {
    println!("vabuffer Device Information");
    println!("===========================");
    println!("Library Version: {}\n", info.library_version);
    println!("Device: {}", info.device);
    if let Some(ref version) = info.va_version {
        println!("  VA-API: {}", version);
    }
    if let Some(ref vendor) = info.vendor {
        println!("  Vendor: {}", vendor);
    }
}
