// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use vabuffer::driver::{Entrypoint, Profile};

/// Parse resolution string in format "WxH" or "W*H"
///
/// # Examples
/// ```
/// use vabuffer_cli::utils::parse_resolution;
/// assert_eq!(parse_resolution("1920x1080").unwrap(), (1920, 1080));
/// assert_eq!(parse_resolution("1280*720").unwrap(), (1280, 720));
/// ```
pub fn parse_resolution(s: &str) -> Result<(u32, u32), CliError> {
    let (width_str, height_str) = s
        .split_once('x')
        .or_else(|| s.split_once('*'))
        .ok_or_else(|| {
            CliError::InvalidArgs(format!(
                "Invalid resolution format (expected WxH or W*H): {}",
                s
            ))
        })?;

    let width = width_str
        .parse::<u32>()
        .map_err(|_| CliError::InvalidArgs(format!("Invalid width in resolution: {}", s)))?;
    let height = height_str
        .parse::<u32>()
        .map_err(|_| CliError::InvalidArgs(format!("Invalid height in resolution: {}", s)))?;

    if width == 0 || height == 0 {
        return Err(CliError::InvalidArgs(format!(
            "Resolution dimensions must be positive: {}",
            s
        )));
    }

    Ok((width, height))
}

/// Parse a byte size with optional K/M suffix (binary multiples)
///
/// # Examples
/// ```
/// use vabuffer_cli::utils::parse_size;
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64K").unwrap(), 65536);
/// assert_eq!(parse_size("3M").unwrap(), 3 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<usize, CliError> {
    let s_lower = s.trim().to_lowercase();
    let invalid = || CliError::InvalidArgs(format!("Invalid size: {}", s));

    let (digits, multiplier) = if let Some(value) = s_lower.strip_suffix('m') {
        (value, 1024 * 1024)
    } else if let Some(value) = s_lower.strip_suffix('k') {
        (value, 1024)
    } else {
        (s_lower.as_str(), 1)
    };

    digits
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid())?
        .checked_mul(multiplier)
        .ok_or_else(invalid)
}

/// Parse an encoding profile name
pub fn parse_profile(s: &str) -> Result<Profile, CliError> {
    match s.to_lowercase().as_str() {
        "h264-baseline" | "h264-cb" => Ok(Profile::H264ConstrainedBaseline),
        "h264" | "h264-main" => Ok(Profile::H264Main),
        "h264-high" => Ok(Profile::H264High),
        "hevc" | "h265" | "hevc-main" => Ok(Profile::HevcMain),
        "hevc-main10" | "h265-main10" => Ok(Profile::HevcMain10),
        "vp9" => Ok(Profile::Vp9Profile0),
        "av1" => Ok(Profile::Av1Profile0),
        _ => Err(CliError::InvalidArgs(format!(
            "Unknown profile '{}' (expected h264, h264-baseline, h264-high, hevc, hevc-main10, vp9 or av1)",
            s
        ))),
    }
}

/// Parse an encoding entry point name
pub fn parse_entrypoint(s: &str) -> Result<Entrypoint, CliError> {
    match s.to_lowercase().as_str() {
        "slice" => Ok(Entrypoint::EncSlice),
        "lp" | "low-power" => Ok(Entrypoint::EncSliceLP),
        "picture" => Ok(Entrypoint::EncPicture),
        _ => Err(CliError::InvalidArgs(format!(
            "Unknown entry point '{}' (expected slice, lp or picture)",
            s
        ))),
    }
}
