// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils::{parse_entrypoint, parse_profile, parse_resolution, parse_size};
use clap::Args as ClapArgs;
use serde::Serialize;
use vabuffer::{coded_buffer::CodedBuffer, context::Context, display::Display};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// DRM render node
    #[arg(short, long, default_value = "/dev/dri/renderD128")]
    device: String,

    /// Encoding profile (h264, h264-baseline, h264-high, hevc, hevc-main10, vp9, av1)
    #[arg(short, long, default_value = "h264")]
    profile: String,

    /// Encoding entry point (slice, lp, picture)
    #[arg(short, long, default_value = "slice")]
    entrypoint: String,

    /// Picture resolution (WxH)
    #[arg(short, long, default_value = "1920x1080")]
    resolution: String,

    /// Coded buffer size in bytes (K and M suffixes accepted)
    #[arg(short, long, default_value = "4M")]
    size: String,

    /// Number of coded buffers to allocate
    #[arg(short, long, default_value = "1")]
    count: usize,
}

#[derive(Debug, Serialize)]
struct AllocReport {
    device: String,
    profile: String,
    width: u32,
    height: u32,
    size: usize,
    buffers: Vec<BufferReport>,
}

#[derive(Debug, Serialize)]
struct BufferReport {
    id: u32,
    segments: usize,
    coded_bytes: usize,
    status: Vec<u32>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing alloc command: {:?}", args);

    let profile = parse_profile(&args.profile)?;
    let entrypoint = parse_entrypoint(&args.entrypoint)?;
    let (width, height) = parse_resolution(&args.resolution)?;
    let size = parse_size(&args.size)?;
    if size == 0 {
        return Err(CliError::InvalidArgs("size must be non-zero".to_string()));
    }
    if args.count == 0 {
        return Err(CliError::InvalidArgs("count must be non-zero".to_string()));
    }

    let display = Display::open_drm(&args.device)?;
    let context = Context::new(&display, profile, entrypoint, width, height)?;
    log::info!(
        "Allocating {} coded buffer(s) of {} bytes for {:?} {}x{}",
        args.count,
        size,
        profile,
        width,
        height
    );

    let mut buffers = (0..args.count)
        .map(|_| CodedBuffer::new(&context, size))
        .collect::<Result<Vec<_>, _>>()?;

    let mut reports = Vec::with_capacity(buffers.len());
    for coded in &mut buffers {
        let id = coded.id();
        let segments = coded.map()?;
        reports.push(BufferReport {
            id,
            segments: segments.len(),
            coded_bytes: segments.total_size(),
            status: segments.iter().map(|segment| segment.status()).collect(),
        });
        coded.unmap()?;
    }

    for coded in &mut buffers {
        coded.destroy()?;
    }

    let report = AllocReport {
        device: args.device,
        profile: format!("{:?}", profile),
        width,
        height,
        size,
        buffers: reports,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_report(&report);
    }

    Ok(())
}

fn print_text_report(report: &AllocReport) {
    println!(
        "{} on {} ({}x{}), {} bytes per buffer",
        report.profile, report.device, report.width, report.height, report.size
    );
    for buffer in &report.buffers {
        println!(
            "  buffer {:#010x}: {} segment(s), {} coded bytes",
            buffer.id, buffer.segments, buffer.coded_bytes
        );
    }
}
