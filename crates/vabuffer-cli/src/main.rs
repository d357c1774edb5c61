// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod alloc;
mod error;
mod info;
mod utils;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// vabuffer CLI - VA-API device and coded buffer tool
#[derive(Parser)]
#[command(name = "vabuffer")]
#[command(version)]
#[command(about = "vabuffer CLI - VA-API device and coded buffer tool")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=trace for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display VA-API version and driver vendor of a render node
    Info(info::Args),

    /// Allocate, map and release coded buffers on a render node
    Alloc(alloc::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Info(args) => info::execute(args, cli.json),
        Commands::Alloc(args) => alloc::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    // RUST_LOG still wins over the flags
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("Logging initialized");
}
