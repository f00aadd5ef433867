// Copyright 2026 servable-core Contributors
// SPDX-License-Identifier: Apache-2.0

//! servable-core entry point.
//!
//! ## CLI Subcommands
//!
//! - `servable-core check [CONFIG]` - Build every configured model (default)
//! - `servable-core version` - Print version
//! - `servable-core help` - Print usage

use std::path::PathBuf;
use std::process::ExitCode;

use servable_core::cli::{get_config_path, run_check};
use servable_core::telemetry::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("check");

    match command {
        "check" => {
            if let Err(e) = init_logging(&LogConfig::from_env()) {
                eprintln!("Logging setup failed: {}", e);
                return ExitCode::from(2u8);
            }
            let path = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(get_config_path()));
            let code = run_check(&path).await;
            ExitCode::from(code as u8)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("servable-core {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::from(2u8)
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "servable-core v{}

USAGE:
    servable-core [COMMAND] [ARGS]

COMMANDS:
    check [CONFIG]  Build every configured model and report served versions (default)
    version         Show version information
    help            Show this help message

ENVIRONMENT:
    SERVABLE_CONFIG                 Config file (default: models.toml)
    SERVABLE_MAX_CONCURRENT_LOADS   Engines constructed in parallel per model
    SERVABLE_LOAD_TIMEOUT_SECS      Per-version load deadline (0 = none)
    SERVABLE_LOG                    Log filter (default: info)
    SERVABLE_LOG_FORMAT             json | pretty (default: json)
    SERVABLE_LOG_FILE               Write logs to this file instead of stderr

EXIT CODES:
    0  Every model has at least one served version
    1  At least one model failed to build
    2  Usage or configuration error",
        version
    );
}
