// Copyright 2026 servable-core Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI commands for the `servable-core` binary.
//!
//! ## Usage
//!
//! ```bash
//! servable-core check models.toml   # Build every configured model and report
//! servable-core version
//! ```

pub mod check_cmd;

pub use check_cmd::{run_check, ModelReport};

/// Config file used when `check` is given no path.
pub const DEFAULT_CONFIG_PATH: &str = "models.toml";

/// Config path from `SERVABLE_CONFIG` or the default.
pub fn get_config_path() -> String {
    std::env::var("SERVABLE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
