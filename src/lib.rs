//! servable-core
//!
//! Resolves which versions of a model are served: discovers the versions on
//! disk, applies the model's version policy and provisions one inference
//! engine per selected version, tolerating per-version failures.
//!
//! # Pipeline
//!
//! - **Discovery**: list version identifiers, parse the trailing version
//!   number, keep versions with both artifact files.
//! - **Policy**: `all`, `specific` or `latest` (default: latest one).
//!   Malformed policies abort the build.
//! - **Provisioning**: build engines with bounded concurrency; failures
//!   only shrink the served set.
//! - **Entry**: served versions, engines and the default (highest) version.
//!   A model with nothing to serve is an error, never an empty entry.

pub mod cli;
pub mod config;
pub mod models;
pub mod telemetry;

pub use config::{ConfigError, ServerConfig};
pub use models::{
    BuildError, EngineError, EngineProvider, ModelBackend, ModelEntry, ModelRegistry, ModelSpec,
    ProvisionConfig, VersionAttributes, VersionPolicy,
};
