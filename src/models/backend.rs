//! Capability traits a model-format backend implements.
//!
//! The build pipeline is generic over these; nothing in it assumes a
//! particular storage layout or inference engine.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::version::{VersionAttributes, VersionFiles};

/// Enumerates raw version identifiers under a model's storage root.
#[async_trait]
pub trait VersionLister: Send + Sync {
    /// Each identifier ends in the version number as its last path segment.
    async fn list_versions(&self, model_directory: &Path) -> io::Result<Vec<String>>;
}

/// Locates the artifacts inside one version identifier.
#[async_trait]
pub trait ArtifactLocator: Send + Sync {
    async fn version_files(&self, version: &str) -> VersionFiles;

    async fn mapping_config(&self, version: &str) -> Option<PathBuf>;
}

/// Errors from constructing one version's engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine construction failed: {0}")]
    Construction(String),

    #[error("Engine construction timed out after {0:?}")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Builds an inference engine for a single version.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    type Engine: Send;

    async fn construct(&self, attributes: &VersionAttributes) -> Result<Self::Engine, EngineError>;
}

/// Full capability set needed to build a model entry.
pub trait ModelBackend: VersionLister + ArtifactLocator + EngineProvider {}

impl<T> ModelBackend for T where T: VersionLister + ArtifactLocator + EngineProvider {}
