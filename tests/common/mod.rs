//! In-memory backend shared by the build and provisioning tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use servable_core::models::{
    parse_version_number, ArtifactLocator, EngineError, EngineProvider, VersionAttributes,
    VersionFiles, VersionLister,
};

/// Engine handle produced by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeEngine {
    pub version: u64,
}

#[derive(Default)]
pub struct FakeBackend {
    identifiers: Vec<String>,
    incomplete: HashSet<u64>,
    failing: HashSet<u64>,
    hanging: HashSet<u64>,
    delay: Option<Duration>,
    list_error: bool,
    pub constructed: Mutex<Vec<u64>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeBackend {
    /// Backend whose model directory holds the given version directories.
    pub fn with_versions(versions: &[u64]) -> Self {
        Self {
            identifiers: versions
                .iter()
                .map(|v| format!("/models/fake/{}/", v))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_identifiers(identifiers: &[&str]) -> Self {
        Self {
            identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn incomplete(mut self, versions: &[u64]) -> Self {
        self.incomplete.extend(versions);
        self
    }

    pub fn failing(mut self, versions: &[u64]) -> Self {
        self.failing.extend(versions);
        self
    }

    pub fn hanging(mut self, versions: &[u64]) -> Self {
        self.hanging.extend(versions);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn list_error(mut self) -> Self {
        self.list_error = true;
        self
    }

    pub fn constructed(&self) -> Vec<u64> {
        let mut versions = self.constructed.lock().unwrap().clone();
        versions.sort();
        versions
    }
}

#[async_trait]
impl VersionLister for FakeBackend {
    async fn list_versions(&self, _model_directory: &Path) -> io::Result<Vec<String>> {
        if self.list_error {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        Ok(self.identifiers.clone())
    }
}

#[async_trait]
impl ArtifactLocator for FakeBackend {
    async fn version_files(&self, version: &str) -> VersionFiles {
        let number = parse_version_number(version).unwrap_or_default();
        VersionFiles {
            topology: Some(PathBuf::from(version).join("model.xml")),
            weights: (!self.incomplete.contains(&number))
                .then(|| PathBuf::from(version).join("model.bin")),
        }
    }

    async fn mapping_config(&self, _version: &str) -> Option<PathBuf> {
        None
    }
}

#[async_trait]
impl EngineProvider for FakeBackend {
    type Engine = FakeEngine;

    async fn construct(&self, attributes: &VersionAttributes) -> Result<FakeEngine, EngineError> {
        let version = attributes.version_number;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hanging.contains(&version) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        } else if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&version) {
            return Err(EngineError::Construction(format!(
                "cannot load network for version {}",
                version
            )));
        }
        self.constructed.lock().unwrap().push(version);
        Ok(FakeEngine { version })
    }
}
