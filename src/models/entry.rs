//! Per-model registry entry: the served versions of one model and their engines.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::backend::ModelBackend;
use super::policy::{PolicyError, VersionPolicy};
use super::provision::{provision, ProvisionConfig, Provisioned};
use super::version::{extract_versions_attributes, VersionAttributes};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Failed to list versions of model {model} in {}: {source}", .directory.display())]
    ListVersions {
        model: String,
        directory: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Model {model} has no servable versions \
         ({discovered} discovered, {selected} selected by policy, {failed} failed to load)"
    )]
    EmptyServedSet {
        model: String,
        discovered: usize,
        selected: usize,
        failed: usize,
    },
}

/// Everything needed to build one model entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub base_path: PathBuf,
    #[serde(default)]
    pub batch_size: Option<u32>,
    /// Raw policy document; absent means serve the latest version only.
    #[serde(default)]
    pub model_version_policy: Option<serde_json::Value>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            batch_size: None,
            model_version_policy: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_policy(mut self, document: serde_json::Value) -> Self {
        self.model_version_policy = Some(document);
        self
    }
}

/// The served versions of one model.
///
/// Never empty: `default_version` is always one of `versions`, and every
/// version has exactly one engine.
#[derive(Debug)]
pub struct ModelEntry<E> {
    name: String,
    directory: PathBuf,
    batch_size: Option<u32>,
    versions: Vec<u64>,
    default_version: u64,
    engines: BTreeMap<u64, E>,
    attributes: BTreeMap<u64, VersionAttributes>,
}

impl<E> ModelEntry<E> {
    /// Discover, filter and provision the versions of `spec`.
    ///
    /// An invalid policy document aborts the build. Versions that fail to
    /// parse, lack artifacts, or fail engine construction are left out.
    pub async fn build<B>(
        backend: &B,
        spec: &ModelSpec,
        config: &ProvisionConfig,
    ) -> Result<Self, BuildError>
    where
        B: ModelBackend<Engine = E> + ?Sized,
    {
        tracing::info!(model = %spec.name, "Server start loading model");

        let policy = VersionPolicy::from_optional_document(spec.model_version_policy.as_ref())?;

        let attributes = extract_versions_attributes(backend, &spec.base_path, spec.batch_size)
            .await
            .map_err(|source| BuildError::ListVersions {
                model: spec.name.clone(),
                directory: spec.base_path.clone(),
                source,
            })?;

        let mut available: Vec<u64> = attributes.iter().map(|a| a.version_number).collect();
        available.sort_unstable();
        available.dedup();
        tracing::info!(model = %spec.name, versions = ?available, "Discovered model versions");

        let selected = policy.resolve(&available);
        let unmatched = policy.unmatched(&available);
        if !unmatched.is_empty() {
            tracing::warn!(
                model = %spec.name,
                versions = ?unmatched,
                "Requested versions not found on disk"
            );
        }

        let mut pending: BTreeSet<u64> = selected.iter().copied().collect();
        let narrowed: Vec<VersionAttributes> = attributes
            .into_iter()
            .filter(|a| pending.remove(&a.version_number))
            .collect();

        let provisioned = provision(backend, narrowed, config).await;
        if provisioned.engines.is_empty() {
            return Err(BuildError::EmptyServedSet {
                model: spec.name.clone(),
                discovered: available.len(),
                selected: selected.len(),
                failed: provisioned.failures.len(),
            });
        }

        Self::assemble(
            spec.name.clone(),
            spec.base_path.clone(),
            spec.batch_size,
            provisioned,
        )
    }

    /// Construct an entry from already provisioned versions.
    ///
    /// With nothing to serve, the error counts every version handed to the
    /// provisioner as both discovered and selected.
    pub fn assemble(
        name: String,
        directory: PathBuf,
        batch_size: Option<u32>,
        provisioned: Provisioned<E>,
    ) -> Result<Self, BuildError> {
        let failed = provisioned.failures.len();
        let selected = provisioned.attributes.len() + failed;
        let Provisioned {
            mut engines,
            attributes,
            ..
        } = provisioned;

        let attributes: BTreeMap<u64, VersionAttributes> = attributes
            .into_iter()
            .map(|a| (a.version_number, a))
            .collect();
        engines.retain(|version, _| attributes.contains_key(version));

        let versions: Vec<u64> = engines.keys().copied().collect();
        let Some(&default_version) = versions.last() else {
            return Err(BuildError::EmptyServedSet {
                model: name,
                discovered: selected,
                selected,
                failed,
            });
        };

        tracing::info!(model = %name, versions = ?versions, "List of available versions");
        tracing::info!(model = %name, default_version, "Default version");

        let attributes = attributes
            .into_iter()
            .filter(|(version, _)| engines.contains_key(version))
            .collect();

        Ok(Self {
            name,
            directory,
            batch_size,
            versions,
            default_version,
            engines,
            attributes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn batch_size(&self) -> Option<u32> {
        self.batch_size
    }

    /// Served version numbers, ascending.
    pub fn versions(&self) -> &[u64] {
        &self.versions
    }

    /// Highest served version.
    pub fn default_version(&self) -> u64 {
        self.default_version
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false for a constructed entry.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn contains(&self, version: u64) -> bool {
        self.engines.contains_key(&version)
    }

    pub fn engine(&self, version: u64) -> Option<&E> {
        self.engines.get(&version)
    }

    pub fn default_engine(&self) -> &E {
        &self.engines[&self.default_version]
    }

    /// Engine for `version`, or the default engine when no version is given.
    pub fn engine_or_default(&self, version: Option<u64>) -> Option<&E> {
        match version {
            Some(v) => self.engine(v),
            None => Some(self.default_engine()),
        }
    }

    pub fn attributes(&self, version: u64) -> Option<&VersionAttributes> {
        self.attributes.get(&version)
    }

    /// `(version, engine)` pairs in ascending version order.
    pub fn engines(&self) -> impl Iterator<Item = (u64, &E)> {
        self.engines.iter().map(|(v, e)| (*v, e))
    }
}
