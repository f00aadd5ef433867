//! Local filesystem backend: version listing, artifact lookup and
//! memory-mapped engine construction.
//!
//! Layout: `<model_dir>/<version>/` holds one `*.xml` topology file, one
//! `*.bin` weights file and optionally `mapping_config.json`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use memmap2::Mmap;

use super::backend::{ArtifactLocator, EngineError, EngineProvider, VersionLister};
use super::version::{VersionAttributes, VersionFiles};

const TOPOLOGY_EXTENSION: &str = "xml";
const WEIGHTS_EXTENSION: &str = "bin";
const MAPPING_CONFIG_FILE: &str = "mapping_config.json";

/// Version lister and artifact locator over a local model directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalModelStore;

impl LocalModelStore {
    pub fn new() -> Self {
        Self
    }

    /// First file in `dir` with the given extension, by file name.
    async fn find_by_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(dir).await.ok()?;
        let mut matches = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if is_file(&path).await {
                matches.push(path);
            }
        }
        matches.sort();
        matches.into_iter().next()
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl VersionLister for LocalModelStore {
    /// Every sub-directory as `"<model_dir>/<name>/"`, sorted by name.
    async fn list_versions(&self, model_directory: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(model_directory).await?;
        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let mut identifier = entry.path().to_string_lossy().into_owned();
            identifier.push(std::path::MAIN_SEPARATOR);
            versions.push(identifier);
        }
        versions.sort();
        Ok(versions)
    }
}

#[async_trait]
impl ArtifactLocator for LocalModelStore {
    async fn version_files(&self, version: &str) -> VersionFiles {
        let dir = Path::new(version);
        VersionFiles {
            topology: Self::find_by_extension(dir, TOPOLOGY_EXTENSION).await,
            weights: Self::find_by_extension(dir, WEIGHTS_EXTENSION).await,
        }
    }

    async fn mapping_config(&self, version: &str) -> Option<PathBuf> {
        let path = Path::new(version).join(MAPPING_CONFIG_FILE);
        is_file(&path).await.then_some(path)
    }
}

/// Memory-mapped weights file for zero-copy access.
pub struct MappedModel {
    mmap: Mmap,
}

impl MappedModel {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: File is opened read-only, artifacts are not modified while served
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl std::fmt::Debug for MappedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedModel").field("len", &self.len()).finish()
    }
}

/// Engine handle backed by the version's artifacts held in memory.
#[derive(Debug)]
pub struct MappedEngine {
    pub version_number: u64,
    pub batch_size: Option<u32>,
    pub topology: String,
    pub weights: MappedModel,
}

/// Engine provider that loads the topology text and maps the weights.
///
/// Empty artifacts are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedEngineProvider;

#[async_trait]
impl EngineProvider for MappedEngineProvider {
    type Engine = MappedEngine;

    async fn construct(&self, attributes: &VersionAttributes) -> Result<MappedEngine, EngineError> {
        let topology = tokio::fs::read_to_string(&attributes.artifacts.topology).await?;
        if topology.trim().is_empty() {
            return Err(EngineError::Construction(format!(
                "empty topology file: {}",
                attributes.artifacts.topology.display()
            )));
        }

        let weights = MappedModel::open(&attributes.artifacts.weights)?;
        if weights.is_empty() {
            return Err(EngineError::Construction(format!(
                "empty weights file: {}",
                attributes.artifacts.weights.display()
            )));
        }

        Ok(MappedEngine {
            version_number: attributes.version_number,
            batch_size: attributes.batch_size,
            topology,
            weights,
        })
    }
}

/// Local store and mapped engine provider as one [`ModelBackend`](super::ModelBackend).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend {
    store: LocalModelStore,
    provider: MappedEngineProvider,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionLister for LocalBackend {
    async fn list_versions(&self, model_directory: &Path) -> io::Result<Vec<String>> {
        self.store.list_versions(model_directory).await
    }
}

#[async_trait]
impl ArtifactLocator for LocalBackend {
    async fn version_files(&self, version: &str) -> VersionFiles {
        self.store.version_files(version).await
    }

    async fn mapping_config(&self, version: &str) -> Option<PathBuf> {
        self.store.mapping_config(version).await
    }
}

#[async_trait]
impl EngineProvider for LocalBackend {
    type Engine = MappedEngine;

    async fn construct(&self, attributes: &VersionAttributes) -> Result<MappedEngine, EngineError> {
        self.provider.construct(attributes).await
    }
}
