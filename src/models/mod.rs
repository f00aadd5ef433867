//! Model version management.
//!
//! Discovers the versions stored for a model, applies the serving policy,
//! provisions engines and assembles the resulting registry entry.

pub mod backend;
pub mod policy;
pub mod version;

mod entry;
mod loader;
mod provision;
mod registry;

pub use backend::{ArtifactLocator, EngineError, EngineProvider, ModelBackend, VersionLister};
pub use entry::{BuildError, ModelEntry, ModelSpec};
pub use loader::{
    LocalBackend, LocalModelStore, MappedEngine, MappedEngineProvider, MappedModel,
};
pub use policy::{
    resolve_versions, PolicyError, PolicyShape, PolicyValidator, ShapeValidator, VersionPolicy,
};
pub use provision::{provision, ProvisionConfig, ProvisionFailure, Provisioned};
pub use registry::ModelRegistry;
pub use version::{
    extract_versions_attributes, parse_version_number, ArtifactPaths, VersionAttributes,
    VersionFiles, VersionParseError,
};
