//! Registry of built model entries, keyed by model name.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::backend::ModelBackend;
use super::entry::{BuildError, ModelEntry, ModelSpec};
use super::provision::ProvisionConfig;

/// Thread-safe registry of served models.
pub struct ModelRegistry<E> {
    models: Arc<RwLock<HashMap<String, Arc<ModelEntry<E>>>>>,
}

impl<E> ModelRegistry<E> {
    pub fn new() -> Self {
        Self {
            models: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build `spec` and register the result under its name.
    ///
    /// On failure the registry is left unchanged, so a previously loaded
    /// entry of the same name keeps serving.
    pub async fn load<B>(
        &self,
        backend: &B,
        spec: &ModelSpec,
        config: &ProvisionConfig,
    ) -> Result<Arc<ModelEntry<E>>, BuildError>
    where
        B: ModelBackend<Engine = E> + ?Sized,
    {
        let entry = Arc::new(ModelEntry::build(backend, spec, config).await?);
        self.insert(Arc::clone(&entry)).await;
        Ok(entry)
    }

    /// Register an entry, returning the one it replaced.
    pub async fn insert(&self, entry: Arc<ModelEntry<E>>) -> Option<Arc<ModelEntry<E>>> {
        let name = entry.name().to_string();
        self.models.write().await.insert(name, entry)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<ModelEntry<E>>> {
        self.models.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.models.read().await.contains_key(name)
    }

    /// Remove a model from the registry.
    pub async fn unregister(&self, name: &str) -> Option<Arc<ModelEntry<E>>> {
        self.models.write().await.remove(name)
    }

    /// Registered model names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered models.
    pub async fn count(&self) -> usize {
        self.models.read().await.len()
    }
}

impl<E> Default for ModelRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ModelRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            models: Arc::clone(&self.models),
        }
    }
}
