//! Tests for the multi-model registry.

mod common;

use std::sync::Arc;

use common::{FakeBackend, FakeEngine};
use serde_json::json;
use servable_core::models::{BuildError, ModelRegistry, ModelSpec, ProvisionConfig};

#[tokio::test]
async fn test_load_registers_entry() {
    let registry: ModelRegistry<FakeEngine> = ModelRegistry::new();
    let backend = FakeBackend::with_versions(&[1, 2]);

    let entry = registry
        .load(&backend, &ModelSpec::new("resnet", "/m/resnet"), &ProvisionConfig::sequential())
        .await
        .unwrap();

    assert!(registry.contains("resnet").await);
    assert_eq!(registry.count().await, 1);
    let fetched = registry.get("resnet").await.unwrap();
    assert!(Arc::ptr_eq(&entry, &fetched));
    assert_eq!(fetched.default_version(), 2);
}

#[tokio::test]
async fn test_reload_replaces_entry() {
    let registry = ModelRegistry::new();
    let spec = ModelSpec::new("resnet", "/m/resnet");

    registry
        .load(&FakeBackend::with_versions(&[1]), &spec, &ProvisionConfig::sequential())
        .await
        .unwrap();
    registry
        .load(&FakeBackend::with_versions(&[1, 2]), &spec, &ProvisionConfig::sequential())
        .await
        .unwrap();

    assert_eq!(registry.count().await, 1);
    assert_eq!(registry.get("resnet").await.unwrap().default_version(), 2);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_entry() {
    let registry = ModelRegistry::new();
    let spec = ModelSpec::new("resnet", "/m/resnet");

    registry
        .load(&FakeBackend::with_versions(&[3]), &spec, &ProvisionConfig::sequential())
        .await
        .unwrap();

    let bad = spec.clone().with_policy(json!({"oldest": {}}));
    let err = registry
        .load(&FakeBackend::with_versions(&[4]), &bad, &ProvisionConfig::sequential())
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::Policy(_)));
    assert_eq!(registry.get("resnet").await.unwrap().versions(), &[3]);
}

#[tokio::test]
async fn test_names_sorted_and_unregister() {
    let registry = ModelRegistry::new();
    let backend = FakeBackend::with_versions(&[1]);
    for name in ["ssd", "bert", "resnet"] {
        registry
            .load(&backend, &ModelSpec::new(name, "/m"), &ProvisionConfig::sequential())
            .await
            .unwrap();
    }

    assert_eq!(registry.names().await, vec!["bert", "resnet", "ssd"]);

    let removed = registry.unregister("bert").await.unwrap();
    assert_eq!(removed.name(), "bert");
    assert!(!registry.contains("bert").await);
    assert!(registry.unregister("bert").await.is_none());
    assert_eq!(registry.count().await, 2);
}

#[tokio::test]
async fn test_clones_share_state() {
    let registry = ModelRegistry::new();
    let handle = registry.clone();

    registry
        .load(
            &FakeBackend::with_versions(&[1]),
            &ModelSpec::new("resnet", "/m"),
            &ProvisionConfig::sequential(),
        )
        .await
        .unwrap();

    assert!(handle.contains("resnet").await);
}
