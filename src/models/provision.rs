//! Engine provisioning: best-effort construction of one engine per version.
//!
//! A failure for one version never stops the others. Every construction
//! returns its own outcome; outcomes are partitioned after all of them have
//! finished, so the surviving attributes and the engine map always hold
//! the same version numbers.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use super::backend::{EngineError, EngineProvider};
use super::version::VersionAttributes;

/// Bounds on engine construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Maximum engines under construction at once. Zero is treated as one.
    pub max_concurrent_loads: usize,
    /// Per-version construction deadline. A version that exceeds it counts
    /// as failed; other versions are unaffected.
    pub load_timeout: Option<Duration>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: num_cpus::get(),
            load_timeout: None,
        }
    }
}

impl ProvisionConfig {
    /// One version at a time, no deadline.
    pub fn sequential() -> Self {
        Self {
            max_concurrent_loads: 1,
            load_timeout: None,
        }
    }
}

/// A version whose engine could not be built.
#[derive(Debug)]
pub struct ProvisionFailure {
    pub attributes: VersionAttributes,
    pub error: EngineError,
}

/// Result of provisioning a list of versions.
#[derive(Debug)]
pub struct Provisioned<E> {
    /// Engines keyed by version number.
    pub engines: BTreeMap<u64, E>,
    /// Attributes of the versions present in `engines`, ascending.
    pub attributes: Vec<VersionAttributes>,
    /// Versions that failed, ascending.
    pub failures: Vec<ProvisionFailure>,
}

impl<E> Provisioned<E> {
    /// Version numbers that have an engine, ascending.
    pub fn versions(&self) -> Vec<u64> {
        self.engines.keys().copied().collect()
    }

    pub fn failed_versions(&self) -> Vec<u64> {
        self.failures
            .iter()
            .map(|f| f.attributes.version_number)
            .collect()
    }
}

async fn construct_one<P>(
    provider: &P,
    attributes: &VersionAttributes,
    load_timeout: Option<Duration>,
) -> Result<P::Engine, EngineError>
where
    P: EngineProvider + ?Sized,
{
    tracing::info!(
        version = attributes.version_number,
        "Creating inference engine for version"
    );

    match load_timeout {
        Some(limit) => tokio::time::timeout(limit, provider.construct(attributes))
            .await
            .unwrap_or(Err(EngineError::TimedOut(limit))),
        None => provider.construct(attributes).await,
    }
}

/// Build engines for `attributes`, dropping the versions that fail.
pub async fn provision<P>(
    provider: &P,
    attributes: Vec<VersionAttributes>,
    config: &ProvisionConfig,
) -> Provisioned<P::Engine>
where
    P: EngineProvider + ?Sized,
{
    let load_timeout = config.load_timeout;

    let mut outcomes: Vec<(VersionAttributes, Result<P::Engine, EngineError>)> =
        stream::iter(attributes)
            .map(|attrs| async move {
                let outcome = construct_one(provider, &attrs, load_timeout).await;
                (attrs, outcome)
            })
            .buffer_unordered(config.max_concurrent_loads.max(1))
            .collect()
            .await;

    outcomes.sort_by_key(|(attrs, _)| attrs.version_number);

    let mut provisioned = Provisioned {
        engines: BTreeMap::new(),
        attributes: Vec::with_capacity(outcomes.len()),
        failures: Vec::new(),
    };

    for (attrs, outcome) in outcomes {
        match outcome {
            Ok(engine) => {
                provisioned.engines.insert(attrs.version_number, engine);
                provisioned.attributes.push(attrs);
            }
            Err(error) => {
                tracing::error!(
                    version = attrs.version_number,
                    attributes = ?attrs,
                    error = %error,
                    "Error occurred while loading model version"
                );
                provisioned.failures.push(ProvisionFailure {
                    attributes: attrs,
                    error,
                });
            }
        }
    }

    provisioned
}
