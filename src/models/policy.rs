//! Model version policy: which discovered versions get served.
//!
//! A raw policy document is a JSON object with exactly one of the keys
//! `all`, `specific` or `latest`. It is checked against the shape for that
//! key and decoded once into [`VersionPolicy`]; resolution never looks at
//! the raw document again.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The three accepted policy document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyShape {
    All,
    Specific,
    Latest,
}

impl PolicyShape {
    /// Top-level key that selects this shape in a raw document.
    pub fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Specific => "specific",
            Self::Latest => "latest",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "all" => Some(Self::All),
            "specific" => Some(Self::Specific),
            "latest" => Some(Self::Latest),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Policy document rejected by validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Version policy must contain exactly one of `all`, `specific`, `latest`: {0}")]
    UnknownShape(String),

    #[error("Malformed `{shape}` version policy: {reason}")]
    Malformed { shape: PolicyShape, reason: String },
}

/// Checks a raw document against one expected shape.
pub trait PolicyValidator {
    fn validate(&self, document: &Value, shape: PolicyShape) -> Result<(), PolicyError>;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AllShape {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecificShape {
    versions: BTreeSet<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LatestShape {
    #[serde(default = "default_num_versions")]
    num_versions: NonZeroUsize,
}

fn default_num_versions() -> NonZeroUsize {
    NonZeroUsize::MIN
}

/// Default validator. Decodes the variant body into a strict per-shape
/// struct: unknown fields, a missing `versions` list, and a `num_versions`
/// that is not a positive integer are all rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeValidator;

impl PolicyValidator for ShapeValidator {
    fn validate(&self, document: &Value, shape: PolicyShape) -> Result<(), PolicyError> {
        decode(document, shape).map(|_| ())
    }
}

fn decode(document: &Value, shape: PolicyShape) -> Result<VersionPolicy, PolicyError> {
    let malformed = |reason: String| PolicyError::Malformed { shape, reason };

    let body = document
        .get(shape.key())
        .cloned()
        .ok_or_else(|| malformed(format!("missing `{}` key", shape.key())))?;

    let policy = match shape {
        PolicyShape::All => {
            serde_json::from_value::<AllShape>(body).map_err(|e| malformed(e.to_string()))?;
            VersionPolicy::All
        }
        PolicyShape::Specific => {
            let SpecificShape { versions } =
                serde_json::from_value(body).map_err(|e| malformed(e.to_string()))?;
            VersionPolicy::Specific { versions }
        }
        PolicyShape::Latest => {
            let LatestShape { num_versions } =
                serde_json::from_value(body).map_err(|e| malformed(e.to_string()))?;
            VersionPolicy::Latest { num_versions }
        }
    };
    Ok(policy)
}

/// Decoded serving policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Serve every discovered version.
    All,
    /// Serve the discovered versions that appear in the set.
    Specific { versions: BTreeSet<u64> },
    /// Serve the `num_versions` highest discovered versions.
    Latest { num_versions: NonZeroUsize },
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self::Latest { num_versions: NonZeroUsize::MIN }
    }
}

impl VersionPolicy {
    /// Decode a raw document using [`ShapeValidator`].
    pub fn from_document(document: &Value) -> Result<Self, PolicyError> {
        Self::from_document_with(document, &ShapeValidator)
    }

    /// Detect the variant key, validate against its shape, then decode.
    pub fn from_document_with<V>(document: &Value, validator: &V) -> Result<Self, PolicyError>
    where
        V: PolicyValidator + ?Sized,
    {
        let shape = detect_shape(document)?;
        validator.validate(document, shape)?;
        decode(document, shape)
    }

    /// Decode an optional document; `None` gives the default `Latest{1}`.
    pub fn from_optional_document(document: Option<&Value>) -> Result<Self, PolicyError> {
        document.map_or_else(|| Ok(Self::default()), Self::from_document)
    }

    pub fn shape(&self) -> PolicyShape {
        match self {
            Self::All => PolicyShape::All,
            Self::Specific { .. } => PolicyShape::Specific,
            Self::Latest { .. } => PolicyShape::Latest,
        }
    }

    /// Select versions from `available`, which must be ascending and unique.
    /// The result is ascending.
    pub fn resolve(&self, available: &[u64]) -> Vec<u64> {
        debug_assert!(available.windows(2).all(|w| w[0] < w[1]));

        match self {
            Self::All => available.to_vec(),
            Self::Specific { versions } => available
                .iter()
                .copied()
                .filter(|v| versions.contains(v))
                .collect(),
            Self::Latest { num_versions } => {
                let start = available.len().saturating_sub(num_versions.get());
                available[start..].to_vec()
            }
        }
    }

    /// Versions a `Specific` policy asks for that are not in `available`.
    /// Empty for the other variants.
    pub fn unmatched(&self, available: &[u64]) -> Vec<u64> {
        match self {
            Self::Specific { versions } => versions
                .iter()
                .copied()
                .filter(|v| available.binary_search(v).is_err())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Raw document form of this policy.
    pub fn to_document(&self) -> Value {
        match self {
            Self::All => serde_json::json!({ "all": {} }),
            Self::Specific { versions } => {
                serde_json::json!({ "specific": { "versions": versions } })
            }
            Self::Latest { num_versions } => {
                serde_json::json!({ "latest": { "num_versions": num_versions.get() } })
            }
        }
    }
}

fn detect_shape(document: &Value) -> Result<PolicyShape, PolicyError> {
    let unknown = || PolicyError::UnknownShape(document.to_string());

    let map = document.as_object().ok_or_else(unknown)?;
    if map.len() != 1 {
        return Err(unknown());
    }
    map.keys()
        .next()
        .and_then(|key| PolicyShape::from_key(key))
        .ok_or_else(unknown)
}

/// Resolve with an optional policy; `None` behaves as `Latest{1}`.
pub fn resolve_versions(policy: Option<&VersionPolicy>, available: &[u64]) -> Vec<u64> {
    match policy {
        Some(policy) => policy.resolve(available),
        None => VersionPolicy::default().resolve(available),
    }
}
