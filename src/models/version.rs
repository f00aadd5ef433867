//! Version discovery: turns raw version identifiers into validated
//! per-version attribute records.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::backend::{ArtifactLocator, VersionLister};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("Version identifier has no trailing numeric segment: {0:?}")]
    Malformed(String),

    #[error("Version number out of range: {0:?}")]
    OutOfRange(String),
}

/// The two artifact files every servable version must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Network topology description (e.g. `model.xml`).
    pub topology: PathBuf,
    /// Binary weights (e.g. `model.bin`).
    pub weights: PathBuf,
}

/// Artifact lookup result for one version directory; either file may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFiles {
    pub topology: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

impl VersionFiles {
    /// Both required files, or `None` if either is absent.
    pub fn complete(self) -> Option<ArtifactPaths> {
        match (self.topology, self.weights) {
            (Some(topology), Some(weights)) => Some(ArtifactPaths { topology, weights }),
            _ => None,
        }
    }
}

/// One discovered, artifact-complete version of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionAttributes {
    /// Always greater than zero.
    pub version_number: u64,
    pub artifacts: ArtifactPaths,
    pub mapping_config: Option<PathBuf>,
    /// Inherited from the model configuration. `None` keeps the batch size
    /// stored in the artifacts.
    pub batch_size: Option<u32>,
}

fn version_segment() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[/\\])(\d+)[/\\]?$").expect("version pattern is valid")
    })
}

/// Extract the version number from a path-like identifier such as
/// `/models/resnet/3/`.
///
/// Returns `Ok(0)` for a `0` segment; callers treat that as reserved.
pub fn parse_version_number(identifier: &str) -> Result<u64, VersionParseError> {
    let captures = version_segment()
        .captures(identifier)
        .ok_or_else(|| VersionParseError::Malformed(identifier.to_string()))?;

    captures[1]
        .parse::<u64>()
        .map_err(|_| VersionParseError::OutOfRange(identifier.to_string()))
}

/// List and validate every version of the model stored under `model_directory`.
///
/// Identifiers that do not parse, that name version `0`, or that lack either
/// artifact file are skipped. Only a failure of the lister itself is an error.
pub async fn extract_versions_attributes<S>(
    store: &S,
    model_directory: &Path,
    batch_size: Option<u32>,
) -> io::Result<Vec<VersionAttributes>>
where
    S: VersionLister + ArtifactLocator + ?Sized,
{
    let identifiers = store.list_versions(model_directory).await?;
    tracing::debug!(directory = %model_directory.display(), ?identifiers, "listed versions");

    let mut attributes = Vec::with_capacity(identifiers.len());
    for identifier in &identifiers {
        let version_number = match parse_version_number(identifier) {
            Ok(0) => {
                tracing::debug!(%identifier, "skipping reserved version 0");
                continue;
            }
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(%identifier, error = %e, "skipping unparsable version");
                continue;
            }
        };

        let Some(artifacts) = store.version_files(identifier).await.complete() else {
            tracing::debug!(%identifier, version_number, "skipping version with missing artifacts");
            continue;
        };

        attributes.push(VersionAttributes {
            version_number,
            artifacts,
            mapping_config: store.mapping_config(identifier).await,
            batch_size,
        });
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_segment_with_slash() {
        assert_eq!(parse_version_number("/models/resnet/3/"), Ok(3));
        assert_eq!(parse_version_number("models/resnet/42"), Ok(42));
        assert_eq!(parse_version_number("C:\\models\\resnet\\7\\"), Ok(7));
        assert_eq!(parse_version_number("12"), Ok(12));
    }

    #[test]
    fn zero_parses_but_is_reported_as_zero() {
        assert_eq!(parse_version_number("/models/resnet/0/"), Ok(0));
    }

    #[test]
    fn rejects_non_numeric_segments() {
        for id in ["/models/resnet/v1/", "/models/resnet/1a/", "/models/resnet/", ""] {
            assert!(matches!(
                parse_version_number(id),
                Err(VersionParseError::Malformed(_))
            ));
        }
    }

    #[test]
    fn rejects_embedded_digits_that_are_not_a_segment() {
        assert!(parse_version_number("/models/resnet-12/").is_err());
    }

    #[test]
    fn overflow_is_out_of_range() {
        let id = "/models/resnet/99999999999999999999999/";
        assert!(matches!(
            parse_version_number(id),
            Err(VersionParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn incomplete_files_do_not_produce_artifacts() {
        let files = VersionFiles {
            topology: Some(PathBuf::from("model.xml")),
            weights: None,
        };
        assert!(files.complete().is_none());
    }
}
