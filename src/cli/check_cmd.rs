// Copyright 2026 servable-core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `check` subcommand: build every configured model from local storage and
//! print the served versions.

use std::path::Path;

use crate::config::ServerConfig;
use crate::models::{LocalBackend, ModelRegistry};

/// Outcome of building one configured model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReport {
    pub name: String,
    /// Served versions and default version, or the build error message.
    pub outcome: Result<(Vec<u64>, u64), String>,
}

/// Run `check` against the config at `config_path`.
///
/// Returns exit code: 0 when every model built, 1 when any model failed,
/// 2 on configuration errors.
pub async fn run_check(config_path: &Path) -> i32 {
    let config = match ServerConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {}", config_path.display(), e);
            return 2;
        }
    };

    let reports = build_all(&config).await;
    print_reports(&reports);

    if reports.iter().all(|r| r.outcome.is_ok()) {
        0
    } else {
        1
    }
}

/// Build each model of `config` with the local backend.
pub async fn build_all(config: &ServerConfig) -> Vec<ModelReport> {
    let backend = LocalBackend::new();
    let provision = config.provision_config();
    let registry = ModelRegistry::new();

    let mut reports = Vec::with_capacity(config.models.len());
    for spec in &config.models {
        let outcome = registry
            .load(&backend, spec, &provision)
            .await
            .map(|entry| (entry.versions().to_vec(), entry.default_version()))
            .map_err(|e| e.to_string());
        reports.push(ModelReport {
            name: spec.name.clone(),
            outcome,
        });
    }
    reports
}

/// Format and print reports to stdout.
pub fn print_reports(reports: &[ModelReport]) {
    println!("{:<24} {:<8} {:<9} VERSIONS / ERROR", "NAME", "STATUS", "DEFAULT");
    println!("{}", "-".repeat(72));
    for report in reports {
        println!("{}", format_report(report));
    }
}

fn format_report(report: &ModelReport) -> String {
    match &report.outcome {
        Ok((versions, default_version)) => format!(
            "{:<24} {:<8} {:<9} {}",
            truncate(&report.name, 23),
            "ok",
            default_version,
            versions
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        ),
        Err(message) => format!(
            "{:<24} {:<8} {:<9} {}",
            truncate(&report.name, 23),
            "failed",
            "-",
            message
        ),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_served_model() {
        let report = ModelReport {
            name: "resnet".into(),
            outcome: Ok((vec![2, 3], 3)),
        };
        let line = format_report(&report);
        assert!(line.starts_with("resnet"));
        assert!(line.contains(" ok "));
        assert!(line.ends_with("2,3"));
    }

    #[test]
    fn test_format_failed_model() {
        let report = ModelReport {
            name: "ssd".into(),
            outcome: Err("Model ssd has no servable versions".into()),
        };
        let line = format_report(&report);
        assert!(line.contains("failed"));
        assert!(line.ends_with("no servable versions"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("modèle-très-long", 6), "modèle");
        assert_eq!(truncate("short", 10), "short");
    }

    #[tokio::test]
    async fn test_missing_config_returns_2() {
        let code = run_check(Path::new("/nonexistent/servable.toml")).await;
        assert_eq!(code, 2);
    }
}
