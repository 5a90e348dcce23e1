//! CLI command implementations.

pub mod aggregate;
pub mod config;
pub mod rank;
pub mod report;

pub use aggregate::AggregateArgs;
pub use rank::RankArgs;
pub use report::ReportArgs;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a JSON or YAML input file, chosen by extension.
pub(crate) fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))
    }
}
