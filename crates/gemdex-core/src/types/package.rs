//! Gem information types.
//!
//! Defines structures for the `/api/v1/gems/{name}.json` payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gem information as returned by the registry
///
/// Link fields and the sha digest are frequently null or absent, so they
/// decode as options. `metadata` is an open-ended string map controlled by
/// the gem author.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PackageInformation {
    pub name: String,
    pub downloads: u64,
    pub version: String,
    pub version_created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version_downloads: u64,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub info: String,
    pub licenses: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub yanked: bool,
    pub sha: Option<String>,
    pub project_uri: Option<String>,
    pub gem_uri: Option<String>,
    pub homepage_uri: Option<String>,
    pub wiki_uri: Option<String>,
    pub documentation_uri: Option<String>,
    pub mailing_list_uri: Option<String>,
    pub source_code_uri: Option<String>,
    pub bug_tracker_uri: Option<String>,
    pub changelog_uri: Option<String>,
    pub funding_uri: Option<String>,
    #[serde(default)]
    pub dependencies: GemDependencies,
}

/// Development and runtime dependency lists of a gem
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GemDependencies {
    #[serde(default)]
    pub development: Vec<GemDependency>,
    #[serde(default)]
    pub runtime: Vec<GemDependency>,
}

/// A single dependency declaration with its version requirement
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GemDependency {
    pub name: String,
    pub requirements: String,
}

impl PackageInformation {
    /// Names of the runtime dependencies
    pub fn runtime_dependency_names(&self) -> Vec<&str> {
        self.dependencies
            .runtime
            .iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Check whether the gem declares a specific license
    pub fn has_license(&self, license: &str) -> bool {
        self.licenses
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|l| l == license)
    }
}

/// Check if this is a valid gem name
///
/// The registry accepts letters, digits, dots, underscores and hyphens.
pub fn is_valid_gem_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}
