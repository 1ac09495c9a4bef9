//! Gem version types.
//!
//! Defines structures for `/api/v1/versions/{name}.json` and the related
//! latest-version and timeframe endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One released version of a gem
///
/// The `requirements` entries vary in shape between gems, so they stay as
/// raw JSON values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GemVersion {
    #[serde(default)]
    pub authors: String,
    pub built_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub downloads_count: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub number: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub platform: String,
    pub rubygems_version: Option<String>,
    pub ruby_version: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    pub licenses: Option<Vec<String>>,
    #[serde(default)]
    pub requirements: Vec<serde_json::Value>,
    pub sha: Option<String>,
}

/// Latest published version of a gem
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LatestVersion {
    pub version: String,
}

impl GemVersion {
    /// Check whether this version was built for the default ruby platform
    pub fn is_ruby_platform(&self) -> bool {
        self.platform == "ruby"
    }
}

impl LatestVersion {
    /// The registry reports "unknown" when the gem has no versions
    pub fn is_known(&self) -> bool {
        self.version != "unknown"
    }
}
