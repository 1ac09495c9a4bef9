//! Download count types.
//!
//! Defines the payloads of `/api/v1/downloads.json` and
//! `/api/v1/downloads/{name}-{version}.json`.

use serde::{Deserialize, Serialize};

/// Total downloads served by the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositoryDownloadCount {
    #[serde(rename = "total")]
    pub total_downloads: u64,
}

/// Download counts for one version of a gem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionDownloadCount {
    pub version_downloads: u64,
    pub total_downloads: u64,
}
