//! Reverse dependency types.
//!
//! Defines the record returned by `/api/v1/dependencies` and the
//! reverse-dependencies endpoint.

use serde::{Deserialize, Serialize};

/// One dependency edge between two gems
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DependencyInfo {
    /// Gem that is depended on
    pub name: String,
    /// Gem declaring the dependency
    #[serde(default)]
    pub dependent_name: String,
    /// Version requirement, e.g. ">= 1.0.0"
    #[serde(default)]
    pub requirements: String,
    /// "runtime" or "development"
    #[serde(default)]
    pub dependent_type: String,
}

impl DependencyInfo {
    /// Check whether this is a runtime dependency edge
    pub fn is_runtime(&self) -> bool {
        self.dependent_type == "runtime"
    }
}
