//! # gemdex-core
//!
//! Core types shared across the gemdex crates.
//!
//! This crate provides:
//! - Model types for the RubyGems.org API payloads (gems, versions,
//!   dependencies, download counts)
//! - GemdexError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: API payload models (PackageInformation, GemVersion, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{GemdexError, GemdexResult};
pub use types::{
    DependencyInfo, GemDependencies, GemDependency, GemVersion, LatestVersion, PackageInformation,
    RepositoryDownloadCount, VersionDownloadCount,
};
