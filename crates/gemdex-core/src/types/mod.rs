//! Model types for the RubyGems.org API payloads.
//!
//! Each module mirrors one family of API responses. All types are plain
//! serde structs; decoding is the only validation performed.

pub mod dependency;
pub mod downloads;
pub mod package;
pub mod version;

pub use dependency::DependencyInfo;
pub use downloads::{RepositoryDownloadCount, VersionDownloadCount};
pub use package::{is_valid_gem_name, GemDependencies, GemDependency, PackageInformation};
pub use version::{GemVersion, LatestVersion};
