//! Abstract interface over the RubyGems API operations.
//!
//! `RegistryClient` is the plain HTTP implementation and `CachedRepository`
//! layers caching on top of any other implementation. Every method takes a
//! cancellation token; cancelling it aborts in-flight requests and backoff
//! waits with `GemdexError::Cancelled`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use gemdex_core::types::{
    DependencyInfo, GemVersion, LatestVersion, PackageInformation, RepositoryDownloadCount,
    VersionDownloadCount,
};

use crate::RegistryResult;

/// RubyGems API operations
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch detailed information about a gem by name
    async fn get_package(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<PackageInformation>;

    /// Search gems matching `query`; pages start at 1 and an empty page
    /// marks the end of the results
    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
        page: u32,
    ) -> RegistryResult<Vec<PackageInformation>>;

    /// Fetch every released version of a gem, newest first
    async fn get_versions(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<GemVersion>>;

    /// Fetch the latest published version of a gem
    async fn get_latest_version(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<LatestVersion>;

    /// Fetch the versions published between `from` and `to`
    async fn get_timeframe_versions(
        &self,
        cancel: &CancellationToken,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RegistryResult<Vec<GemVersion>>;

    /// Fetch the total download count served by the registry
    async fn total_downloads(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<RepositoryDownloadCount>;

    /// Fetch the download counts for one version of a gem
    async fn version_downloads(
        &self,
        cancel: &CancellationToken,
        name: &str,
        version: &str,
    ) -> RegistryResult<VersionDownloadCount>;

    /// Fetch the dependency records for the given gems; unknown gems yield
    /// an empty list rather than an error
    async fn get_dependencies(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> RegistryResult<Vec<DependencyInfo>>;

    /// Fetch the most recently published gems
    async fn latest_gems(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageInformation>>;

    /// Fetch the names of the gems depending on `name`; unknown gems yield
    /// an empty list rather than an error
    async fn get_reverse_dependencies(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<String>>;
}
