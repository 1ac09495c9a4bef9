//! Read-through caching decorator for any [`Repository`] implementation.
//!
//! [`CachedRepository`] wraps an inner repository and serves repeated
//! lookups from a [`MemoryCache`]. Stable data (package metadata, version
//! lists, dependency edges) is kept for the full default TTL; volatile data
//! (search results, download counters, the latest-gems feed) is kept for a
//! fraction of it. Errors are never cached, so a transient failure does not
//! poison later lookups.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use gemdex_core::types::{
    DependencyInfo, GemVersion, LatestVersion, PackageInformation, RepositoryDownloadCount,
    VersionDownloadCount,
};

use crate::cache::{MemoryCache, Ttl};
use crate::repository::Repository;
use crate::RegistryResult;

/// Default lifetime for cached responses (10 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default interval between background sweeps of the backing store (1 hour)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// A [`Repository`] decorator that caches responses in memory.
///
/// The wrapped value can be a [`RegistryClient`](crate::client::RegistryClient)
/// or any other `Repository`, including another decorator.
pub struct CachedRepository<R> {
    repository: R,
    cache: MemoryCache,
    default_ttl: Duration,
}

impl<R> CachedRepository<R> {
    /// Wraps `repository` with the default TTL and sweep interval.
    pub fn new(repository: R) -> Self {
        Self::with_cache(
            repository,
            DEFAULT_CACHE_TTL,
            MemoryCache::new(DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL),
        )
    }

    /// Wraps `repository` with a custom default TTL.
    ///
    /// The backing store sweeps expired entries every `2 * default_ttl`. A
    /// zero TTL disables the sweep and leaves expiry to the store's own
    /// fallback lifetime.
    pub fn with_ttl(repository: R, default_ttl: Duration) -> Self {
        Self::with_cache(
            repository,
            default_ttl,
            MemoryCache::new(default_ttl, default_ttl * 2),
        )
    }

    /// Wraps `repository` around a caller-provided store.
    ///
    /// Useful for sharing one [`MemoryCache`] between several decorators.
    pub fn with_cache(repository: R, default_ttl: Duration, cache: MemoryCache) -> Self {
        Self {
            repository,
            cache,
            default_ttl,
        }
    }

    /// Returns the wrapped repository.
    pub fn inner(&self) -> &R {
        &self.repository
    }

    /// Removes every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of entries currently held, including expired ones that have
    /// not been swept yet.
    pub fn cache_stats(&self) -> usize {
        self.cache.len()
    }

    /// Stops the background sweep of the backing store. Safe to call more
    /// than once; lookups keep working afterwards.
    pub fn close(&self) {
        self.cache.close();
    }

    /// TTL used for the stable-data tier.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn read_through<T, F, Fut>(&self, key: String, ttl: Ttl, fetch: F) -> RegistryResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        if let Some(hit) = self.cache.get_as::<T>(&key) {
            debug!(key = %key, "cache hit");
            return Ok((*hit).clone());
        }

        let value = fetch().await?;
        self.cache.set_with_ttl(&key, value.clone(), ttl);
        Ok(value)
    }

    fn full_ttl(&self) -> Ttl {
        Ttl::For(self.default_ttl)
    }

    fn half_ttl(&self) -> Ttl {
        Ttl::For(self.default_ttl / 2)
    }

    fn quarter_ttl(&self) -> Ttl {
        Ttl::For(self.default_ttl / 4)
    }
}

#[async_trait]
impl<R: Repository> Repository for CachedRepository<R> {
    async fn get_package(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<PackageInformation> {
        self.read_through(format!("package:{name}"), self.full_ttl(), || {
            self.repository.get_package(cancel, name)
        })
        .await
    }

    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
        page: u32,
    ) -> RegistryResult<Vec<PackageInformation>> {
        self.read_through(format!("search:{query}:{page}"), self.half_ttl(), || {
            self.repository.search(cancel, query, page)
        })
        .await
    }

    async fn get_versions(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<GemVersion>> {
        self.read_through(format!("versions:{name}"), self.full_ttl(), || {
            self.repository.get_versions(cancel, name)
        })
        .await
    }

    async fn get_latest_version(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<LatestVersion> {
        self.read_through(format!("latest_version:{name}"), self.half_ttl(), || {
            self.repository.get_latest_version(cancel, name)
        })
        .await
    }

    async fn get_timeframe_versions(
        &self,
        cancel: &CancellationToken,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RegistryResult<Vec<GemVersion>> {
        let key = format!(
            "timeframe:{}:{}",
            from.to_rfc3339_opts(SecondsFormat::Secs, true),
            to.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        self.read_through(key, self.full_ttl(), || {
            self.repository.get_timeframe_versions(cancel, from, to)
        })
        .await
    }

    async fn total_downloads(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<RepositoryDownloadCount> {
        self.read_through("downloads".to_string(), self.half_ttl(), || {
            self.repository.total_downloads(cancel)
        })
        .await
    }

    async fn version_downloads(
        &self,
        cancel: &CancellationToken,
        name: &str,
        version: &str,
    ) -> RegistryResult<VersionDownloadCount> {
        let key = format!("version_downloads:{name}:{version}");
        self.read_through(key, self.half_ttl(), || {
            self.repository.version_downloads(cancel, name, version)
        })
        .await
    }

    async fn get_dependencies(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> RegistryResult<Vec<DependencyInfo>> {
        // Keys are order-sensitive: ["a", "b"] and ["b", "a"] cache separately.
        let key = format!("dependencies:{}", names.join(","));
        self.read_through(key, self.full_ttl(), || {
            self.repository.get_dependencies(cancel, names)
        })
        .await
    }

    async fn latest_gems(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageInformation>> {
        self.read_through("latest_gems".to_string(), self.quarter_ttl(), || {
            self.repository.latest_gems(cancel)
        })
        .await
    }

    async fn get_reverse_dependencies(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<String>> {
        self.read_through(format!("reverse_dependencies:{name}"), self.full_ttl(), || {
            self.repository.get_reverse_dependencies(cancel, name)
        })
        .await
    }
}
