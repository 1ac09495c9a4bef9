//! Concurrent bulk fetches over any [`Repository`].
//!
//! [`BulkClient`] fans a list of gem names out to a bounded worker pool and
//! returns one [`BulkResult`] per attempted name. Failures are isolated per
//! key. Results come back in input order; with fail-fast options or
//! cancellation the list can be a strict subset of the input, never padded
//! with placeholders for names that were not attempted.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gemdex_core::error::GemdexError;
use gemdex_core::types::{DependencyInfo, GemVersion, PackageInformation};

use crate::repository::Repository;
use crate::RegistryResult;

/// Default upper bound on concurrent requests
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Options for bulk fetches
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Upper bound on concurrent requests. Clamped to the number of names
    /// actually submitted.
    pub max_concurrency: usize,
    /// When `false`, the first failure stops dispatch of further names and
    /// the result list becomes a subset of the input.
    pub continue_on_error: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            continue_on_error: true,
        }
    }
}

impl BulkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concurrency bound. Zero is ignored.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        if max_concurrency > 0 {
            self.max_concurrency = max_concurrency;
        }
        self
    }

    /// Sets whether a failed name stops dispatch of the remaining ones.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Outcome of a single name within a bulk fetch
#[derive(Debug)]
pub struct BulkResult<T> {
    /// The input name this outcome belongs to
    pub key: String,
    /// The fetched value, or why this name failed
    pub result: RegistryResult<T>,
}

impl<T> BulkResult<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&GemdexError> {
        self.result.as_ref().err()
    }
}

/// Worker-pool executor for fetching many gems at once.
///
/// Wraps any [`Repository`], so bulk calls go through whatever retry and
/// caching layers the wrapped value already has.
pub struct BulkClient<R> {
    repository: Arc<R>,
    options: BulkOptions,
}

impl<R: Repository + 'static> BulkClient<R> {
    pub fn new(repository: R) -> Self {
        Self::with_options(repository, BulkOptions::default())
    }

    pub fn with_options(repository: R, options: BulkOptions) -> Self {
        Self {
            repository: Arc::new(repository),
            options,
        }
    }

    pub fn options(&self) -> &BulkOptions {
        &self.options
    }

    /// Returns the wrapped repository.
    pub fn inner(&self) -> &R {
        &self.repository
    }

    /// Fetches package information for every name.
    pub async fn get_packages(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> Vec<BulkResult<PackageInformation>> {
        self.run(cancel, names, |repository, cancel, name| async move {
            repository.get_package(&cancel, &name).await
        })
        .await
    }

    /// Fetches the version history of every name.
    pub async fn get_versions(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> Vec<BulkResult<Vec<GemVersion>>> {
        self.run(cancel, names, |repository, cancel, name| async move {
            repository.get_versions(&cancel, &name).await
        })
        .await
    }

    /// Fetches the dependency records of every name, one lookup per name.
    pub async fn get_dependencies(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> Vec<BulkResult<Vec<DependencyInfo>>> {
        self.run(cancel, names, |repository, cancel, name| async move {
            repository.get_dependencies(&cancel, &[name.as_str()]).await
        })
        .await
    }

    /// Fetches the reverse dependencies of every name.
    pub async fn get_reverse_dependencies(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> Vec<BulkResult<Vec<String>>> {
        self.run(cancel, names, |repository, cancel, name| async move {
            repository.get_reverse_dependencies(&cancel, &name).await
        })
        .await
    }

    async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
        operation: F,
    ) -> Vec<BulkResult<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<R>, CancellationToken, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RegistryResult<T>> + Send + 'static,
    {
        if names.is_empty() {
            return Vec::new();
        }

        let inputs: Arc<Vec<String>> = Arc::new(names.iter().map(|n| n.to_string()).collect());
        let operation = Arc::new(operation);
        let cursor = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));

        let workers = self.options.max_concurrency.max(1).min(inputs.len());
        debug!(total = inputs.len(), workers, "starting bulk fetch");

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let repository = Arc::clone(&self.repository);
            let operation = Arc::clone(&operation);
            let inputs = Arc::clone(&inputs);
            let cursor = Arc::clone(&cursor);
            let failed = Arc::clone(&failed);
            let cancel = cancel.clone();
            let continue_on_error = self.options.continue_on_error;

            pool.spawn(async move {
                let mut completed = Vec::new();
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= inputs.len() {
                        break;
                    }
                    if !continue_on_error && failed.load(Ordering::SeqCst) {
                        break;
                    }

                    let key = inputs[index].clone();
                    if cancel.is_cancelled() {
                        completed.push((
                            index,
                            BulkResult {
                                key,
                                result: Err(GemdexError::Cancelled),
                            },
                        ));
                        break;
                    }

                    let result =
                        operation(Arc::clone(&repository), cancel.clone(), key.clone()).await;
                    if !continue_on_error && result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    completed.push((index, BulkResult { key, result }));
                }
                completed
            });
        }

        // Results land in per-input slots so output order matches input
        // order no matter which worker finished first.
        let mut slots: Vec<Option<BulkResult<T>>> = (0..inputs.len()).map(|_| None).collect();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(completed) => {
                    for (index, result) in completed {
                        slots[index] = Some(result);
                    }
                }
                Err(error) => warn!(error = %error, "bulk worker task failed"),
            }
        }

        slots.into_iter().flatten().collect()
    }
}
