//! HTTP client for the RubyGems API with connection pooling and retry logic.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use gemdex_core::error::GemdexError;
use gemdex_core::types::{
    is_valid_gem_name, DependencyInfo, GemVersion, LatestVersion, PackageInformation,
    RepositoryDownloadCount, VersionDownloadCount,
};

use crate::repository::Repository;
use crate::retry::RetryPolicy;
use crate::RegistryResult;

/// Canonical RubyGems server
pub const DEFAULT_SERVER_URL: &str = "https://rubygems.org";

/// Ruby China mirror, usually the fastest choice from mainland China
pub const RUBY_CHINA_SERVER_URL: &str = "https://gems.ruby-china.com";

/// Tsinghua University mirror
pub const TSINGHUA_SERVER_URL: &str = "https://mirrors.tuna.tsinghua.edu.cn/rubygems";

/// Configuration for a registry client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the registry server; mirrors may carry a path prefix
    pub server_url: String,
    /// Proxy URL for outgoing requests
    pub proxy: Option<String>,
    /// API token, sent as a bearer Authorization header
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy; `None` disables retrying
    pub retry: Option<RetryPolicy>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            proxy: None,
            token: None,
            timeout: Duration::from_secs(30),
            retry: Some(RetryPolicy::default()),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different registry server
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Route requests through the given proxy
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Authenticate requests with an API token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Disable retrying entirely
    pub fn without_retry(mut self) -> Self {
        self.retry = None;
        self
    }
}

/// HTTP client implementing the RubyGems API operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    http: Client,
    /// Parsed base URL, normalized to end with a slash so joins keep any
    /// mirror path prefix
    base_url: Url,
    /// Client configuration
    options: ClientOptions,
}

impl RegistryClient {
    /// Create a client against the canonical RubyGems server
    pub fn new() -> RegistryResult<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Create a client against the Ruby China mirror
    pub fn ruby_china() -> RegistryResult<Self> {
        Self::with_options(ClientOptions::default().with_server_url(RUBY_CHINA_SERVER_URL))
    }

    /// Create a client against the Tsinghua University mirror
    pub fn tsinghua() -> RegistryResult<Self> {
        Self::with_options(ClientOptions::default().with_server_url(TSINGHUA_SERVER_URL))
    }

    /// Create a client with custom configuration
    pub fn with_options(options: ClientOptions) -> RegistryResult<Self> {
        let base_url = parse_base_url(&options.server_url)?;

        let mut builder = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(options.timeout)
            // Enable gzip compression
            .gzip(true)
            // User agent
            .user_agent("gemdex/0.1.0");

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| GemdexError::invalid_request(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(token) = &options.token {
            builder = builder.default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    format!("Bearer {token}").parse().map_err(|e| {
                        GemdexError::invalid_request(format!("invalid API token: {e}"))
                    })?,
                );
                headers
            });
        }

        let http = builder
            .build()
            .map_err(|e| GemdexError::network("failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            http,
            base_url,
            options,
        })
    }

    /// Client configuration in use
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Resolve a relative API path against the base URL
    fn endpoint(&self, path: &str) -> RegistryResult<Url> {
        self.base_url.join(path).map_err(|e| {
            GemdexError::invalid_request(format!("invalid endpoint path '{path}': {e}"))
        })
    }

    /// GET `url` and decode the JSON body, retrying per the client policy
    async fn get_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        url: Url,
    ) -> RegistryResult<T> {
        debug!(url = %url, "registry GET");
        match &self.options.retry {
            Some(policy) => policy.execute(cancel, || self.fetch_json(cancel, &url)).await,
            None => {
                if cancel.is_cancelled() {
                    return Err(GemdexError::Cancelled);
                }
                self.fetch_json(cancel, &url).await
            }
        }
    }

    /// One GET attempt, raced against the cancellation token
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        url: &Url,
    ) -> RegistryResult<T> {
        let send = self.http.get(url.clone()).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(GemdexError::Cancelled),
            result = send => result.map_err(|e| classify_transport_error(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(GemdexError::from_status(status.as_u16(), url.as_str()));
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(GemdexError::Cancelled),
            body = response.json::<T>() => body.map_err(|e| classify_transport_error(url, e)),
        }
    }
}

#[async_trait]
impl Repository for RegistryClient {
    async fn get_package(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<PackageInformation> {
        check_gem_name(name)?;
        let url = self.endpoint(&format!("api/v1/gems/{name}.json"))?;
        self.get_json(cancel, url).await
    }

    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
        page: u32,
    ) -> RegistryResult<Vec<PackageInformation>> {
        // Page numbering starts at 1
        let page = page.max(1);
        let mut url = self.endpoint("api/v1/search.json")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("page", &page.to_string());
        self.get_json(cancel, url).await
    }

    async fn get_versions(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<GemVersion>> {
        check_gem_name(name)?;
        let url = self.endpoint(&format!("api/v1/versions/{name}.json"))?;
        self.get_json(cancel, url).await
    }

    async fn get_latest_version(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<LatestVersion> {
        check_gem_name(name)?;
        let url = self.endpoint(&format!("api/v1/versions/{name}/latest.json"))?;
        self.get_json(cancel, url).await
    }

    async fn get_timeframe_versions(
        &self,
        cancel: &CancellationToken,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RegistryResult<Vec<GemVersion>> {
        let mut url = self.endpoint("api/v1/timeframe_versions.json")?;
        url.query_pairs_mut()
            .append_pair("from", &from.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("to", &to.to_rfc3339_opts(SecondsFormat::Secs, true));
        self.get_json(cancel, url).await
    }

    async fn total_downloads(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<RepositoryDownloadCount> {
        let url = self.endpoint("api/v1/downloads.json")?;
        self.get_json(cancel, url).await
    }

    async fn version_downloads(
        &self,
        cancel: &CancellationToken,
        name: &str,
        version: &str,
    ) -> RegistryResult<VersionDownloadCount> {
        check_gem_name(name)?;
        check_version(version)?;
        let url = self.endpoint(&format!("api/v1/downloads/{name}-{version}.json"))?;
        self.get_json(cancel, url).await
    }

    async fn get_dependencies(
        &self,
        cancel: &CancellationToken,
        names: &[&str],
    ) -> RegistryResult<Vec<DependencyInfo>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        for name in names {
            check_gem_name(name)?;
        }

        let mut url = self.endpoint("api/v1/dependencies")?;
        url.query_pairs_mut().append_pair("gems", &names.join(","));
        match self.get_json(cancel, url).await {
            Err(error) if error.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    async fn latest_gems(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageInformation>> {
        let url = self.endpoint("api/v1/activity/latest.json")?;
        self.get_json(cancel, url).await
    }

    async fn get_reverse_dependencies(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<Vec<String>> {
        check_gem_name(name)?;
        let url = self.endpoint(&format!("api/v1/gems/{name}/reverse_dependencies.json"))?;
        match self.get_json(cancel, url).await {
            Err(error) if error.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Normalize the configured server URL into a joinable base
fn parse_base_url(server_url: &str) -> RegistryResult<Url> {
    let normalized = format!("{}/", server_url.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|e| {
        GemdexError::invalid_request(format!("invalid server URL '{server_url}': {e}"))
    })
}

fn check_gem_name(name: &str) -> RegistryResult<()> {
    if is_valid_gem_name(name) {
        Ok(())
    } else {
        Err(GemdexError::invalid_request(format!(
            "invalid gem name '{name}'"
        )))
    }
}

fn check_version(version: &str) -> RegistryResult<()> {
    // Version strings share the gem name charset
    if is_valid_gem_name(version) {
        Ok(())
    } else {
        Err(GemdexError::invalid_request(format!(
            "invalid gem version '{version}'"
        )))
    }
}

fn classify_transport_error(url: &Url, error: reqwest::Error) -> GemdexError {
    if error.is_timeout() {
        GemdexError::Timeout
    } else if error.is_decode() {
        GemdexError::Decode {
            message: error.to_string(),
        }
    } else {
        GemdexError::network(format!("request to {url} failed"), error)
    }
}
