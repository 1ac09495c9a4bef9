//! RubyGems registry client for gemdex
//!
//! This crate provides HTTP client functionality for the RubyGems API with
//! connection pooling, retry logic, response caching, and bounded-concurrency
//! bulk fetching. The official server and the common mirror servers are
//! supported out of the box.

pub mod bulk;
pub mod cache;
pub mod cached;
pub mod client;
pub mod repository;
pub mod retry;

// Re-export main types
pub use bulk::{BulkClient, BulkOptions, BulkResult};
pub use cache::{MemoryCache, Ttl};
pub use cached::{CachedRepository, DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL};
pub use client::{
    ClientOptions, RegistryClient, DEFAULT_SERVER_URL, RUBY_CHINA_SERVER_URL, TSINGHUA_SERVER_URL,
};
pub use repository::Repository;
pub use retry::RetryPolicy;

use gemdex_core::error::GemdexError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, GemdexError>;
