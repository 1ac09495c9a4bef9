//! Concurrency-safe in-memory cache with per-entry expiry and a background
//! sweep task.
//!
//! Values are stored type-erased so one store can hold every response type;
//! `get_as` recovers the concrete type and treats a mismatch as a miss.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fallback applied when a store is created with a zero default TTL
const FALLBACK_TTL: Duration = Duration::from_secs(3600);

/// Per-entry lifetime selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Use the store's default TTL
    Default,
    /// Keep until deleted, cleared, or overwritten
    Forever,
    /// Expire after the given duration; zero falls back to the default
    For(Duration),
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

struct Shared {
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    sweep_cancel: CancellationToken,
    closed: AtomicBool,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.sweep_cancel.cancel();
    }
}

/// Concurrency-safe expiring key/value store
///
/// Clones are cheap handles onto the same storage. Expired entries behave
/// as misses immediately and are physically removed by the sweep task; until
/// then they still count towards `len`.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<Shared>,
}

impl MemoryCache {
    /// Create a store with the given default TTL and sweep interval.
    ///
    /// A zero `default_ttl` falls back to one hour. A zero `sweep_interval`
    /// disables the background sweep, leaving expired entries to lazy
    /// eviction only. With a non-zero interval this must be called inside a
    /// tokio runtime.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::new()),
            default_ttl: if default_ttl.is_zero() {
                FALLBACK_TTL
            } else {
                default_ttl
            },
            sweep_cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
        });

        if !sweep_interval.is_zero() {
            spawn_sweep_task(Arc::downgrade(&shared), sweep_interval);
        }

        Self { inner: shared }
    }

    /// Store a value under the default TTL
    pub fn set<V: Any + Send + Sync>(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, Ttl::Default);
    }

    /// Store a value with an explicit lifetime, replacing any previous entry
    /// and restarting its expiry clock
    pub fn set_with_ttl<V: Any + Send + Sync>(&self, key: &str, value: V, ttl: Ttl) {
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: self.expiry_for(ttl),
        };
        self.inner.entries.write().insert(key.to_string(), entry);
    }

    /// Fetch the raw value stored under `key`
    ///
    /// Expired entries are misses even before the sweep removes them.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        let entries = self.inner.entries.read();
        let entry = entries.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Fetch the value stored under `key`, downcast to `T`
    ///
    /// A live entry holding a different type behaves as a miss.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Remove the entry under `key`, reporting whether one existed
    pub fn remove(&self, key: &str) -> bool {
        self.inner.entries.write().remove(key).is_some()
    }

    /// Drop every entry in one atomic step
    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }

    /// Number of stored entries, counting expired ones the sweep has not
    /// removed yet
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Check whether the store holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the background sweep. Reads and writes keep working; only the
    /// automatic eviction ends. Safe to call more than once.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            self.inner.sweep_cancel.cancel();
        }
    }

    /// Check whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Default lifetime applied by `set` and `Ttl::Default`
    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    fn expiry_for(&self, ttl: Ttl) -> Option<Instant> {
        let lifetime = match ttl {
            Ttl::Forever => return None,
            Ttl::Default => self.inner.default_ttl,
            Ttl::For(d) if d.is_zero() => self.inner.default_ttl,
            Ttl::For(d) => d,
        };
        // Lifetimes too large to represent never expire
        Instant::now().checked_add(lifetime)
    }
}

/// Periodically remove expired entries until the token fires or every handle
/// to the store is gone. Holds only a weak reference so the task never keeps
/// the store alive on its own.
fn spawn_sweep_task(weak: Weak<Shared>, sweep_interval: Duration) {
    let cancel = match weak.upgrade() {
        Some(shared) => shared.sweep_cancel.clone(),
        None => return,
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(shared) = weak.upgrade() else { break };
            let now = Instant::now();
            let mut entries = shared.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            let removed = before - entries.len();
            drop(entries);

            if removed > 0 {
                debug!(removed, "cache sweep removed expired entries");
            }
        }

        debug!("cache sweep task stopped");
    });
}

#[cfg(test)]
mod tests;
