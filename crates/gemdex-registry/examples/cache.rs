//! Wrap a client in the caching decorator and watch repeated lookups skip
//! the network.
//!
//! Run with `cargo run --example cache`.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use gemdex_registry::{CachedRepository, MemoryCache, RegistryClient, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("gemdex_registry=debug")
        .with_target(false)
        .init();

    let cancel = CancellationToken::new();
    let client = RegistryClient::new()?;
    let cached = CachedRepository::with_ttl(client, Duration::from_secs(5 * 60));

    let started = Instant::now();
    let package = cached.get_package(&cancel, "rails").await?;
    println!(
        "first lookup took {:?}: {} {}",
        started.elapsed(),
        package.name,
        package.version
    );
    println!("cache holds {} entries", cached.cache_stats());

    let started = Instant::now();
    let package = cached.get_package(&cancel, "rails").await?;
    println!(
        "second lookup took {:?}: {} {}",
        started.elapsed(),
        package.name,
        package.version
    );

    let started = Instant::now();
    let rake = cached.get_package(&cancel, "rake").await?;
    println!(
        "different gem took {:?}: {} {}",
        started.elapsed(),
        rake.name,
        rake.version
    );
    println!("cache holds {} entries", cached.cache_stats());

    // Decorators can share one store.
    let store = MemoryCache::new(Duration::from_secs(10 * 60), Duration::from_secs(30 * 60));
    let shared = CachedRepository::with_cache(
        RegistryClient::ruby_china()?,
        Duration::from_secs(10 * 60),
        store,
    );
    let mirrored = shared.get_package(&cancel, "rails").await?;
    println!("mirror answered {} {}", mirrored.name, mirrored.version);

    cached.clear_cache();
    println!("after clear: {} entries", cached.cache_stats());

    cached.close();
    shared.close();

    Ok(())
}
