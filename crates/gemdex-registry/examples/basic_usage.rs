//! Fetch package details, search results, versions, and download statistics
//! from the live RubyGems API.
//!
//! Run with `cargo run --example basic_usage`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use gemdex_registry::{ClientOptions, RegistryClient, Repository, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("gemdex_registry=debug")
        .with_target(false)
        .init();

    // Everything below shares one cancellation signal with a 30s deadline.
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        deadline.cancel();
    });

    let client = RegistryClient::new()?;

    let package = client.get_package(&cancel, "rails").await?;
    println!("{} {}", package.name, package.version);
    println!("  by {}", package.authors);
    println!("  {} downloads", package.downloads);
    if let Some(homepage) = &package.homepage_uri {
        println!("  {homepage}");
    }

    // Mirror clients answer the same API.
    let mirror = RegistryClient::ruby_china()?;
    let mirrored = mirror.get_package(&cancel, "rails").await?;
    println!("mirror reports {} {}", mirrored.name, mirrored.version);

    // Custom timeout and retry schedule.
    let tuned = RegistryClient::with_options(
        ClientOptions::default()
            .with_timeout(Duration::from_secs(10))
            .with_retry(
                RetryPolicy::new()
                    .with_max_attempts(5)
                    .with_initial_wait(Duration::from_millis(500)),
            ),
    )?;
    let rack = tuned.get_package(&cancel, "rack").await?;
    println!("{} {}", rack.name, rack.version);

    let results = client.search(&cancel, "http", 1).await?;
    println!("search \"http\" returned {} packages", results.len());
    for package in results.iter().take(5) {
        println!("  {} ({} downloads)", package.name, package.downloads);
    }

    let versions = client.get_versions(&cancel, "rails").await?;
    println!("rails has {} versions", versions.len());
    for version in versions.iter().take(5) {
        println!("  {} ({} downloads)", version.number, version.downloads_count);
    }

    let total = client.total_downloads(&cancel).await?;
    println!("rubygems.org has served {} downloads", total.total_downloads);

    let stats = client.version_downloads(&cancel, "rails", "7.0.5").await?;
    println!(
        "rails 7.0.5 accounts for {} of {} downloads",
        stats.version_downloads, stats.total_downloads
    );

    Ok(())
}
