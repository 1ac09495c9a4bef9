//! Fetch many gems concurrently through the bulk worker pool.
//!
//! Run with `cargo run --example bulk`.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use gemdex_registry::{BulkClient, BulkOptions, RegistryClient};

const GEMS: [&str; 10] = [
    "rails",
    "rack",
    "activesupport",
    "rake",
    "concurrent-ruby",
    "i18n",
    "minitest",
    "tzinfo",
    "nokogiri",
    "zeitwerk",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("gemdex_registry=info")
        .with_target(false)
        .init();

    let cancel = CancellationToken::new();
    let client = RegistryClient::new()?;
    let bulk = BulkClient::with_options(client, BulkOptions::new().with_max_concurrency(5));

    let started = Instant::now();
    let results = bulk.get_packages(&cancel, &GEMS).await;
    println!(
        "fetched {} packages in {:?}",
        results.len(),
        started.elapsed()
    );

    for result in &results {
        match &result.result {
            Ok(package) => println!(
                "  {} {} ({} downloads)",
                package.name, package.version, package.downloads
            ),
            Err(error) => println!("  {} failed: {error}", result.key),
        }
    }

    let started = Instant::now();
    let versions = bulk.get_versions(&cancel, &GEMS[..5]).await;
    println!(
        "fetched {} version lists in {:?}",
        versions.len(),
        started.elapsed()
    );
    for result in &versions {
        if let Some(versions) = result.value() {
            let latest: Vec<&str> = versions.iter().take(5).map(|v| v.number.as_str()).collect();
            println!(
                "  {}: {} versions, newest {}",
                result.key,
                versions.len(),
                latest.join(", ")
            );
        }
    }

    let dependencies = bulk.get_dependencies(&cancel, &GEMS[..5]).await;
    for result in &dependencies {
        if let Some(records) = result.value() {
            println!("  {} has {} dependency records", result.key, records.len());
            for record in records.iter().take(5) {
                println!("    {} ({})", record.name, record.requirements);
            }
        }
    }

    Ok(())
}
