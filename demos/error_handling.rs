//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Tell API failures apart by variant
//! - Read the message and raw body of a failed call
//! - Honor rate limit hints
//! - Catch local validation before any request is sent
//! - Recognize connectivity failures
//!
//! Run with: `BUNDLEUP_API_KEY=... cargo run --example error_handling`

use bundleup::{BundleUp, Error, ListParams};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("bundleup=info")
        .init();

    let bundleup = BundleUp::from_env()?;

    println!("=== Example 1: Mapping API errors ===");
    match bundleup.connections().retrieve("conn_does_not_exist").await {
        Ok(connection) => println!("Found: {:?}", connection),
        Err(Error::NotFound(err)) => {
            println!("Not found!");
            println!("  Status: {}", err.status);
            println!("  Message: {}", err.message);
            println!("  Raw response: {}", err.raw_response);
            println!("  Content-Type: {:?}", err.headers.get("content-type"));
        }
        Err(Error::Authentication(err)) => println!("Check BUNDLEUP_API_KEY: {}", err.message),
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Rate limits ===");
    match bundleup.integrations().list(&ListParams::new()).await {
        Ok(integrations) => println!("{} integrations", integrations.len()),
        Err(Error::RateLimit(err)) => {
            let wait = err
                .rate_limit_info
                .as_ref()
                .and_then(|info| info.delay(Duration::from_secs(60)));
            println!("Rate limited, the API asks us to wait {:?}", wait);
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 3: Local validation ===");
    // Webhooks need both `url` and `events`; nothing is sent without them.
    match bundleup
        .webhooks()
        .create(&json!({"url": "https://example.com/webhook"}))
        .await
    {
        Ok(_) => println!("Unexpected success"),
        Err(Error::Validation(message)) => println!("Rejected locally: {}", message),
        Err(e) => println!("Other error: {}", e),
    }

    match bundleup.proxy("") {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Rejected locally: {}", e),
    }
    println!();

    println!("=== Example 4: Connectivity ===");
    let unreachable = BundleUp::builder()
        .api_key("any-key")
        .base_url("https://this-domain-does-not-exist-12345.com/v1")?
        .timeout(Duration::from_secs(5))
        .build()
        .map(BundleUp::from_client)?;

    match unreachable.webhooks().list(&ListParams::new()).await {
        Ok(_) => println!("Unexpected success"),
        Err(e) if e.is_connectivity() => {
            println!("API unreachable: {}", e);
            println!("  Status: {:?}", e.status());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 5: Generic inspection ===");
    match bundleup.connections().delete("conn_does_not_exist").await {
        Ok(()) => println!("Deleted"),
        Err(e) => {
            println!("Error occurred: {}", e);
            println!("  From the API: {}", e.is_api_error());
            if let Some(status) = e.status() {
                println!("  HTTP status: {}", status);
            }
            if let Some(raw) = e.raw_response() {
                println!("  Raw response available: {} bytes", raw.len());
            }
        }
    }

    bundleup.close();
    Ok(())
}
