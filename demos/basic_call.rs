//! Basic example listing and creating BundleUp resources.
//!
//! This example shows how to:
//! - Build a client from the environment
//! - List connections with filters
//! - Create a webhook and clean it up again
//! - Call a connection's provider through the proxy
//! - Walk unified issues page by page
//!
//! Run with: `BUNDLEUP_API_KEY=... cargo run --example basic_call`

use bundleup::{BundleUp, Error, ListParams};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("bundleup=debug,basic_call=info")
        .init();

    let bundleup = BundleUp::from_env()?;
    let scoped = bundleup.scope();

    println!("=== Connections ===");
    let connections = scoped
        .connections()
        .list(&ListParams::new().filter("status", "active").limit(20))
        .await?;

    for connection in &connections {
        println!(
            "{} -> {}",
            connection.id.as_deref().unwrap_or("<no id>"),
            connection.integration_id.as_deref().unwrap_or("<no integration>")
        );
    }
    println!();

    println!("=== Webhooks ===");
    let webhook = scoped
        .webhooks()
        .create(&json!({
            "url": "https://example.com/webhook",
            "events": ["connection.created", "connection.updated"]
        }))
        .await?;
    println!("Created webhook {:?}", webhook.id);

    if let Some(id) = webhook.id.as_deref() {
        scoped.webhooks().delete(id).await?;
        println!("Deleted webhook {}", id);
    }
    println!();

    let Some(connection_id) = connections.iter().find_map(|c| c.id.clone()) else {
        println!("No active connection, skipping proxy and unify");
        return Ok(());
    };

    println!("=== Proxy ===");
    let proxy = scoped.proxy(connection_id.as_str())?;
    let user: Value = proxy.get("/user").await?;
    println!("Provider user: {}", user);
    println!();

    println!("=== Unified issues ===");
    let unify = scoped.unify(connection_id.as_str())?;
    let mut params = ListParams::new().limit(50);
    let mut total = 0;
    loop {
        let page = unify.pm().issues(&params).await?;
        total += page.data.len();
        match page.next_params(&params) {
            Some(next) => params = next,
            None => break,
        }
    }
    println!("Fetched {} issues", total);

    Ok(())
}
