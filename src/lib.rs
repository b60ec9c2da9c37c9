//! # BundleUp - Rust SDK for the BundleUp API
//!
//! A typed async client for BundleUp connections, integrations and webhooks,
//! the connection-scoped proxy and the unify API. Built on top of `reqwest`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bundleup::{BundleUp, ListParams};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bundleup::Error> {
//!     let bundleup = BundleUp::new("your-api-key")?;
//!
//!     // Collections
//!     let connections = bundleup.connections().list(&ListParams::new().limit(50)).await?;
//!     println!("Found {} connections", connections.len());
//!
//!     let webhook = bundleup
//!         .webhooks()
//!         .create(&json!({
//!             "url": "https://example.com/webhook",
//!             "events": ["connection.created", "connection.updated"]
//!         }))
//!         .await?;
//!     println!("Created webhook {:?}", webhook.id);
//!
//!     // Passthrough to the provider behind a connection
//!     let proxy = bundleup.proxy("connection-id")?;
//!     let users: serde_json::Value = proxy.get("/users").await?;
//!     println!("Users: {}", users);
//!
//!     // Normalized views
//!     let unify = bundleup.unify("connection-id")?;
//!     let issues = unify.pm().issues(&ListParams::new().limit(100)).await?;
//!     println!("Found {} issues", issues.data.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Collections** - list, create, retrieve, update and delete connections, integrations and webhooks
//! - **Proxy** - forward any verb and path to the third-party API behind a connection
//! - **Unify** - normalized chat, git and project management data with cursor pagination
//! - **Typed errors** - one [`Error`] enum with a variant per failure kind
//! - **Local validation** - empty ids and incomplete payloads fail before any request is sent
//! - **Logging** - structured `tracing` events for every request and response
//! - **Connection pooling** - one pool shared by every sub-client, released on [`BundleUp::close`]
//!
//! ## Error Handling
//!
//! API failures map onto dedicated variants; connectivity failures are kept
//! apart so "the API said no" is never confused with "the API was unreachable":
//!
//! ```no_run
//! use bundleup::{BundleUp, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let bundleup = BundleUp::new("your-api-key")?;
//! match bundleup.integrations().retrieve("int_github").await {
//!     Ok(integration) => println!("{:?}", integration.name),
//!     Err(Error::Authentication(err)) => eprintln!("Check your API key: {}", err.message),
//!     Err(Error::NotFound(_)) => eprintln!("No such integration"),
//!     Err(Error::RateLimit(err)) => {
//!         let wait = err.rate_limit_info.as_ref().and_then(|info| info.retry_after);
//!         eprintln!("Rate limited, retry after {:?}", wait);
//!     }
//!     Err(Error::Api(err)) => eprintln!("API error {}: {}", err.status, err.message),
//!     Err(e) if e.is_connectivity() => eprintln!("API unreachable: {}", e),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoped Usage
//!
//! [`BundleUp::scope`] returns a guard that closes the client when dropped,
//! on every exit path. Later calls fail with [`Error::Closed`].

mod client;
mod error;
pub mod metadata;
pub mod models;
mod pagination;
pub mod proxy;
pub mod rate_limit;
pub mod resource;
mod response;
mod sdk;
pub mod unify;
mod validate;

pub use client::{Client, ClientBuilder, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::{ApiError, Error, Result};
pub use metadata::{QueryParams, QueryValue, RequestMetadata};
pub use models::{Connection, Integration, Webhook};
pub use pagination::{ListParams, Page, PageMetadata};
pub use proxy::Proxy;
pub use resource::{Connections, Integrations, Resource, ResourceKind, Webhooks};
pub use response::Response;
pub use sdk::{BundleUp, ScopedClient};
pub use unify::Unify;
