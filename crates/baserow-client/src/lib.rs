//! Baserow Client SDK
//!
//! A Rust HTTP client for the Baserow REST API: list, read, create, update
//! and delete table rows, and read table field metadata.
//!
//! # Features
//!
//! - **Typed handles**: `client.base(id).table(id)` addresses a table
//! - **Query builder**: paging, sorting, field selection, filter trees and
//!   `filter__` keyword filters flattened into Baserow query parameters
//! - **Open-schema rows**: field lookups never fail on unknown names
//! - **Query cache**: optional per-call freshness window for `select`
//! - **Structured errors**: every status >= 400 carries status, URL and body
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use baserow_client::{BaserowClient, ClientConfig, RowQuery, Sort};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BaserowClient::new(
//!         ClientConfig::builder("your_database_token")
//!             .base_url("https://baserow.example.com")
//!             .timeout(Duration::from_secs(30))
//!             .build()?
//!     )?;
//!
//!     let table = client.base(39).table(171);
//!
//!     // One page, newest first, cached for a minute
//!     let query = RowQuery::new()
//!         .page_size(100)
//!         .sort([Sort::desc("Created")])
//!         .filters(json!({
//!             "filter_type": "AND",
//!             "filters": [{"type": "equal", "field": "Status", "value": "done"}],
//!             "groups": []
//!         }));
//!     let rows = table.select(&query, Some(Duration::from_secs(60))).await?;
//!     for row in &rows {
//!         println!("{:?}", row.get("Name"));
//!     }
//!
//!     // Mutations
//!     let created = table.create(&json!({"Name": "new"}), true, None).await?;
//!     let id = created.id().unwrap_or_default();
//!     table.update(id, &json!({"Name": "renamed"}), true).await?;
//!     table.delete(id).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Caching
//!
//! `Table::select` takes an optional TTL:
//!
//! - `None` always goes to the server
//! - `Some(ttl)` reuses a page fetched with the same parameters within `ttl`
//! - Writes never invalidate cached pages; call `clear_cache()` if needed
//! - Use `no_cache()` on the config builder, or inject a [`NoopQueryCache`]
//!   with `BaserowClient::with_cache`, to disable caching
//!
//! # Error Handling
//!
//! All operations return `Result<T, ClientError>`:
//!
//! - `Api`: the server answered with status >= 400 (see [`ApiError`])
//! - `Http`: transport failure (connection, DNS, TLS, timeout)
//! - `InvalidResponse`: a success body that could not be decoded
//!
//! Nothing is retried.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-exports for convenience
pub use cache::{CacheStats, MemoryQueryCache, NoopQueryCache, QueryCache};
pub use client::{Base, BaserowClient, Table};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
pub use error::{ApiError, ClientError, ErrorDetail, Result};
pub use query::{FilterType, RowQuery, Sort, SortDirection, FILTER_PREFIX};
pub use types::{Field, Row, RowList};
