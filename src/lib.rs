//! # product-lookup
//!
//! A small HTTP service that looks up catalog items by ASIN and serves them
//! as flat JSON records, with a read-through/write-through cache in front of
//! the catalog (a directory of JSON files or a Redis instance).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use product_lookup::cache::CacheMode;
//! use product_lookup::config::Config;
//! use product_lookup::middleware::{LoggerMiddleware, Pipeline};
//! use product_lookup::server::Server;
//! use product_lookup::service::LookupService;
//! use product_lookup::upstream::CatalogClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let cache = CacheMode::from_settings(&config.cache).await?;
//!     let catalog = Arc::new(CatalogClient::new(&config.upstream));
//!     let service = Arc::new(LookupService::new(catalog, cache));
//!
//!     let stack = Pipeline::new(service.router())
//!         .with(Arc::new(LoggerMiddleware))
//!         .build();
//!     Server::bind(config.bind_addr()).await?.run(stack).await?;
//!     Ok(())
//! }
//! ```

// ── HTTP plumbing ─────────────────────────────────────────────────────────────
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

// ── Lookup service ────────────────────────────────────────────────────────────
pub mod cache;
pub mod config;
pub mod error;
pub mod record;
pub mod service;
pub mod upstream;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
