//! Binary entry point: load configuration, pick the cache backend, serve.

use std::sync::Arc;

use product_lookup::cache::CacheMode;
use product_lookup::config::Config;
use product_lookup::middleware::{LoggerMiddleware, Pipeline};
use product_lookup::server::Server;
use product_lookup::service::LookupService;
use product_lookup::upstream::CatalogClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let cache = CacheMode::from_settings(&config.cache).await?;

    tracing::info!(
        port = config.port,
        region = %config.upstream.region,
        cache = cache.name(),
        "starting product lookup service"
    );

    let catalog = Arc::new(CatalogClient::new(&config.upstream));
    let service = Arc::new(LookupService::new(catalog, cache));
    let stack = Pipeline::new(service.router())
        .with(Arc::new(LoggerMiddleware))
        .build();

    let server = Server::bind(config.bind_addr()).await?;
    server
        .run_until(stack, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
