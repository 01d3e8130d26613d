//! Image search service entry point

use anyhow::{Context, Result};
use image_search_rs::{
    config,
    network::{HttpClient, RetryPolicy},
    pipeline::Pipeline,
    provider::UnsplashProvider,
    search::ImageSearch,
    storage::FileStorage,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting image-search-rs v{}", image_search_rs::VERSION);

    // Load configuration
    let settings = config::load()?;
    info!(
        environment = ?settings.server.environment,
        output_directory = %settings.image_processing.output_directory.display(),
        "Configuration loaded"
    );

    // One connection pool, two default timeouts
    let client = HttpClient::new()?;
    let download_client = client
        .clone()
        .with_default_timeout(settings.image_processing.download_timeout());

    let provider = UnsplashProvider::new(
        client,
        &settings.unsplash,
        RetryPolicy::from_settings(&settings.retry),
    );

    let storage = FileStorage::new(
        &settings.image_processing.output_directory,
        &settings.image_processing.public_prefix,
    )
    .with_context(|| {
        format!(
            "cannot create output directory {}",
            settings.image_processing.output_directory.display()
        )
    })?;

    let pipeline = Pipeline::new(
        Arc::new(download_client),
        Arc::new(storage),
        &settings.image_processing,
    );
    info!(concurrency = pipeline.concurrency(), "Image pipeline ready");

    let search = ImageSearch::new(Arc::new(provider), pipeline)
        .with_max_results(settings.unsplash.max_results);

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let app = create_router(AppState::new(settings, search));

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
