//! Image Chunker - splits tall images into fixed-height PNG chunks.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_chunker::{chunk::ChunkService, config::Config, create_router, fetch::HttpImageFetcher};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let router_config = match config.router_config() {
        Ok(router_config) => router_config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Image Chunker v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Default chunk height: {}px", config.default_chunk_height);
    info!(
        "  Max image size: {}MB",
        config.max_image_bytes / (1024 * 1024)
    );
    info!("  Fetch timeout: {}s", config.fetch_timeout_secs);
    if config.debug_errors {
        info!("  Debug errors: enabled (5xx bodies include stack)");
    }

    // Create fetcher and chunk service
    let fetcher = match HttpImageFetcher::new(config.fetch_timeout(), config.max_image_bytes) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let chunk_service = ChunkService::new(fetcher);

    let router = create_router(chunk_service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl 'http://{}/api/chunk-image?imageUrl=<url>&chunkHeight=7000'",
        addr
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_chunker=debug,tower_http=debug"
    } else {
        "image_chunker=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
