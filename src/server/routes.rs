//! Router configuration for the image chunker.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health              - Health check
//! /api/chunk-image     - Chunk endpoint
//! /chunk-image         - Alias of /api/chunk-image
//! ```
//!
//! # Example
//!
//! ```ignore
//! use image_chunker::chunk::ChunkService;
//! use image_chunker::server::routes::{create_router, RouterConfig};
//!
//! let chunk_service = ChunkService::new(fetcher);
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(chunk_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::num::NonZeroU32;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{chunk_image_handler, health_handler, AppState};
use crate::chunk::{ChunkService, DEFAULT_CHUNK_HEIGHT};
use crate::fetch::ImageFetcher;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Chunk height used when the request omits `chunkHeight`
    pub default_chunk_height: NonZeroU32,

    /// Whether 5xx bodies include a `stack` field
    pub debug_errors: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Default chunk height is 7000 pixels
    /// - Error bodies omit `stack`
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            default_chunk_height: DEFAULT_CHUNK_HEIGHT,
            debug_errors: false,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the default chunk height.
    pub fn with_default_chunk_height(mut self, chunk_height: NonZeroU32) -> Self {
        self.default_chunk_height = chunk_height;
        self
    }

    /// Enable or disable `stack` fields in 5xx bodies.
    pub fn with_debug_errors(mut self, enabled: bool) -> Self {
        self.debug_errors = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `chunk_service` - The chunk service for handling chunk requests
/// * `config` - Router configuration
pub fn create_router<F>(chunk_service: ChunkService<F>, config: RouterConfig) -> Router
where
    F: ImageFetcher + 'static,
{
    let app_state = AppState::new(chunk_service)
        .with_default_chunk_height(config.default_chunk_height)
        .with_debug_errors(config.debug_errors);

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/chunk-image", get(chunk_image_handler::<F>))
        .route("/chunk-image", get(chunk_image_handler::<F>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
