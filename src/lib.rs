//! # Image Chunker
//!
//! An HTTP service that downloads an image from a URL and splits it into a
//! vertical sequence of fixed-height PNG chunks.
//!
//! Tall images often exceed downstream height or size limits. Slicing them
//! into bands that a consumer can stack back together works around those
//! limits without losing pixels.
//!
//! ## Features
//!
//! - **Lossless chunks**: every chunk is re-encoded as PNG, whatever the source format
//! - **All or nothing**: either the full ordered chunk list is returned or an error is
//! - **Bounded fetches**: source images are size-limited and time-limited
//! - **Typed error envelopes**: each failure maps to a fixed status and JSON body
//!
//! ## Architecture
//!
//! - [`fetch`] - Fetcher trait and `reqwest` implementation
//! - [`chunk`] - Partitioning, decoding, cropping and the chunk service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use image_chunker::{create_router, ChunkService, HttpImageFetcher, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let fetcher = HttpImageFetcher::new(Duration::from_secs(30), 50 * 1024 * 1024).unwrap();
//!     let router = create_router(ChunkService::new(fetcher), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;

// Re-export commonly used types
pub use chunk::{
    chunk_count, plan_chunks, Chunk, ChunkRequest, ChunkService, ChunkSpec, ChunkedImage, Chunker,
    DecodedImage, ImageMetadata, DEFAULT_CHUNK_HEIGHT,
};
pub use config::Config;
pub use error::{ChunkError, ErrorKind, FetchError};
pub use fetch::{FetchedImage, HttpImageFetcher, ImageFetcher};
pub use server::{
    chunk_image_handler, create_router, health_handler, status_for, AppState, ChunkQueryParams,
    ChunkResponse, ErrorResponse, HandlerError, HealthResponse, RouterConfig,
};
