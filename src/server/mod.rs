//! HTTP server layer for the image chunker.
//!
//! This module provides the HTTP API for chunking remote images.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │       GET /api/chunk-image?imageUrl=...&chunkHeight=...         │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │        routes           │  │
//! │  │ (validation, JSON envelopes) │  │  (router config, CORS)  │  │
//! │  └──────────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    chunk_image_handler, health_handler, status_for, AppState, ChunkPayload, ChunkQueryParams,
    ChunkResponse, ErrorResponse, HandlerError, HealthResponse, ERROR_STATUS_TABLE,
};
pub use routes::{create_router, RouterConfig};
