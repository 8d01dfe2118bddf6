//! HTTP request handlers for the image chunking API.
//!
//! This module contains the Axum handlers for chunking images and health checks.
//!
//! # Endpoints
//!
//! - `GET /api/chunk-image?imageUrl=...&chunkHeight=...` - Chunk an image
//! - `GET /health` - Health check endpoint

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::chunk::{Chunk, ChunkRequest, ChunkService, ChunkedImage, DEFAULT_CHUNK_HEIGHT};
use crate::error::{ChunkError, ErrorKind, FetchError};
use crate::fetch::ImageFetcher;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the chunk service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: ImageFetcher> {
    /// The chunk service for processing chunk requests
    pub chunk_service: Arc<ChunkService<F>>,

    /// Chunk height used when the request does not supply one
    pub default_chunk_height: NonZeroU32,

    /// Whether 5xx error bodies include a `stack` field
    pub debug_errors: bool,
}

impl<F: ImageFetcher> AppState<F> {
    /// Create a new application state with the given chunk service.
    pub fn new(chunk_service: ChunkService<F>) -> Self {
        Self {
            chunk_service: Arc::new(chunk_service),
            default_chunk_height: DEFAULT_CHUNK_HEIGHT,
            debug_errors: false,
        }
    }

    /// Set the chunk height used when the request omits `chunkHeight`.
    pub fn with_default_chunk_height(mut self, chunk_height: NonZeroU32) -> Self {
        self.default_chunk_height = chunk_height;
        self
    }

    /// Include diagnostic `stack` fields in 5xx responses.
    pub fn with_debug_errors(mut self, enabled: bool) -> Self {
        self.debug_errors = enabled;
        self
    }
}

impl<F: ImageFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            chunk_service: Arc::clone(&self.chunk_service),
            default_chunk_height: self.default_chunk_height,
            debug_errors: self.debug_errors,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for chunk requests.
///
/// Both values are taken as raw strings so validation errors are reported in
/// the JSON error envelope instead of as extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkQueryParams {
    /// Absolute URL of the source image (required)
    #[serde(default)]
    pub image_url: Option<String>,

    /// Chunk height in pixels (optional, positive integer)
    #[serde(default)]
    pub chunk_height: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// A single chunk as sent to clients.
#[derive(Debug, Serialize)]
pub struct ChunkPayload {
    pub index: u32,
    pub total: u32,
    pub filename: String,

    /// Base64 (standard alphabet, padded) PNG bytes
    pub data: String,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            index: chunk.index,
            total: chunk.total,
            filename: chunk.filename.clone(),
            data: BASE64_STANDARD.encode(&chunk.data),
        }
    }
}

/// Successful chunk response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponse {
    pub success: bool,
    pub original_width: u32,
    pub original_height: u32,
    pub chunks: Vec<ChunkPayload>,
}

impl From<&ChunkedImage> for ChunkResponse {
    fn from(result: &ChunkedImage) -> Self {
        Self {
            success: true,
            original_width: result.metadata.width,
            original_height: result.metadata.height,
            chunks: result.chunks.iter().map(ChunkPayload::from).collect(),
        }
    }
}

/// JSON error response returned for all error conditions.
///
/// Only `error` is always present; the remaining fields depend on the error
/// kind.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,

    /// Debug representation of the error (debug mode, 5xx only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    /// Create an error response with only a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    /// Build the envelope for a chunk error.
    pub fn from_error(err: &ChunkError) -> Self {
        let mut response = Self::new(err.to_string());

        match err {
            ChunkError::Fetch(FetchError::Status { url, .. })
            | ChunkError::Fetch(FetchError::Transport { url, .. })
            | ChunkError::Fetch(FetchError::TooLarge { url, .. }) => {
                response.url = Some(url.clone());
            }
            ChunkError::Fetch(FetchError::NotAnImage {
                content_type,
                preview,
            }) => {
                response.content_type = Some(content_type.clone());
                response.response_preview = Some(preview.clone());
            }
            ChunkError::InvalidImage {
                details,
                buffer_size,
                content_type,
            } => {
                response.details = Some(details.clone());
                response.buffer_size = Some(*buffer_size);
                response.content_type = content_type.clone();
            }
            ChunkError::ChunkExtractionFailed { index, .. } => {
                response.chunk_index = Some(*index);
            }
            ChunkError::MissingParameter
            | ChunkError::InvalidParameter { .. }
            | ChunkError::Internal(_) => {}
        }

        response
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// HTTP status for each error kind.
pub const ERROR_STATUS_TABLE: [(ErrorKind, StatusCode); 8] = [
    (ErrorKind::MissingParameter, StatusCode::BAD_REQUEST),
    (ErrorKind::InvalidParameter, StatusCode::BAD_REQUEST),
    (ErrorKind::FetchFailed, StatusCode::BAD_REQUEST),
    (ErrorKind::NotAnImage, StatusCode::BAD_REQUEST),
    (ErrorKind::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
    (ErrorKind::InvalidImage, StatusCode::BAD_REQUEST),
    (ErrorKind::ChunkExtractionFailed, StatusCode::INTERNAL_SERVER_ERROR),
    (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
];

/// Look up the HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    ERROR_STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Wrapper for handler errors to implement IntoResponse.
#[derive(Debug)]
pub struct HandlerError {
    pub error: ChunkError,

    /// Attach the `stack` field to 5xx bodies
    pub include_stack: bool,
}

impl HandlerError {
    pub fn new(error: ChunkError, include_stack: bool) -> Self {
        Self {
            error,
            include_stack,
        }
    }
}

impl From<ChunkError> for HandlerError {
    fn from(error: ChunkError) -> Self {
        Self::new(error, false)
    }
}

/// Convert a chunk error to an HTTP response.
///
/// This implementation logs errors based on their severity:
/// - 5xx errors are logged at ERROR level
/// - upstream 404s are logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let kind = self.error.kind();
        let status = status_for(kind);
        let message = self.error.to_string();

        if status.is_server_error() {
            error!(
                error_type = kind.as_str(),
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if matches!(
            self.error,
            ChunkError::Fetch(FetchError::Status { status: 404, .. })
        ) {
            debug!(
                error_type = kind.as_str(),
                status = status.as_u16(),
                "Source not found: {}",
                message
            );
        } else {
            warn!(
                error_type = kind.as_str(),
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let mut body = ErrorResponse::from_error(&self.error);
        if self.include_stack && status.is_server_error() {
            body.stack = Some(format!("{:?}", self.error));
        }

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle chunk requests.
///
/// # Endpoint
///
/// `GET /api/chunk-image`
///
/// # Query Parameters
///
/// - `imageUrl`: Absolute http(s) URL of the source image (required)
/// - `chunkHeight`: Maximum chunk height in pixels (default: 7000)
///
/// # Response
///
/// - `200 OK`: JSON with `success`, `originalWidth`, `originalHeight` and `chunks`
/// - `400 Bad Request`: Missing/invalid parameter, malformed query string,
///   failed fetch, not an image, or undecodable image
/// - `413 Payload Too Large`: Source image exceeds the size limit
/// - `500 Internal Server Error`: Chunk extraction or other internal failure
pub async fn chunk_image_handler<F: ImageFetcher + 'static>(
    State(state): State<AppState<F>>,
    query: Result<Query<ChunkQueryParams>, QueryRejection>,
) -> Result<Json<ChunkResponse>, HandlerError> {
    let to_handler_error = |e: ChunkError| HandlerError::new(e, state.debug_errors);

    let Query(params) = query
        .map_err(|rejection| ChunkError::InvalidParameter {
            name: "query",
            reason: rejection.body_text(),
        })
        .map_err(to_handler_error)?;

    let request = ChunkRequest::from_query(
        params.image_url.as_deref(),
        params.chunk_height.as_deref(),
        state.default_chunk_height,
    )
    .map_err(to_handler_error)?;

    let result = state
        .chunk_service
        .chunk_image(request)
        .await
        .map_err(to_handler_error)?;

    Ok(Json(ChunkResponse::from(&result)))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
