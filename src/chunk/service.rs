//! Chunk service for orchestrating a single chunk request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ChunkService                          │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    chunk_image()                       │  │
//! │  │  1. Fetch bytes     2. Decode once     3. Crop+encode  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │           │                         │                        │
//! │           ▼                         ▼                        │
//! │    ┌──────────────┐        ┌───────────────────────────┐     │
//! │    │ ImageFetcher │        │ Chunker (blocking worker) │     │
//! │    └──────────────┘        └───────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::num::NonZeroU32;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::error::ChunkError;
use crate::fetch::ImageFetcher;

use super::chunker::{Chunk, Chunker, ImageMetadata};

/// Default chunk height in pixels.
pub const DEFAULT_CHUNK_HEIGHT: NonZeroU32 = match NonZeroU32::new(7000) {
    Some(height) => height,
    None => panic!("default chunk height must be non-zero"),
};

// =============================================================================
// Chunk Request
// =============================================================================

/// A validated request to chunk one image.
///
/// This is the request-scoped context passed through fetch, decode and chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRequest {
    /// Absolute http(s) URL of the source image
    pub image_url: Url,

    /// Maximum height of each chunk in pixels
    pub chunk_height: NonZeroU32,
}

impl ChunkRequest {
    /// Create a request from already-validated parts.
    pub fn new(image_url: Url, chunk_height: NonZeroU32) -> Self {
        Self {
            image_url,
            chunk_height,
        }
    }

    /// Validate raw query values.
    ///
    /// - `image_url` must be present, non-blank and an absolute http(s) URL.
    /// - `chunk_height` may be absent or empty, in which case
    ///   `default_chunk_height` is used. Otherwise it must parse as a positive
    ///   integer; anything else is rejected rather than defaulted.
    pub fn from_query(
        image_url: Option<&str>,
        chunk_height: Option<&str>,
        default_chunk_height: NonZeroU32,
    ) -> Result<Self, ChunkError> {
        let raw_url = image_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ChunkError::MissingParameter)?;

        let image_url = parse_image_url(raw_url)?;

        let chunk_height = match chunk_height.map(str::trim).filter(|s| !s.is_empty()) {
            None => default_chunk_height,
            Some(raw) => parse_chunk_height(raw)?,
        };

        Ok(Self {
            image_url,
            chunk_height,
        })
    }
}

fn parse_image_url(raw: &str) -> Result<Url, ChunkError> {
    let url = Url::parse(raw).map_err(|e| ChunkError::InvalidParameter {
        name: "imageUrl",
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ChunkError::InvalidParameter {
            name: "imageUrl",
            reason: format!("unsupported scheme '{}', expected http or https", scheme),
        }),
    }
}

fn parse_chunk_height(raw: &str) -> Result<NonZeroU32, ChunkError> {
    // Reject "+5" and similar even though u32::from_str accepts them
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChunkError::InvalidParameter {
            name: "chunkHeight",
            reason: format!("'{}' is not a positive integer", raw),
        });
    }

    raw.parse::<NonZeroU32>()
        .map_err(|_| ChunkError::InvalidParameter {
            name: "chunkHeight",
            reason: format!("'{}' is not a positive integer", raw),
        })
}

// =============================================================================
// Chunked Image
// =============================================================================

/// Result of a successful chunk request.
#[derive(Debug, Clone)]
pub struct ChunkedImage {
    /// Dimensions of the source image
    pub metadata: ImageMetadata,

    /// Chunks in increasing index order
    pub chunks: Vec<Chunk>,
}

// =============================================================================
// Chunk Service
// =============================================================================

/// Service that fetches an image and splits it into chunks.
///
/// # Type Parameters
///
/// * `F` - The fetcher used to retrieve source bytes
///
/// # Example
///
/// ```ignore
/// use image_chunker::chunk::{ChunkRequest, ChunkService};
///
/// let service = ChunkService::new(fetcher);
/// let request = ChunkRequest::from_query(Some("https://example.com/tall.png"), None, default)?;
/// let result = service.chunk_image(request).await?;
///
/// println!("{} chunks", result.chunks.len());
/// ```
pub struct ChunkService<F: ImageFetcher> {
    fetcher: Arc<F>,
    chunker: Chunker,
}

impl<F: ImageFetcher> ChunkService<F> {
    /// Create a new chunk service around a fetcher.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            chunker: Chunker::new(),
        }
    }

    /// Create a new chunk service with a shared fetcher.
    pub fn with_shared_fetcher(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            chunker: Chunker::new(),
        }
    }

    /// Get the fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch, decode and chunk the requested image.
    ///
    /// Decoding and encoding are CPU-bound and run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The fetch fails or the response is not an image
    /// - The bytes cannot be decoded
    /// - Any chunk cannot be cropped or encoded
    pub async fn chunk_image(&self, request: ChunkRequest) -> Result<ChunkedImage, ChunkError> {
        debug!(
            url = %request.image_url,
            chunk_height = request.chunk_height.get(),
            "Fetching source image"
        );

        let fetched = self.fetcher.fetch(&request.image_url).await?;

        let chunker = self.chunker.clone();
        let chunk_height = request.chunk_height;

        let result = tokio::task::spawn_blocking(move || {
            let source = chunker.decode(&fetched.bytes, fetched.content_type.as_deref())?;
            let chunks = chunker.chunk(&source, chunk_height)?;
            Ok::<_, ChunkError>(ChunkedImage {
                metadata: source.metadata(),
                chunks,
            })
        })
        .await
        .map_err(|e| ChunkError::Internal(format!("chunking task failed: {}", e)))??;

        info!(
            url = %request.image_url,
            width = result.metadata.width,
            height = result.metadata.height,
            chunks = result.chunks.len(),
            "Chunked image"
        );

        Ok(result)
    }
}
