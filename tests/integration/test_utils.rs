//! Test utilities for integration tests.
//!
//! This module provides a mock fetcher and helpers for building test images
//! and reading responses.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use image_chunker::chunk::ChunkService;
use image_chunker::error::FetchError;
use image_chunker::fetch::{FetchedImage, ImageFetcher};
use image_chunker::{create_router, RouterConfig};

// =============================================================================
// Mock Fetcher
// =============================================================================

/// A mock fetcher that serves pre-configured responses and counts calls.
///
/// URLs without a configured response answer with a 404.
pub struct MockImageFetcher {
    responses: HashMap<String, Result<FetchedImage, FetchError>>,
    fetch_count: AtomicUsize,
}

impl MockImageFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Serve `bytes` with the given content type at `url`.
    pub fn with_image(
        mut self,
        url: impl Into<String>,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Self {
        self.responses.insert(
            url.into(),
            Ok(FetchedImage::new(
                Bytes::from(bytes),
                content_type.map(|s| s.to_string()),
            )),
        );
        self
    }

    /// Fail fetches of `url` with `error`.
    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl Default for MockImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        match self.responses.get(url.as_str()) {
            Some(response) => response.clone(),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}

/// Build a router around a shared mock so tests can inspect it afterwards.
pub fn router_with(fetcher: Arc<MockImageFetcher>, config: RouterConfig) -> Router {
    create_router(ChunkService::with_shared_fetcher(fetcher), config)
}

// =============================================================================
// Test Images
// =============================================================================

/// Create an RGBA PNG where every pixel is distinct enough to catch row mixups.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 31 % 256) as u8,
            (y % 256) as u8,
            (y / 256 % 256) as u8,
            255,
        ])
    });

    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Create a grayscale JPEG.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) * 4 % 256) as u8]));

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Check if data looks like a PNG (starts with the PNG signature).
pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Build a GET request for the chunk endpoint.
pub fn chunk_request(query: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/chunk-image{}", query))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
