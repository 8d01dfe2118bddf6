//! Fetch layer: retrieves source image bytes from a remote URL.
//!
//! The [`ImageFetcher`] trait is the seam between the chunk service and the
//! network. [`HttpImageFetcher`] is the production implementation built on
//! `reqwest`; tests substitute their own.

mod http_fetcher;

pub use http_fetcher::{
    is_image_content_type, truncate_preview, HttpImageFetcher, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MAX_IMAGE_BYTES, PREVIEW_MAX_CHARS,
};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::FetchError;

/// Raw bytes of a fetched image together with the advertised content type.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Encoded image bytes, exactly as served
    pub bytes: Bytes,

    /// `Content-Type` header value, if the server sent one
    pub content_type: Option<String>,
}

impl FetchedImage {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }
}

/// Trait for retrieving image bytes from a URL.
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the resource at `url`.
    ///
    /// Fails with [`FetchError::Status`] on a non-success response and with
    /// [`FetchError::NotAnImage`] when the advertised content type is present
    /// and is not an image type.
    async fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError>;
}
