use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use super::{FetchedImage, ImageFetcher};
use crate::error::FetchError;

/// Default upper bound on fetched body size (50 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Default whole-request timeout for the fetch, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Maximum number of characters kept in a non-image response preview.
pub const PREVIEW_MAX_CHARS: usize = 500;

// A UTF-8 char is at most 4 bytes, so this always covers PREVIEW_MAX_CHARS.
const PREVIEW_MAX_BYTES: usize = PREVIEW_MAX_CHARS * 4;

/// `reqwest`-backed implementation of [`ImageFetcher`].
///
/// Bodies are buffered fully in memory, bounded by `max_bytes`. The limit is
/// enforced against `Content-Length` up front and again while reading, since
/// the header can be missing or wrong.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// Create a fetcher with its own client using the given timeout.
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("image-chunker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, max_bytes })
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    /// Get the configured body size limit.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    async fn read_body(&self, url: &Url, mut response: Response) -> Result<Bytes, FetchError> {
        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(too_large());
            }
        }

        let mut buf = BytesMut::new();
        while let Some(piece) = response
            .chunk()
            .await
            .map_err(|e| transport_error(url, &e))?
        {
            if buf.len() + piece.len() > self.max_bytes {
                return Err(too_large());
            }
            buf.extend_from_slice(&piece);
        }

        Ok(buf.freeze())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref ct) = content_type {
            if !is_image_content_type(ct) {
                let preview = read_preview(response).await;
                return Err(FetchError::NotAnImage {
                    content_type: ct.clone(),
                    preview,
                });
            }
        }

        let bytes = self.read_body(url, response).await?;

        debug!(
            url = %url,
            bytes = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "Fetched image"
        );

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

fn transport_error(url: &Url, err: &reqwest::Error) -> FetchError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };

    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}

/// Read just enough of a body for a diagnostic preview.
///
/// Read errors end the preview early instead of failing the request; the
/// caller is already reporting a different error.
async fn read_preview(mut response: Response) -> String {
    let mut buf = Vec::new();
    while buf.len() < PREVIEW_MAX_BYTES {
        match response.chunk().await {
            Ok(Some(piece)) => {
                let take = piece.len().min(PREVIEW_MAX_BYTES - buf.len());
                buf.extend_from_slice(&piece[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    truncate_preview(&buf, PREVIEW_MAX_CHARS)
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Check whether a `Content-Type` value describes an image (`image/*`).
///
/// Parameters such as `; charset=...` are ignored and matching is
/// case-insensitive.
pub fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.len() > "image/".len()
        && essence
            .get(.."image/".len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Decode bytes as lossy UTF-8 and keep at most `max_chars` characters.
pub fn truncate_preview(bytes: &[u8], max_chars: usize) -> String {
    String::from_utf8_lossy(bytes).chars().take(max_chars).collect()
}
