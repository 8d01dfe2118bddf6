//! API integration tests for chunking and error handling.
//!
//! Tests verify:
//! - Chunk counts, heights, ordering and reassembly through the HTTP API
//! - Default and overridden chunk heights
//! - Error envelopes for every caller-facing failure

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::prelude::*;
use image::GenericImageView;
use tower::ServiceExt;

use image_chunker::error::FetchError;
use image_chunker::RouterConfig;

use super::test_utils::{
    body_json, chunk_request, create_test_jpeg, create_test_png, is_valid_png, router_with,
    MockImageFetcher,
};

const TALL_URL: &str = "https://images.test/tall.png";

fn decode_chunk(chunk: &serde_json::Value) -> Vec<u8> {
    BASE64_STANDARD
        .decode(chunk["data"].as_str().unwrap())
        .unwrap()
}

// =============================================================================
// Successful Chunking
// =============================================================================

#[tokio::test]
async fn test_chunk_image_success() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(4, 25),
        Some("image/png"),
    ));
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}&chunkHeight=10", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["originalWidth"], 4);
    assert_eq!(json["originalHeight"], 25);

    let chunks = json["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 3);

    let mut heights = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk["index"], i + 1);
        assert_eq!(chunk["total"], 3);
        assert_eq!(chunk["filename"], format!("chunk-{}.png", i + 1));

        let png = decode_chunk(chunk);
        assert!(is_valid_png(&png), "chunk {} should be a PNG", i + 1);

        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 4);
        heights.push(img.height());
    }
    assert_eq!(heights, vec![10, 10, 5]);
    assert_eq!(fetcher.fetch_count(), 1);
}

#[tokio::test]
async fn test_default_chunk_height_gives_single_chunk() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(3, 50),
        Some("image/png"),
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chunks = json["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0]["index"], 1);
    assert_eq!(chunks[0]["total"], 1);

    let img = image::load_from_memory(&decode_chunk(&chunks[0])).unwrap();
    assert_eq!(img.dimensions(), (3, 50));
}

#[tokio::test]
async fn test_configured_default_chunk_height() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(3, 20),
        Some("image/png"),
    ));
    let config = RouterConfig::new().with_default_chunk_height(NonZeroU32::new(8).unwrap());
    let router = router_with(fetcher, config);

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["chunks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_chunks_reassemble_to_original_pixels() {
    let source = create_test_png(7, 300);
    let original = image::load_from_memory(&source).unwrap().to_rgba8();

    let fetcher = Arc::new(MockImageFetcher::new().with_image(TALL_URL, source, None));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}&chunkHeight=64", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chunks = json["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 5);

    let mut rows = Vec::new();
    let mut height = 0;
    for chunk in chunks {
        let piece = image::load_from_memory(&decode_chunk(chunk))
            .unwrap()
            .to_rgba8();
        height += piece.height();
        rows.extend_from_slice(piece.as_raw());
    }

    assert_eq!(height, 300);
    assert_eq!(rows, original.into_raw());
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(5, 33),
        Some("image/png"),
    ));
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());
    let query = format!("?imageUrl={}&chunkHeight=9", TALL_URL);

    let first = body_json(router.clone().oneshot(chunk_request(&query)).await.unwrap()).await;
    let second = body_json(router.oneshot(chunk_request(&query)).await.unwrap()).await;

    assert_eq!(first, second);
    // No caching: each request fetches again
    assert_eq!(fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn test_jpeg_source_produces_png_chunks() {
    let url = "https://images.test/photo.jpg";
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        url,
        create_test_jpeg(16, 24),
        Some("image/jpeg"),
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}&chunkHeight=16", url)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chunks = json["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| is_valid_png(&decode_chunk(c))));
}

#[tokio::test]
async fn test_alias_route() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(2, 2),
        Some("image/png"),
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let request = Request::builder()
        .uri(format!("/chunk-image?imageUrl={}", TALL_URL))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Error Cases - Parameters
// =============================================================================

#[tokio::test]
async fn test_missing_image_url() {
    let fetcher = Arc::new(MockImageFetcher::new());
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    let response = router.oneshot(chunk_request("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!({"error": "imageUrl parameter required"})
    );
    assert_eq!(fetcher.fetch_count(), 0, "no fetch should be attempted");
}

#[tokio::test]
async fn test_empty_image_url() {
    let fetcher = Arc::new(MockImageFetcher::new());
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    let response = router
        .oneshot(chunk_request("?imageUrl=&chunkHeight=100"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "imageUrl parameter required");
    assert_eq!(fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_invalid_chunk_height_rejected() {
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        create_test_png(2, 2),
        Some("image/png"),
    ));
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    for value in ["0", "-10", "abc", "1.5"] {
        let response = router
            .clone()
            .oneshot(chunk_request(&format!(
                "?imageUrl={}&chunkHeight={}",
                TALL_URL, value
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", value);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("chunkHeight"));
    }

    assert_eq!(fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_duplicate_image_url_returns_json_error() {
    let fetcher = Arc::new(MockImageFetcher::new());
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    let response = router
        .oneshot(chunk_request(
            "?imageUrl=https://a.test/x.png&imageUrl=https://b.test/y.png",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        "application/json",
        "rejections must use the JSON envelope"
    );

    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid query parameter"), "{}", error);
    assert!(error.contains("imageUrl"), "{}", error);
    assert_eq!(json.as_object().unwrap().len(), 1);
    assert_eq!(fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_non_http_url_rejected() {
    let fetcher = Arc::new(MockImageFetcher::new());
    let router = router_with(Arc::clone(&fetcher), RouterConfig::new());

    let response = router
        .oneshot(chunk_request("?imageUrl=file:///etc/passwd"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("imageUrl"));
    assert_eq!(fetcher.fetch_count(), 0);
}

// =============================================================================
// Error Cases - Fetch
// =============================================================================

#[tokio::test]
async fn test_fetch_not_found() {
    let url = "https://images.test/missing.png";
    let fetcher = Arc::new(MockImageFetcher::new());
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", url)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to fetch image: 404 Not Found");
    assert_eq!(json["url"], url);
    assert!(json.get("chunks").is_none());
}

#[tokio::test]
async fn test_not_an_image() {
    let preview: String = "<p>".repeat(100);
    let fetcher = Arc::new(MockImageFetcher::new().with_error(
        TALL_URL,
        FetchError::NotAnImage {
            content_type: "text/html".to_string(),
            preview: preview.clone(),
        },
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Response is not an image");
    assert_eq!(json["contentType"], "text/html");
    assert_eq!(json["responsePreview"], preview);
}

#[tokio::test]
async fn test_too_large() {
    let fetcher = Arc::new(MockImageFetcher::new().with_error(
        TALL_URL,
        FetchError::TooLarge {
            url: TALL_URL.to_string(),
            limit: 1024,
        },
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_json(response).await;
    assert_eq!(json["url"], TALL_URL);
}

// =============================================================================
// Error Cases - Decode
// =============================================================================

#[tokio::test]
async fn test_invalid_image_bytes() {
    let garbage = b"definitely not an image".to_vec();
    let size = garbage.len();
    let fetcher = Arc::new(MockImageFetcher::new().with_image(
        TALL_URL,
        garbage,
        Some("image/png"),
    ));
    let router = router_with(fetcher, RouterConfig::new());

    let response = router
        .oneshot(chunk_request(&format!("?imageUrl={}", TALL_URL)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid image format");
    assert_eq!(json["bufferSize"], size);
    assert_eq!(json["contentType"], "image/png");
    assert!(json["details"].is_string());
    assert!(json.get("chunks").is_none());
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let router = router_with(Arc::new(MockImageFetcher::new()), RouterConfig::new());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}
