//! Configuration management for the image chunker.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `CHUNKER_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use image_chunker::config::Config;
//!
//! let config = Config::parse();
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `CHUNKER_HOST` - Server bind address (default: 0.0.0.0)
//! - `CHUNKER_PORT` - Server port (default: 3000)
//! - `CHUNKER_DEFAULT_CHUNK_HEIGHT` - Chunk height when a request omits it (default: 7000)
//! - `CHUNKER_MAX_IMAGE_BYTES` - Largest accepted source image (default: 50 MiB)
//! - `CHUNKER_FETCH_TIMEOUT_SECS` - Whole-request fetch timeout (default: 30)
//! - `CHUNKER_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//! - `CHUNKER_DEBUG_ERRORS` - Include `stack` in 5xx bodies (default: false)

use std::num::NonZeroU32;
use std::time::Duration;

use clap::Parser;

use crate::chunk::DEFAULT_CHUNK_HEIGHT;
use crate::fetch::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_IMAGE_BYTES};
use crate::server::RouterConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Chunker - splits tall images into fixed-height PNG chunks.
///
/// Serves a single endpoint that downloads an image from a URL and returns
/// it as an ordered list of base64-encoded PNG chunks.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-chunker")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CHUNKER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CHUNKER_PORT")]
    pub port: u16,

    // =========================================================================
    // Chunking Configuration
    // =========================================================================
    /// Chunk height in pixels used when a request omits `chunkHeight`.
    #[arg(long, default_value_t = DEFAULT_CHUNK_HEIGHT.get(), env = "CHUNKER_DEFAULT_CHUNK_HEIGHT")]
    pub default_chunk_height: u32,

    // =========================================================================
    // Fetch Configuration
    // =========================================================================
    /// Maximum accepted size of a source image in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_BYTES, env = "CHUNKER_MAX_IMAGE_BYTES")]
    pub max_image_bytes: usize,

    /// Timeout for fetching a source image, in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "CHUNKER_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CHUNKER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Include a `stack` field in 5xx error bodies.
    ///
    /// WARNING: Only enable in development.
    #[arg(long, default_value_t = false, env = "CHUNKER_DEBUG_ERRORS")]
    pub debug_errors: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_chunk_height == 0 {
            return Err("default_chunk_height must be greater than 0".to_string());
        }

        if self.max_image_bytes == 0 {
            return Err("max_image_bytes must be greater than 0".to_string());
        }

        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Get the default chunk height, or `None` if it is zero (call validate() first).
    pub fn default_chunk_height(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.default_chunk_height)
    }

    /// Build the router configuration from this config.
    pub fn router_config(&self) -> Result<RouterConfig, String> {
        let chunk_height = self
            .default_chunk_height()
            .ok_or_else(|| "default_chunk_height must be greater than 0".to_string())?;

        let mut router_config = RouterConfig::new()
            .with_default_chunk_height(chunk_height)
            .with_debug_errors(self.debug_errors)
            .with_tracing(!self.no_tracing);

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        Ok(router_config)
    }
}

// =============================================================================
// Tests
// =============================================================================
