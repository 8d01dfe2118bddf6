//! Chunk service layer.
//!
//! This module splits tall images into a vertical sequence of fixed-height
//! PNG chunks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ ChunkRequest
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ChunkService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ ImageFetcher │  │    Chunker      │  │
//! │  │ (bytes)      │  │ (decode → crop  │  │
//! │  │              │  │   → PNG)        │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ChunkService`]: Entry point, runs fetch → decode → chunk for one request
//! - [`ChunkRequest`]: Validated request parameters
//! - [`Chunker`]: Decodes source images and extracts PNG chunks
//! - [`plan_chunks`]: Pure row partitioning
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroU32;
//! use image_chunker::chunk::plan_chunks;
//!
//! let specs = plan_chunks(15000, NonZeroU32::new(7000).unwrap());
//! let heights: Vec<u32> = specs.iter().map(|s| s.height).collect();
//! assert_eq!(heights, vec![7000, 7000, 1000]);
//! ```

mod chunker;
mod partition;
mod service;

pub use chunker::{Chunk, Chunker, DecodedImage, ImageMetadata, CHUNK_FORMAT};
pub use partition::{chunk_count, chunk_filename, plan_chunks, ChunkSpec};
pub use service::{ChunkRequest, ChunkService, ChunkedImage, DEFAULT_CHUNK_HEIGHT};
