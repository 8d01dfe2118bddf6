//! Image decoding and per-chunk PNG extraction.
//!
//! # Design Decisions
//!
//! - **Always crop and re-encode**: even an image that fits in a single chunk
//!   goes through crop + PNG encode, so every chunk comes out in the same
//!   format regardless of the source format.
//!
//! - **Independent crops**: every chunk is copied out of the same immutable
//!   decoded source with `crop_imm`; no buffer is mutated between chunks.
//!
//! - **All or nothing**: the first failing chunk aborts the whole run.

use std::io::Cursor;
use std::num::NonZeroU32;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use super::partition::{plan_chunks, ChunkSpec};
use crate::error::ChunkError;

/// Output format for every chunk.
pub const CHUNK_FORMAT: ImageFormat = ImageFormat::Png;

/// Width and height of a decoded source image, both non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// A source image decoded once per request, with its metadata.
///
/// Fields are private so the metadata always matches the pixel buffer.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    metadata: ImageMetadata,
}

impl DecodedImage {
    pub fn metadata(&self) -> ImageMetadata {
        self.metadata
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// One encoded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position in the sequence
    pub index: u32,

    /// Number of chunks in the sequence
    pub total: u32,

    /// `chunk-<index>.png`
    pub filename: String,

    /// PNG-encoded pixels
    pub data: Bytes,
}

// =============================================================================
// Chunker
// =============================================================================

/// Decodes source images and splits them into PNG chunks.
#[derive(Debug, Clone, Default)]
pub struct Chunker {}

impl Chunker {
    /// Create a new chunker.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode `bytes` and read its dimensions.
    ///
    /// The format is guessed from the leading magic bytes; the advertised
    /// content type is only carried along for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidImage`] if the bytes are not a decodable
    /// image or if either dimension is zero.
    pub fn decode(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<DecodedImage, ChunkError> {
        let invalid = |details: String| ChunkError::InvalidImage {
            details,
            buffer_size: bytes.len(),
            content_type: content_type.map(|s| s.to_string()),
        };

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| invalid(e.to_string()))?;

        if reader.format().is_none() {
            return Err(invalid("unrecognized image format".to_string()));
        }

        let image = reader.decode().map_err(|e| invalid(e.to_string()))?;
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(invalid(format!(
                "image has empty dimensions {}x{}",
                width, height
            )));
        }

        Ok(DecodedImage {
            image,
            metadata: ImageMetadata { width, height },
        })
    }

    /// Split a decoded image into chunks of at most `chunk_height` rows.
    ///
    /// Chunks are returned in increasing index order. Each one spans the
    /// full image width.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::ChunkExtractionFailed`] carrying the index of the
    /// first chunk that could not be encoded. No partial output is returned.
    pub fn chunk(
        &self,
        source: &DecodedImage,
        chunk_height: NonZeroU32,
    ) -> Result<Vec<Chunk>, ChunkError> {
        let ImageMetadata { width, height } = source.metadata;
        let specs = plan_chunks(height, chunk_height);

        debug!(
            width,
            height,
            chunk_height = chunk_height.get(),
            chunks = specs.len(),
            "Splitting image"
        );

        specs
            .iter()
            .map(|band| {
                let data = self.extract(&source.image, width, band)?;
                Ok(Chunk {
                    index: band.index,
                    total: band.total,
                    filename: band.filename(),
                    data,
                })
            })
            .collect()
    }

    /// Crop one band out of `source` and encode it as PNG.
    fn extract(
        &self,
        source: &DynamicImage,
        width: u32,
        band: &ChunkSpec,
    ) -> Result<Bytes, ChunkError> {
        let region = source.crop_imm(0, band.y_offset, width, band.height);

        if region.height() != band.height || region.width() != width {
            return Err(ChunkError::ChunkExtractionFailed {
                index: band.index,
                message: format!(
                    "cropped region is {}x{}, expected {}x{}",
                    region.width(),
                    region.height(),
                    width,
                    band.height
                ),
            });
        }

        encode_png(&region).map_err(|message| ChunkError::ChunkExtractionFailed {
            index: band.index,
            message,
        })
    }
}

fn encode_png(image: &DynamicImage) -> Result<Bytes, String> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), CHUNK_FORMAT)
        .map_err(|e| e.to_string())?;
    Ok(Bytes::from(output))
}

// =============================================================================
// Tests
// =============================================================================
