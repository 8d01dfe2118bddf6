//! Row partitioning for vertical chunking.

use std::num::NonZeroU32;

/// One contiguous band of rows in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// 1-based position in the sequence
    pub index: u32,

    /// Number of chunks in the sequence
    pub total: u32,

    /// First row of the band
    pub y_offset: u32,

    /// Number of rows in the band
    pub height: u32,
}

impl ChunkSpec {
    /// File name used when the chunk is handed to a client.
    pub fn filename(&self) -> String {
        chunk_filename(self.index)
    }
}

/// File name for the chunk at a 1-based `index`.
pub fn chunk_filename(index: u32) -> String {
    format!("chunk-{}.png", index)
}

/// Number of chunks needed to cover `height` rows.
#[inline]
pub fn chunk_count(height: u32, chunk_height: NonZeroU32) -> u32 {
    height.div_ceil(chunk_height.get())
}

/// Partition `[0, height)` into bands of at most `chunk_height` rows.
///
/// Bands are returned in increasing `y_offset` order; every band except the
/// last is exactly `chunk_height` tall. A zero `height` yields no bands.
pub fn plan_chunks(height: u32, chunk_height: NonZeroU32) -> Vec<ChunkSpec> {
    let step = chunk_height.get();
    let total = chunk_count(height, chunk_height);

    (0..total)
        .map(|i| {
            // i < total, so i * step < height and cannot overflow
            let y_offset = i * step;
            ChunkSpec {
                index: i + 1,
                total,
                y_offset,
                height: step.min(height - y_offset),
            }
        })
        .collect()
}
