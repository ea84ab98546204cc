//! The error type returned by quantization functions.

use crate::MapError;
use thiserror::Error;

/// Errors that end a quantization request.
///
/// All operations are deterministic, so none of these are worth retrying with the same input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// The histogram contains no colors (the image or its sampled subset has no pixels).
    #[error("cannot build a palette from an image without pixels")]
    EmptyImage,

    /// The requested number of palette colors is outside `1..=256`.
    #[error("palette size must be between 1 and 256, got {0}")]
    InvalidPaletteSize(u32),

    /// A raster buffer does not have the length implied by its dimensions.
    #[error("buffer length {len} does not match {width}x{height} with {bands} bands")]
    DimensionMismatch {
        /// The buffer length.
        len: usize,
        /// The raster width.
        width: u32,
        /// The raster height.
        height: u32,
        /// The number of samples per pixel.
        bands: usize,
    },

    /// A raster tile size has a zero dimension.
    #[error("tile dimensions cannot be zero, got {width}x{height}")]
    InvalidTileSize {
        /// The tile width.
        width: u32,
        /// The tile height.
        height: u32,
    },

    /// An internal color map operation failed.
    #[error(transparent)]
    Map(#[from] MapError),
}
