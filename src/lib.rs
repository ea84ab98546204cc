//! A median cut image quantizer built around a compact packed color histogram.
//!
//! `packquant` reduces an image with RGBA, RGB, gray, or gray + alpha pixels to a palette of
//! at most `256` colors and an indexed image. Colors are packed into `u32`s and counted in a
//! specialized hash map. Images with too many distinct colors are counted at reduced precision,
//! so the histogram never holds more than [`MAX_HISTOGRAM_COLORS`] entries.
//!
//! # Features
//! To reduce dependencies and compile times, `packquant` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of the remap pass via [`rayon`].
//! - `image`: implements [`Raster`] for the 8-bit buffers of the [`image`] crate
//!   and allows converting the output back into an `RgbaImage`.
//!
//! # High-Level API
//! To get started with the high-level API, see [`Quantizer`]:
//! ```no_run
//! # use packquant::{PaletteSize, Quantizer, SplitStrategy};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let (palette, indexed) = Quantizer::new()
//!     .max_colors(PaletteSize::try_from(64u8)?) // set the max number of colors in the palette
//!     .subsample(true) // count only a grid of pixels
//!     .split_strategy(SplitStrategy::HalfSum)
//!     .quantize_par(&img)?;
//!
//! let rows = indexed.to_packed_rows();
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The individual stages are also exposed: build a [`PackedHistogram`],
//! compute a palette with [`median_cut::build_palette`],
//! and apply any [`ColorIndexer`] from the [`indexer`] module with [`remap()`].

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_map;
mod error;
mod histogram;
mod raster;
mod remap;
mod traits;
mod types;

pub mod color;
pub mod indexer;
pub mod median_cut;

pub use api::*;
pub use color::{pack, unpack, Channel, PackedColor};
pub use color_map::{Cursor, Iter as ColorMapIter, MapError, PackedColorMap};
pub use error::QuantizeError;
pub use histogram::{HistogramBin, HistogramBuilder, PackedHistogram};
pub use raster::{Bands, RasterImage, Tile, Tiles};
pub use remap::remap;
#[cfg(feature = "threads")]
pub use remap::remap_par;
pub use traits::*;
pub use types::*;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// The maximum number of distinct colors kept in a [`PackedHistogram`] (`32767`).
pub const MAX_HISTOGRAM_COLORS: usize = i16::MAX as usize;
