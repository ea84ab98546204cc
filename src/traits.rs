//! The traits at the input and lookup seams of the quantizer.

use crate::{Bands, Palette, Tiles};
use std::sync::Arc;

/// The default tile edge length used by [`Raster::tile_size`].
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// A 2D image with `u8` samples in one of the supported [`Bands`] layouts.
///
/// Rasters are visited tile by tile. Tiles are purely an iteration boundary:
/// every pixel must be accessible through [`Raster::samples`] regardless of the tile size.
pub trait Raster {
    /// The width of the raster in pixels.
    fn width(&self) -> u32;

    /// The height of the raster in pixels.
    fn height(&self) -> u32;

    /// The band layout of each pixel.
    fn bands(&self) -> Bands;

    /// The samples of the pixel at `(x, y)`.
    ///
    /// The returned slice must have a length of `self.bands().count()`.
    /// `x` and `y` are always within the raster's dimensions.
    fn samples(&self, x: u32, y: u32) -> &[u8];

    /// The `(width, height)` of each tile, except for those clipped at the right and bottom edges.
    fn tile_size(&self) -> (u32, u32) {
        (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE)
    }

    /// The pixel at `(x, y)` expanded to `[red, green, blue, alpha]`.
    #[inline]
    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        self.bands().to_rgba(self.samples(x, y))
    }

    /// Returns an iterator over the tiles of this raster in row-major order.
    fn tiles(&self) -> Tiles {
        Tiles::new(self.width(), self.height(), self.tile_size())
    }
}

/// Nearest palette color lookup.
///
/// Indexers may be shared across threads that remap different tiles of the same image,
/// so implementations must be [`Send`] and [`Sync`]. Indexers with internal caches
/// guard them with locks held only around the cache check and update.
pub trait ColorIndexer: Send + Sync {
    /// Returns the index of the palette color nearest to the given `[red, green, blue, alpha]` color.
    fn closest_index(&self, rgba: [u8; 4]) -> u8;

    /// Returns the palette that colors are looked up in.
    fn to_palette(&self) -> Palette;

    /// Returns the number of colors in the palette.
    fn palette_len(&self) -> usize {
        self.to_palette().len()
    }
}

impl<I: ColorIndexer + ?Sized> ColorIndexer for &I {
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        (**self).closest_index(rgba)
    }

    fn to_palette(&self) -> Palette {
        (**self).to_palette()
    }

    fn palette_len(&self) -> usize {
        (**self).palette_len()
    }
}

impl<I: ColorIndexer + ?Sized> ColorIndexer for Box<I> {
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        (**self).closest_index(rgba)
    }

    fn to_palette(&self) -> Palette {
        (**self).to_palette()
    }

    fn palette_len(&self) -> usize {
        (**self).palette_len()
    }
}

impl<I: ColorIndexer + ?Sized> ColorIndexer for Arc<I> {
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        (**self).closest_index(rgba)
    }

    fn to_palette(&self) -> Palette {
        (**self).to_palette()
    }

    fn palette_len(&self) -> usize {
        (**self).palette_len()
    }
}

impl<R: Raster + ?Sized> Raster for &R {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn bands(&self) -> Bands {
        (**self).bands()
    }

    fn samples(&self, x: u32, y: u32) -> &[u8] {
        (**self).samples(x, y)
    }

    fn tile_size(&self) -> (u32, u32) {
        (**self).tile_size()
    }
}
