//! Band layouts, tiling, and an owned raster buffer.

use crate::{QuantizeError, Raster};
use palette::{cast::IntoComponents, Srgba};

/// The layout of the samples of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bands {
    /// A single gray sample.
    Gray,
    /// A gray sample followed by an alpha sample.
    GrayAlpha,
    /// Red, green, and blue samples.
    Rgb,
    /// Red, green, blue, and alpha samples.
    Rgba,
}

impl Bands {
    /// The number of samples per pixel.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the pixels carry an alpha sample.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }

    /// Returns the layout with the given number of samples per pixel.
    #[must_use]
    pub const fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Self::Gray),
            2 => Some(Self::GrayAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Expands the samples of one pixel to `[red, green, blue, alpha]`.
    ///
    /// Gray is replicated into all three color channels and
    /// a missing alpha sample is treated as fully opaque.
    #[inline]
    #[must_use]
    pub fn to_rgba(self, samples: &[u8]) -> [u8; 4] {
        match self {
            Self::Gray => {
                let v = samples[0];
                [v, v, v, u8::MAX]
            }
            Self::GrayAlpha => {
                let v = samples[0];
                [v, v, v, samples[1]]
            }
            Self::Rgb => [samples[0], samples[1], samples[2], u8::MAX],
            Self::Rgba => [samples[0], samples[1], samples[2], samples[3]],
        }
    }
}

/// A rectangular region of a [`Raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    /// The x coordinate of the top left pixel.
    pub x: u32,
    /// The y coordinate of the top left pixel.
    pub y: u32,
    /// The width of the tile.
    pub width: u32,
    /// The height of the tile.
    pub height: u32,
}

impl Tile {
    /// The number of pixels in the tile.
    #[must_use]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The x coordinates covered by the tile.
    #[must_use]
    pub fn xs(&self) -> std::ops::Range<u32> {
        self.x..(self.x + self.width)
    }

    /// The y coordinates covered by the tile.
    #[must_use]
    pub fn ys(&self) -> std::ops::Range<u32> {
        self.y..(self.y + self.height)
    }
}

/// An iterator over the [`Tile`]s of a raster in row-major order.
///
/// Tiles on the right and bottom edges are clipped to the raster.
#[derive(Debug, Clone)]
pub struct Tiles {
    /// The raster width.
    width: u32,
    /// The raster height.
    height: u32,
    /// The unclipped tile width.
    tile_width: u32,
    /// The unclipped tile height.
    tile_height: u32,
    /// The x coordinate of the next tile.
    x: u32,
    /// The y coordinate of the next tile.
    y: u32,
}

impl Tiles {
    /// Creates a new [`Tiles`] iterator. Zero tile dimensions are treated as `1`.
    #[must_use]
    pub fn new(width: u32, height: u32, (tile_width, tile_height): (u32, u32)) -> Self {
        Self {
            width,
            height,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.width == 0 || self.y >= self.height {
            return None;
        }

        let tile = Tile {
            x: self.x,
            y: self.y,
            width: self.tile_width.min(self.width - self.x),
            height: self.tile_height.min(self.height - self.y),
        };

        self.x = self.x.saturating_add(self.tile_width);
        if self.x >= self.width {
            self.x = 0;
            self.y = self.y.saturating_add(self.tile_height);
        }

        Some(tile)
    }
}

/// An owned raster with interleaved `u8` samples.
///
/// # Examples
/// ```
/// # use packquant::{Bands, Raster, RasterImage, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let raster = RasterImage::new(2, 1, Bands::GrayAlpha, vec![10, 255, 20, 0])?;
/// assert_eq!(raster.rgba(0, 0), [10, 10, 10, 255]);
/// assert_eq!(raster.rgba(1, 0), [20, 20, 20, 0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// The width in pixels.
    width: u32,
    /// The height in pixels.
    height: u32,
    /// The band layout.
    bands: Bands,
    /// The tile size used when iterating.
    tile_size: (u32, u32),
    /// The interleaved samples in row-major order.
    data: Vec<u8>,
}

impl RasterImage {
    /// Creates a new [`RasterImage`] from interleaved samples.
    ///
    /// # Errors
    /// Returns [`QuantizeError::DimensionMismatch`] if `data` does not contain exactly
    /// `width * height * bands.count()` samples.
    pub fn new(
        width: u32,
        height: u32,
        bands: Bands,
        data: Vec<u8>,
    ) -> Result<Self, QuantizeError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(bands.count()));

        if expected == Some(data.len()) {
            Ok(Self {
                width,
                height,
                bands,
                tile_size: (crate::DEFAULT_TILE_SIZE, crate::DEFAULT_TILE_SIZE),
                data,
            })
        } else {
            Err(QuantizeError::DimensionMismatch {
                len: data.len(),
                width,
                height,
                bands: bands.count(),
            })
        }
    }

    /// Creates a new [`RasterImage`] with [`Bands::Rgba`] from [`Srgba<u8>`] pixels.
    ///
    /// # Errors
    /// Returns [`QuantizeError::DimensionMismatch`] if there are not exactly `width * height` pixels.
    pub fn from_srgba(
        width: u32,
        height: u32,
        pixels: Vec<Srgba<u8>>,
    ) -> Result<Self, QuantizeError> {
        Self::new(width, height, Bands::Rgba, pixels.into_components())
    }

    /// Sets the tile size used when iterating over this raster.
    ///
    /// # Errors
    /// Returns [`QuantizeError::InvalidTileSize`] if either dimension is zero.
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Result<Self, QuantizeError> {
        if width == 0 || height == 0 {
            Err(QuantizeError::InvalidTileSize { width, height })
        } else {
            self.tile_size = (width, height);
            Ok(self)
        }
    }

    /// The interleaved samples of the raster.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the raster and returns its samples.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl Raster for RasterImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bands(&self) -> Bands {
        self.bands
    }

    #[inline]
    fn samples(&self, x: u32, y: u32) -> &[u8] {
        let n = self.bands.count();
        let i = (y as usize * self.width as usize + x as usize) * n;
        &self.data[i..(i + n)]
    }

    fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }
}

#[cfg(feature = "image")]
mod image_buffers {
    //! [`Raster`] implementations for the 8-bit buffers of the `image` crate.

    use super::Bands;
    use crate::Raster;
    use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};

    /// Implements [`Raster`] for `ImageBuffer<$pixel<u8>, Vec<u8>>`.
    macro_rules! impl_raster {
        ($($pixel:ident => $bands:expr),* $(,)?) => {$(
            impl Raster for ImageBuffer<$pixel<u8>, Vec<u8>> {
                fn width(&self) -> u32 {
                    ImageBuffer::width(self)
                }

                fn height(&self) -> u32 {
                    ImageBuffer::height(self)
                }

                fn bands(&self) -> Bands {
                    $bands
                }

                #[inline]
                fn samples(&self, x: u32, y: u32) -> &[u8] {
                    self.get_pixel(x, y).channels()
                }
            }
        )*};
    }

    impl_raster!(
        Luma => Bands::Gray,
        LumaA => Bands::GrayAlpha,
        Rgb => Bands::Rgb,
        Rgba => Bands::Rgba,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_expansion() {
        assert_eq!(Bands::Gray.to_rgba(&[7]), [7, 7, 7, 255]);
        assert_eq!(Bands::GrayAlpha.to_rgba(&[7, 3]), [7, 7, 7, 3]);
        assert_eq!(Bands::Rgb.to_rgba(&[1, 2, 3]), [1, 2, 3, 255]);
        assert_eq!(Bands::Rgba.to_rgba(&[1, 2, 3, 4]), [1, 2, 3, 4]);
        for bands in [Bands::Gray, Bands::GrayAlpha, Bands::Rgb, Bands::Rgba] {
            assert_eq!(Bands::from_count(bands.count()), Some(bands));
        }
        assert_eq!(Bands::from_count(5), None);
    }

    #[test]
    fn tiles_cover_raster_once() {
        let tiles = Tiles::new(5, 3, (2, 2)).collect::<Vec<_>>();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[2], Tile { x: 4, y: 0, width: 1, height: 2 });
        assert_eq!(tiles[5], Tile { x: 4, y: 2, width: 1, height: 1 });

        let mut covered = vec![0u8; 15];
        for tile in &tiles {
            for y in tile.ys() {
                for x in tile.xs() {
                    covered[(y * 5 + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
        assert_eq!(tiles.iter().map(Tile::area).sum::<usize>(), 15);
    }

    #[test]
    fn tiles_of_empty_raster() {
        assert_eq!(Tiles::new(0, 4, (2, 2)).count(), 0);
        assert_eq!(Tiles::new(4, 0, (2, 2)).count(), 0);
        assert_eq!(Tiles::new(3, 3, (0, 0)).count(), 9);
    }

    #[test]
    fn raster_image_dimensions() {
        assert_eq!(
            RasterImage::new(2, 2, Bands::Rgb, vec![0; 11]),
            Err(QuantizeError::DimensionMismatch { len: 11, width: 2, height: 2, bands: 3 })
        );

        let raster = RasterImage::new(2, 2, Bands::Rgb, (0..12).collect()).unwrap();
        assert_eq!(raster.samples(1, 1), &[9, 10, 11]);
        assert_eq!(raster.rgba(0, 1), [6, 7, 8, 255]);
        assert_eq!(
            raster.clone().with_tile_size(0, 1),
            Err(QuantizeError::InvalidTileSize { width: 0, height: 1 })
        );
        assert_eq!(raster.with_tile_size(1, 1).unwrap().tiles().count(), 4);
    }

    #[test]
    fn raster_from_srgba() {
        let pixels = vec![Srgba::new(1, 2, 3, 4), Srgba::new(5, 6, 7, 8)];
        let raster = RasterImage::from_srgba(2, 1, pixels).unwrap();
        assert_eq!(raster.bands(), Bands::Rgba);
        assert_eq!(raster.as_raw(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn image_buffers_are_rasters() {
        let gray = image::GrayImage::from_raw(2, 1, vec![3, 9]).unwrap();
        assert_eq!(gray.bands(), Bands::Gray);
        assert_eq!(gray.rgba(1, 0), [9, 9, 9, 255]);

        let rgba = image::RgbaImage::from_raw(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(Raster::width(&rgba), 1);
        assert_eq!(rgba.rgba(0, 0), [1, 2, 3, 4]);
    }
}
