//! Contains various types needed across the crate.

use crate::{
    color::{pack, unpack},
    indexer::{CachingIndexer, MappedIndexer},
    ColorIndexer, PackedColor, QuantizeError, MAX_COLORS,
};
use bitvec::prelude::*;
use palette::Srgba;
use std::fmt::Display;
#[cfg(feature = "image")]
use image::RgbaImage;

/// This type is used to specify the maximum number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// between `1` and [`MAX_COLORS`] (inclusive).
///
/// # Examples
/// Use `try_into` to create [`PaletteSize`]s or use the [`PaletteSize::MAX`] constant.
/// ```
/// # use packquant::{PaletteSize, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let size = PaletteSize::try_from(16u8)?;
/// let size: PaletteSize = 256u16.try_into()?;
/// assert_eq!(size, PaletteSize::MAX);
/// assert!(PaletteSize::try_from(0u32).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The maximum supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The smallest supported palette size.
    pub const MIN: Self = Self(1);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Gets the inner value as a `usize`.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl TryFrom<u32> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match u16::try_from(value) {
            Ok(size @ 1..=MAX_COLORS) => Ok(Self(size)),
            _ => Err(QuantizeError::InvalidPaletteSize(value)),
        }
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::try_from(u32::from(value))
    }
}

impl TryFrom<u8> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(u32::from(value))
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// A color palette stored as four parallel component arrays.
///
/// A palette always has between `1` and [`MAX_COLORS`] entries,
/// so every index fits in a `u8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    /// The red components.
    red: Vec<u8>,
    /// The green components.
    green: Vec<u8>,
    /// The blue components.
    blue: Vec<u8>,
    /// The alpha components.
    alpha: Vec<u8>,
}

impl Palette {
    /// Creates a new [`Palette`] from the given `[red, green, blue, alpha]` colors.
    ///
    /// # Errors
    /// Returns [`QuantizeError::InvalidPaletteSize`] if there are no colors
    /// or more than [`MAX_COLORS`] colors.
    pub fn new(colors: impl IntoIterator<Item = [u8; 4]>) -> Result<Self, QuantizeError> {
        let mut palette = Self {
            red: Vec::new(),
            green: Vec::new(),
            blue: Vec::new(),
            alpha: Vec::new(),
        };

        for [r, g, b, a] in colors {
            palette.red.push(r);
            palette.green.push(g);
            palette.blue.push(b);
            palette.alpha.push(a);
        }

        let len = palette.len();
        if (1..=usize::from(MAX_COLORS)).contains(&len) {
            Ok(palette)
        } else {
            Err(QuantizeError::InvalidPaletteSize(
                u32::try_from(len).unwrap_or(u32::MAX),
            ))
        }
    }

    /// The number of colors in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.red.len()
    }

    /// Always `false`, since a palette has at least one color.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// The red components of each color.
    #[must_use]
    pub fn red(&self) -> &[u8] {
        &self.red
    }

    /// The green components of each color.
    #[must_use]
    pub fn green(&self) -> &[u8] {
        &self.green
    }

    /// The blue components of each color.
    #[must_use]
    pub fn blue(&self) -> &[u8] {
        &self.blue
    }

    /// The alpha components of each color.
    #[must_use]
    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    /// Returns the `[red, green, blue, alpha]` color at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<[u8; 4]> {
        Some([
            *self.red.get(index)?,
            self.green[index],
            self.blue[index],
            self.alpha[index],
        ])
    }

    /// Returns the [`PackedColor`] at the given index.
    #[must_use]
    pub fn get_packed(&self, index: usize) -> Option<PackedColor> {
        self.get(index).map(pack)
    }

    /// Returns an iterator over the `[red, green, blue, alpha]` colors in the palette.
    pub fn colors(&self) -> impl ExactSizeIterator<Item = [u8; 4]> + '_ {
        (0..self.len()).map(|i| [self.red[i], self.green[i], self.blue[i], self.alpha[i]])
    }

    /// Converts the palette to a `Vec` of [`Srgba<u8>`].
    #[must_use]
    pub fn to_srgba(&self) -> Vec<Srgba<u8>> {
        self.colors().map(|[r, g, b, a]| Srgba::new(r, g, b, a)).collect()
    }

    /// The number of bits needed per index for this palette (see [`bit_depth_for`]).
    #[must_use]
    pub fn bit_depth(&self) -> u8 {
        bit_depth_for(self.len())
    }
}

/// Returns the number of bits needed to store an index into a palette of the given length.
///
/// This is `max(1, ceil(log2(len)))`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn bit_depth_for(len: usize) -> u8 {
    if len <= 2 {
        1
    } else {
        (usize::BITS - (len - 1).leading_zeros()) as u8
    }
}

/// An image where each pixel has been replaced by an index into a [`Palette`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexedImage {
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
    /// The number of bits needed per index.
    bit_depth: u8,
    /// One palette index per pixel in row-major order.
    indices: Vec<u8>,
}

impl IndexedImage {
    /// Creates an [`IndexedImage`] without checking that
    /// `indices` has a length of `width * height`.
    pub(crate) fn new_unchecked(
        width: u32,
        height: u32,
        palette_len: usize,
        indices: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            bit_depth: bit_depth_for(palette_len),
            indices,
        }
    }

    /// The width of the image in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The number of bits used per index in [`IndexedImage::to_packed_rows`].
    #[must_use]
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// The palette index of each pixel in row-major order.
    #[must_use]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Consumes the image and returns its indices.
    #[must_use]
    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }

    /// Returns the palette index of the pixel at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            self.indices
                .get(y as usize * self.width as usize + x as usize)
                .copied()
        } else {
            None
        }
    }

    /// Packs the indices into rows of [`IndexedImage::bit_depth`] bits each.
    ///
    /// Indices are packed most significant bit first and each row is padded to a whole byte,
    /// matching the layout of PNG and GIF indexed rasters.
    #[must_use]
    pub fn to_packed_rows(&self) -> Vec<u8> {
        let width = self.width as usize;
        if width == 0 || self.height == 0 {
            return Vec::new();
        }

        let depth = u32::from(self.bit_depth);
        let row_bits = (width * depth as usize).next_multiple_of(8);
        let mut bits = BitVec::<u8, Msb0>::with_capacity(row_bits * self.height as usize);

        for row in self.indices.chunks_exact(width) {
            for &index in row {
                for bit in (0..depth).rev() {
                    bits.push((index >> bit) & 1 == 1);
                }
            }
            let padded = bits.len().next_multiple_of(8);
            bits.resize(padded, false);
        }

        bits.into_vec()
    }

    /// Converts the image back into RGBA pixels using the given palette.
    ///
    /// Indices outside of the palette become transparent black.
    #[cfg(feature = "image")]
    #[must_use]
    pub fn to_rgba_image(&self, palette: &Palette) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let color = self
                .get(x, y)
                .and_then(|i| palette.get(usize::from(i)))
                .unwrap_or([0; 4]);
            image::Rgba(color)
        })
    }
}

/// The output struct returned by [`median_cut::build_palette`](crate::median_cut::build_palette).
///
/// It contains the color `palette`, alongside `counts` which has the number of
/// histogram samples assigned to each palette color, and an `indexer`
/// that maps any color to its palette index.
#[derive(Debug)]
pub struct QuantizeOutput {
    /// The computed color palette, sorted by ascending alpha.
    ///
    /// The colors in the palette are not guaranteed to be unique.
    pub palette: Palette,
    /// The number of samples assigned to each color in `palette`.
    ///
    /// Each count is not guaranteed to be non-zero.
    pub counts: Vec<u64>,
    /// The indexer for the palette, primed with the palette index of every histogram color.
    pub indexer: CachingIndexer<MappedIndexer>,
}

impl QuantizeOutput {
    /// Returns the palette entry for the given packed color using the `indexer`.
    #[must_use]
    pub fn lookup(&self, color: PackedColor) -> u8 {
        self.indexer.closest_index(unpack(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_size_bounds() {
        assert!(PaletteSize::try_from(0u8).is_err());
        assert_eq!(PaletteSize::try_from(1u8).map(PaletteSize::into_inner), Ok(1));
        assert_eq!(PaletteSize::try_from(256u16), Ok(PaletteSize::MAX));
        assert_eq!(PaletteSize::try_from(257u32), Err(QuantizeError::InvalidPaletteSize(257)));
        assert_eq!(
            PaletteSize::try_from(70_000u32),
            Err(QuantizeError::InvalidPaletteSize(70_000))
        );
        assert_eq!(PaletteSize::default(), PaletteSize::MAX);
    }

    #[test]
    fn palette_requires_one_to_256_colors() {
        assert_eq!(Palette::new([]), Err(QuantizeError::InvalidPaletteSize(0)));
        assert!(Palette::new(vec![[0; 4]; 256]).is_ok());
        assert_eq!(
            Palette::new(vec![[0; 4]; 257]),
            Err(QuantizeError::InvalidPaletteSize(257))
        );
    }

    #[test]
    fn palette_components() {
        let palette = Palette::new([[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.red(), &[1, 5]);
        assert_eq!(palette.green(), &[2, 6]);
        assert_eq!(palette.blue(), &[3, 7]);
        assert_eq!(palette.alpha(), &[4, 8]);
        assert_eq!(palette.get(1), Some([5, 6, 7, 8]));
        assert_eq!(palette.get(2), None);
        assert_eq!(palette.get_packed(0), Some(pack([1, 2, 3, 4])));
        assert_eq!(palette.to_srgba(), vec![Srgba::new(1, 2, 3, 4), Srgba::new(5, 6, 7, 8)]);
    }

    #[test]
    fn bit_depths() {
        assert_eq!(bit_depth_for(1), 1);
        assert_eq!(bit_depth_for(2), 1);
        assert_eq!(bit_depth_for(3), 2);
        assert_eq!(bit_depth_for(4), 2);
        assert_eq!(bit_depth_for(5), 3);
        assert_eq!(bit_depth_for(16), 4);
        assert_eq!(bit_depth_for(17), 5);
        assert_eq!(bit_depth_for(256), 8);
    }

    #[test]
    fn packed_rows_are_byte_aligned() {
        let image = IndexedImage::new_unchecked(3, 2, 2, vec![1, 0, 1, 0, 1, 1]);
        assert_eq!(image.to_packed_rows(), vec![0b1010_0000, 0b0110_0000]);

        let image = IndexedImage::new_unchecked(3, 1, 5, vec![1, 2, 4]);
        assert_eq!(image.bit_depth(), 3);
        assert_eq!(image.to_packed_rows(), vec![0b0010_1010, 0b0000_0000]);

        let image = IndexedImage::new_unchecked(2, 1, 256, vec![0xab, 0xcd]);
        assert_eq!(image.to_packed_rows(), vec![0xab, 0xcd]);

        let image = IndexedImage::new_unchecked(0, 0, 2, Vec::new());
        assert!(image.to_packed_rows().is_empty());
    }

    #[test]
    fn indexed_get() {
        let image = IndexedImage::new_unchecked(2, 2, 4, vec![0, 1, 2, 3]);
        assert_eq!(image.get(1, 1), Some(3));
        assert_eq!(image.get(0, 1), Some(2));
        assert_eq!(image.get(2, 0), None);
    }

    #[cfg(feature = "image")]
    #[test]
    fn rgba_image_from_indices() {
        let palette = Palette::new([[255, 0, 0, 255], [0, 0, 255, 128]]).unwrap();
        let image = IndexedImage::new_unchecked(2, 1, 2, vec![1, 0]);
        let rgba = image.to_rgba_image(&palette);
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 128]);
        assert_eq!(rgba.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
