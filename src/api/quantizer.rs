//! Contains the [`Quantizer`] builder struct for the high level API.

#[cfg(feature = "threads")]
use crate::remap_par;
use crate::{
    median_cut, remap, IndexedImage, MedianCutOptions, PackedHistogram, Palette, PaletteSize,
    QuantizeError, QuantizeOutput, Raster, RepresentativeColor, SplitStrategy,
};
#[cfg(feature = "image")]
use image::RgbaImage;

/// A builder struct to specify options to create a palette and an indexed image from a [`Raster`].
///
/// # Examples
/// Configure the quantizer, then run it on any [`Raster`]:
/// ```
/// # use packquant::{
/// #     Bands, PaletteSize, Quantizer, QuantizeError, RasterImage, RepresentativeColor,
/// # };
/// # fn main() -> Result<(), QuantizeError> {
/// let raster = RasterImage::new(2, 2, Bands::Rgb, vec![
///     255, 0, 0,   0, 255, 0,
///     0, 0, 255,   255, 0, 0,
/// ])?;
///
/// let (palette, image) = Quantizer::new()
///     .max_colors(PaletteSize::try_from(16u8)?)
///     .representative(RepresentativeColor::WeightedAverage)
///     .quantize(&raster)?;
///
/// assert_eq!(palette.len(), 3);
/// assert_eq!(image.get(0, 0), image.get(1, 1));
/// # Ok(())
/// # }
/// ```
///
/// Or, remap the image in parallel across multiple threads (needs the `threads` feature):
/// ```no_run
/// # use packquant::Quantizer;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let (palette, image) = Quantizer::new().subsample(true).quantize_par(&img)?;
/// let packed = image.to_packed_rows();
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    /// The maximum number of colors in the palette.
    max_colors: PaletteSize,
    /// Whether to build the histogram from a subset of the pixels.
    subsample: bool,
    /// The options for the median cut.
    options: MedianCutOptions,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Quantizer {
    /// Creates a new [`Quantizer`] with default options.
    pub const fn new() -> Self {
        Self {
            max_colors: PaletteSize::MAX,
            subsample: false,
            options: MedianCutOptions::new(),
        }
    }

    /// Sets the maximum number of colors in the palette.
    ///
    /// The default palette size is [`PaletteSize::MAX`].
    pub fn max_colors(&mut self, size: PaletteSize) -> &mut Self {
        self.max_colors = size;
        self
    }

    /// Sets whether to build the histogram from a regular grid of sampled pixels.
    ///
    /// Each axis is sampled with a stride of `1 + floor(log8(dimension))`,
    /// so larger images are sampled more sparsely. The remap pass still visits every pixel.
    ///
    /// The default value is `false`.
    pub fn subsample(&mut self, subsample: bool) -> &mut Self {
        self.subsample = subsample;
        self
    }

    /// Sets where boxes are split.
    ///
    /// The default is [`SplitStrategy::MedianPopulation`].
    pub fn split_strategy(&mut self, split: SplitStrategy) -> &mut Self {
        self.options = self.options.split_strategy(split);
        self
    }

    /// Sets how the palette color of each box is chosen.
    ///
    /// The default is [`RepresentativeColor::MedianPick`].
    pub fn representative(&mut self, representative: RepresentativeColor) -> &mut Self {
        self.options = self.options.representative(representative);
        self
    }

    /// Sets the fraction of the palette built by splitting the most populated box
    /// (see [`MedianCutOptions::sort_switch_ratio`]).
    ///
    /// The default value is [`MedianCutOptions::DEFAULT_SORT_SWITCH_RATIO`].
    pub fn sort_switch_ratio(&mut self, ratio: f64) -> &mut Self {
        self.options = self.options.sort_switch_ratio(ratio);
        self
    }

    /// Replaces all median cut options at once.
    pub fn median_cut_options(&mut self, options: MedianCutOptions) -> &mut Self {
        self.options = options;
        self
    }
}

/// Returns the sampling stride for an image dimension.
fn subsample_step(dimension: u32) -> u32 {
    1 + dimension.max(1).ilog(8)
}

impl Quantizer {
    /// Builds the color histogram of the raster according to the current options.
    #[must_use]
    pub fn histogram<R: Raster + ?Sized>(&self, raster: &R) -> PackedHistogram {
        if self.subsample {
            PackedHistogram::with_sampling(
                raster,
                subsample_step(raster.width()),
                subsample_step(raster.height()),
            )
        } else {
            PackedHistogram::new(raster)
        }
    }

    /// Computes the palette of the raster and returns it together with its color indexer.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyImage`] if the raster has no pixels.
    pub fn build_color_indexer<R: Raster + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<QuantizeOutput, QuantizeError> {
        let histogram = self.histogram(raster);
        median_cut::build_palette(&histogram, self.max_colors, &self.options)
    }

    /// Computes the palette of the raster and replaces every pixel with its palette index.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyImage`] if the raster has no pixels.
    pub fn quantize<R: Raster + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<(Palette, IndexedImage), QuantizeError> {
        let output = self.build_color_indexer(raster)?;
        let image = remap(raster, &output.indexer);
        Ok((output.palette, image))
    }

    /// Runs the quantizer and converts the result back into an [`RgbaImage`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyImage`] if the raster has no pixels.
    #[cfg(feature = "image")]
    pub fn quantized_rgba_image<R: Raster + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<RgbaImage, QuantizeError> {
        let (palette, image) = self.quantize(raster)?;
        Ok(image.to_rgba_image(&palette))
    }
}

#[cfg(feature = "threads")]
impl Quantizer {
    /// Computes the palette of the raster and replaces every pixel with its palette index,
    /// remapping tiles in parallel.
    ///
    /// The result is identical to [`Quantizer::quantize`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyImage`] if the raster has no pixels.
    pub fn quantize_par<R: Raster + Sync + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<(Palette, IndexedImage), QuantizeError> {
        let output = self.build_color_indexer(raster)?;
        let image = remap_par(raster, &output.indexer);
        Ok((output.palette, image))
    }

    /// Runs the quantizer in parallel and converts the result back into an [`RgbaImage`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyImage`] if the raster has no pixels.
    #[cfg(feature = "image")]
    pub fn quantized_rgba_image_par<R: Raster + Sync + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<RgbaImage, QuantizeError> {
        let (palette, image) = self.quantize_par(raster)?;
        Ok(image.to_rgba_image(&palette))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::*, Bands, ColorIndexer, RasterImage, MAX_COLORS};
    use std::collections::HashSet;

    #[test]
    fn subsample_steps() {
        assert_eq!(subsample_step(0), 1);
        assert_eq!(subsample_step(1), 1);
        assert_eq!(subsample_step(7), 1);
        assert_eq!(subsample_step(8), 2);
        assert_eq!(subsample_step(10), 2);
        assert_eq!(subsample_step(64), 3);
        assert_eq!(subsample_step(100), 3);
        assert_eq!(subsample_step(1000), 4);
        assert_eq!(subsample_step(5000), 5);
    }

    #[test]
    fn empty_image() {
        let raster = raster(0, 0, &[]);
        assert_eq!(Quantizer::new().quantize(&raster).unwrap_err(), QuantizeError::EmptyImage);
    }

    #[test]
    fn lossless_round_trip() {
        let colors = test_data_256();
        let colors = colors
            .iter()
            .chain(colors.iter().rev())
            .copied()
            .collect::<Vec<_>>();
        let raster = raster(32, 16, &colors);

        let (palette, image) = Quantizer::new().quantize(&raster).unwrap();
        assert_eq!(palette.len(), usize::from(MAX_COLORS));
        assert_eq!(
            palette.colors().collect::<HashSet<_>>(),
            colors.iter().copied().collect::<HashSet<_>>()
        );
        for (&index, &color) in image.indices().iter().zip(&colors) {
            assert_eq!(palette.get(usize::from(index)), Some(color));
        }
    }

    #[test]
    fn palette_len_is_min_of_unique_and_max() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors);
        let unique = colors.iter().collect::<HashSet<_>>().len();
        for n in [2u16, 5, 64, 256] {
            let (palette, image) = Quantizer::new()
                .max_colors(PaletteSize::try_from(n).unwrap())
                .quantize(&raster)
                .unwrap();
            assert_eq!(palette.len(), unique.min(usize::from(n)));
            assert!(image.indices().iter().all(|&i| usize::from(i) < palette.len()));
        }
    }

    #[test]
    fn two_by_two_reds_share_an_index() {
        let raster = RasterImage::new(
            2,
            2,
            Bands::Rgb,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 0, 0],
        )
        .unwrap();
        let (palette, image) = Quantizer::new()
            .max_colors(PaletteSize::try_from(2u8).unwrap())
            .quantize(&raster)
            .unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(image.get(0, 0), image.get(1, 1));
        assert_eq!(image.bit_depth(), 1);
    }

    #[test]
    fn all_transparent() {
        let raster = RasterImage::new(4, 4, Bands::Rgba, vec![0; 64]).unwrap();
        let (palette, image) = Quantizer::new().quantize(&raster).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(0), Some([255, 255, 255, 0]));
        let first = image.indices()[0];
        assert!(image.indices().iter().all(|&i| i == first));
    }

    #[test]
    fn gray_alpha_input() {
        let samples = vec![0, 255, 255, 255, 128, 3, 0, 255];
        let raster = RasterImage::new(2, 2, Bands::GrayAlpha, samples).unwrap();
        let (palette, image) = Quantizer::new().quantize(&raster).unwrap();
        assert_eq!(palette.len(), 3);
        // sorted by alpha, so the transparent entry is first
        assert_eq!(palette.get(0), Some([255, 255, 255, 0]));
        assert_eq!(image.get(0, 1), Some(0));
        assert_eq!(image.get(0, 0), image.get(1, 1));
    }

    #[test]
    fn subsampled_histogram() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors);
        let mut quantizer = Quantizer::new();
        quantizer.subsample(true);
        let histogram = quantizer.histogram(&raster);
        assert_eq!(histogram.total_count(), 16 * 16);

        let (palette, image) = quantizer.quantize(&raster).unwrap();
        assert!(palette.len() <= 256);
        assert_eq!(image.indices().len(), 1024);
    }

    #[test]
    fn indexer_matches_quantized_indices() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors);
        let quantizer = *Quantizer::new().max_colors(PaletteSize::try_from(32u8).unwrap());
        let output = quantizer.build_color_indexer(&raster).unwrap();
        let (palette, image) = quantizer.quantize(&raster).unwrap();
        assert_eq!(output.palette, palette);
        for (&index, &color) in image.indices().iter().zip(&colors) {
            assert_eq!(output.indexer.closest_index(color), index);
        }
    }

    #[test]
    fn options_are_deterministic() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors);
        for split in [SplitStrategy::MedianPopulation, SplitStrategy::HalfSum] {
            let mut quantizer = Quantizer::new();
            quantizer
                .split_strategy(split)
                .representative(RepresentativeColor::WeightedAverage)
                .sort_switch_ratio(0.25)
                .max_colors(PaletteSize::try_from(40u8).unwrap());
            assert_eq!(quantizer.quantize(&raster).unwrap(), quantizer.quantize(&raster).unwrap());
        }
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors).with_tile_size(8, 8).unwrap();
        let quantizer = *Quantizer::new().max_colors(PaletteSize::try_from(64u8).unwrap());
        assert_eq!(quantizer.quantize_par(&raster).unwrap(), quantizer.quantize(&raster).unwrap());
    }

    #[cfg(feature = "image")]
    #[test]
    fn rgba_image_output() {
        let colors = test_data_256();
        let img =
            image::RgbaImage::from_fn(16, 16, |x, y| image::Rgba(colors[(y * 16 + x) as usize]));
        let quantized = Quantizer::new().quantized_rgba_image(&img).unwrap();
        assert_eq!(quantized, img);
    }
}
