//! Contains the color histogram built from the pixels of a [`Raster`].

use crate::{
    color::{normalize_alpha, shift_color, MAX_SHIFT},
    PackedColor, PackedColorMap, Raster, MAX_HISTOGRAM_COLORS,
};
use log::debug;
use std::collections::HashMap;

/// The largest count stored directly in the [`PackedColorMap`] of a [`HistogramBuilder`].
/// Counts above this spill over into a side table.
const MAP_LIMIT: u64 = i32::MAX as u64;

/// A distinct (possibly precision reduced) color and the number of samples that had it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramBin {
    /// The packed color, with each component shifted right by [`PackedHistogram::shift`].
    pub color: PackedColor,
    /// The number of samples with this color. Always greater than zero.
    pub count: u64,
}

/// A histogram of the distinct colors of an image.
///
/// Pixels with an alpha at or below [`ALPHA_THRESHOLD`](crate::color::ALPHA_THRESHOLD) are
/// counted as [`TRANSPARENT`](crate::color::TRANSPARENT). If more than [`MAX_HISTOGRAM_COLORS`]
/// distinct colors are seen, the precision of every component is reduced by one bit at a time
/// until the distinct colors fit again. The total count is never affected by this.
///
/// # Examples
/// ```
/// # use packquant::{Bands, PackedHistogram, RasterImage, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let raster = RasterImage::new(2, 2, Bands::Gray, vec![0, 0, 255, 0])?;
/// let histogram = PackedHistogram::new(&raster);
/// assert_eq!(histogram.len(), 2);
/// assert_eq!(histogram.total_count(), 4);
/// assert_eq!(histogram.shift(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedHistogram {
    /// The distinct colors and their counts.
    bins: Vec<HistogramBin>,
    /// The number of low bits dropped from each component.
    shift: u32,
    /// The sum of all counts.
    total_count: u64,
}

impl PackedHistogram {
    /// Builds a histogram from every pixel of the raster.
    #[must_use]
    pub fn new<R: Raster + ?Sized>(raster: &R) -> Self {
        Self::with_sampling(raster, 1, 1)
    }

    /// Builds a histogram from the pixels of the raster whose `x` coordinate is a multiple of `step_x`
    /// and whose `y` coordinate is a multiple of `step_y`.
    ///
    /// Steps of `0` are treated as `1`.
    #[must_use]
    pub fn with_sampling<R: Raster + ?Sized>(raster: &R, step_x: u32, step_y: u32) -> Self {
        let step_x = step_x.max(1);
        let step_y = step_y.max(1);
        let mut builder = HistogramBuilder::new();

        for tile in raster.tiles() {
            let ys = tile.ys();
            let xs = tile.xs();
            let y_start = ys.start.next_multiple_of(step_y);
            let x_start = xs.start.next_multiple_of(step_x);

            for y in (y_start..ys.end).step_by(step_y as usize) {
                for x in (x_start..xs.end).step_by(step_x as usize) {
                    builder.add(raster.rgba(x, y));
                }
            }
        }

        builder.finish()
    }

    /// Builds a histogram from an iterator of `[red, green, blue, alpha]` colors.
    #[must_use]
    pub fn from_colors(colors: impl IntoIterator<Item = [u8; 4]>) -> Self {
        let mut builder = HistogramBuilder::new();
        for color in colors {
            builder.add(color);
        }
        builder.finish()
    }

    /// The distinct colors and their counts, in no particular order.
    #[must_use]
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// The number of distinct colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether there are no colors (no pixels were sampled).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// The number of low bits dropped from each component of each bin color.
    #[must_use]
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// The number of sampled pixels.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Incrementally counts colors into a [`PackedHistogram`].
#[derive(Debug, Clone, Default)]
pub struct HistogramBuilder {
    /// Count per color modulo [`MAP_LIMIT`].
    counts: PackedColorMap,
    /// The multiples of [`MAP_LIMIT`] for colors that have overflowed the map.
    spilled: HashMap<PackedColor, u64>,
    /// The current precision reduction.
    shift: u32,
    /// The number of added colors.
    total_count: u64,
}

impl HistogramBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one `[red, green, blue, alpha]` color.
    #[inline]
    pub fn add(&mut self, rgba: [u8; 4]) {
        let color = shift_color(normalize_alpha(rgba), self.shift);
        self.total_count += 1;

        if u64::from(self.counts.increment(color).unsigned_abs()) >= MAP_LIMIT {
            *self.spilled.entry(color).or_insert(0) += MAP_LIMIT;
            store(&mut self.counts, color, 0);
        }

        if self.counts.len() > MAX_HISTOGRAM_COLORS {
            self.rebucket();
        }
    }

    /// The number of distinct colors counted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no colors have been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drops one more bit of precision from every color until the distinct colors fit.
    fn rebucket(&mut self) {
        while self.counts.len() > MAX_HISTOGRAM_COLORS && self.shift < MAX_SHIFT {
            let before = self.counts.len();
            self.shift += 1;

            let mut counts = PackedColorMap::with_capacity(self.counts.capacity());
            let mut spilled = HashMap::with_capacity(self.spilled.len());

            for (color, count) in &self.counts {
                let color = shift_color(color, 1);
                let current = counts.get(color).map_or(0, |c| u64::from(c.unsigned_abs()));
                let total = current + u64::from(count.unsigned_abs());
                if total >= MAP_LIMIT {
                    *spilled.entry(color).or_insert(0) += MAP_LIMIT;
                }
                store(&mut counts, color, total % MAP_LIMIT);
            }

            for (color, extra) in self.spilled.drain() {
                *spilled.entry(shift_color(color, 1)).or_insert(0) += extra;
            }

            self.counts.reset(counts);
            self.spilled = spilled;

            debug!(
                "histogram exceeded {MAX_HISTOGRAM_COLORS} colors, \
                 shifted by {} bits: {before} -> {} colors",
                self.shift,
                self.counts.len(),
            );
        }
    }

    /// Finishes counting and returns the histogram.
    #[must_use]
    pub fn finish(self) -> PackedHistogram {
        let bins = self
            .counts
            .iter()
            .map(|(color, count)| HistogramBin {
                color,
                count: u64::from(count.unsigned_abs())
                    + self.spilled.get(&color).copied().unwrap_or(0),
            })
            .collect();

        PackedHistogram {
            bins,
            shift: self.shift,
            total_count: self.total_count,
        }
    }
}

/// Stores a count below [`MAP_LIMIT`] in the map.
#[inline]
fn store(counts: &mut PackedColorMap, color: PackedColor, count: u64) {
    debug_assert!(count < MAP_LIMIT);
    #[allow(clippy::cast_possible_truncation)]
    let count = count as i32;
    // non-negative, so this cannot fail
    let _ = counts.put(color, count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::{pack, TRANSPARENT},
        tests::*,
        Bands, RasterImage,
    };

    fn sum(histogram: &PackedHistogram) -> u64 {
        histogram.bins().iter().map(|bin| bin.count).sum()
    }

    #[test]
    fn counts_distinct_colors() {
        let colors = test_data_256();
        let histogram = PackedHistogram::from_colors(colors.iter().chain(&colors).copied());
        assert_eq!(histogram.len(), 256);
        assert_eq!(histogram.total_count(), 512);
        assert!(histogram.bins().iter().all(|bin| bin.count == 2));
        assert_eq!(histogram.shift(), 0);
    }

    #[test]
    fn empty_input() {
        let histogram = PackedHistogram::from_colors(std::iter::empty());
        assert!(histogram.is_empty());
        assert_eq!(histogram.total_count(), 0);
    }

    #[test]
    fn gray_is_replicated() {
        let raster = RasterImage::new(3, 1, Bands::Gray, vec![7, 7, 200]).unwrap();
        let histogram = PackedHistogram::new(&raster);
        let mut bins = histogram.bins().to_vec();
        bins.sort_by_key(|bin| bin.color);
        assert_eq!(
            bins,
            vec![
                HistogramBin { color: pack([7, 7, 7, 255]), count: 2 },
                HistogramBin { color: pack([200, 200, 200, 255]), count: 1 },
            ]
        );
    }

    #[test]
    fn near_transparent_pixels_collapse() {
        let raster = RasterImage::new(
            3,
            1,
            Bands::Rgba,
            vec![1, 2, 3, 0, 200, 100, 50, 8, 9, 9, 9, 9],
        )
        .unwrap();
        let histogram = PackedHistogram::new(&raster);
        assert_eq!(histogram.len(), 2);
        let transparent = histogram.bins().iter().find(|bin| bin.color == TRANSPARENT).unwrap();
        assert_eq!(transparent.count, 2);
    }

    #[test]
    fn rebuckets_above_max_colors() {
        let colors = (0..=MAX_HISTOGRAM_COLORS as u32 + 1).map(|i| {
            let [_, _, g, r] = i.to_be_bytes();
            [r, g, 0, 255]
        });
        let histogram = PackedHistogram::from_colors(colors);
        assert!(histogram.shift() >= 1);
        assert!(histogram.len() <= MAX_HISTOGRAM_COLORS);
        assert_eq!(histogram.total_count(), MAX_HISTOGRAM_COLORS as u64 + 2);
        assert_eq!(sum(&histogram), histogram.total_count());
    }

    #[test]
    fn rebucketing_preserves_total_count() {
        let colors = test_data_1024();
        let colors = (0..64).flat_map(|_| colors.iter().copied()).chain(
            (0..40_000u32).map(|i| {
                let [_, b, g, r] = i.to_be_bytes();
                [r, g, b, 128]
            }),
        );
        let histogram = PackedHistogram::from_colors(colors);
        assert!(histogram.shift() >= 1);
        assert!(histogram.len() <= MAX_HISTOGRAM_COLORS);
        assert_eq!(histogram.total_count(), 64 * 1024 + 40_000);
        assert_eq!(sum(&histogram), histogram.total_count());
    }

    #[test]
    fn subsampling_strides() {
        let data = (0..16).collect::<Vec<u8>>();
        let raster = RasterImage::new(4, 4, Bands::Gray, data)
            .unwrap()
            .with_tile_size(3, 3)
            .unwrap();
        let histogram = PackedHistogram::with_sampling(&raster, 2, 3);
        let mut grays = histogram
            .bins()
            .iter()
            .map(|bin| crate::color::red(bin.color))
            .collect::<Vec<_>>();
        grays.sort_unstable();
        assert_eq!(grays, vec![0, 2, 12, 14]);
        assert_eq!(histogram.total_count(), 4);
    }

    #[test]
    fn tile_size_does_not_change_counts() {
        let colors = test_data_1024();
        let whole = raster(32, 32, &colors);
        let tiled = whole.clone().with_tile_size(5, 7).unwrap();
        let mut a = PackedHistogram::new(&whole).bins().to_vec();
        let mut b = PackedHistogram::new(&tiled).bins().to_vec();
        a.sort_by_key(|bin| bin.color);
        b.sort_by_key(|bin| bin.color);
        assert_eq!(a, b);
    }
}
