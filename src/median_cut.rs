//! Median cut color quantization.
//!
//! The histogram colors are held in a single array and every box owns a contiguous range of it.
//! Splitting a box sorts its range along the channel with the widest span
//! and cuts the range in two, so the boxes always partition the array.
//!
//! Boxes are chosen for splitting by their pixel count until a fraction of the target palette size
//! is reached (see [`MedianCutOptions::sort_switch_ratio`]). After that, the box with the largest
//! product of its per channel spans and pixel count is split instead,
//! so that sparse but widely spread regions of the color space also get palette entries.

use crate::{
    color::{pack, unpack, unshift_color, Channel},
    indexer::{CachingIndexer, ExhaustiveIndexer, MappedIndexer},
    ColorIndexer, HistogramBin, MedianCutOptions, PackedColor, PackedColorMap, PackedHistogram,
    Palette, PaletteSize, QuantizeError, QuantizeOutput, RepresentativeColor, SplitStrategy,
};
use log::debug;
use std::ops::Range;

/// The per channel `(min, max)` of the colors in a box, indexed by [`Channel::index`].
type Bounds = [(u8, u8); 4];

/// A contiguous range of histogram bins.
#[derive(Debug, Clone)]
struct ColorBox {
    /// The range of bins covered by this box.
    range: Range<usize>,
    /// The total pixel count of the bins.
    sum: u64,
    /// The per channel bounds of the bins.
    bounds: Bounds,
}

impl ColorBox {
    /// Creates a box over the given range of bins.
    fn new(bins: &[HistogramBin], range: Range<usize>) -> Self {
        let slice = &bins[range.clone()];

        let mut bounds = [(u8::MAX, u8::MIN); 4];
        for bin in slice {
            for (bound, c) in bounds.iter_mut().zip(unpack(bin.color)) {
                bound.0 = bound.0.min(c);
                bound.1 = bound.1.max(c);
            }
        }

        Self {
            sum: slice.iter().map(|bin| bin.count).sum(),
            range,
            bounds,
        }
    }

    /// Whether the box has more than one color.
    fn is_splittable(&self) -> bool {
        self.range.len() > 1
    }

    /// The difference between the largest and smallest value of the given channel.
    fn span(&self, channel: Channel) -> u8 {
        let (min, max) = self.bounds[channel.index()];
        max - min
    }

    /// The channel with the largest span. Ties go to alpha, then red, then green, then blue.
    fn widest_axis(&self) -> Channel {
        let mut widest = Channel::PRIORITY[0];
        for channel in Channel::PRIORITY {
            if self.span(channel) > self.span(widest) {
                widest = channel;
            }
        }
        widest
    }

    /// The product of `span + 1` over all channels multiplied by the pixel count.
    fn weighted_volume(&self) -> u128 {
        Channel::PRIORITY
            .iter()
            .map(|&c| u128::from(self.span(c)) + 1)
            .product::<u128>()
            * u128::from(self.sum)
    }
}

/// Stable sorts the bins by the given channel, breaking ties by ascending count.
fn sort_along(bins: &mut [HistogramBin], axis: Channel) {
    bins.sort_by_key(|bin| (axis.of(bin.color), bin.count));
}

/// Returns the number of leading bins needed to accumulate at least half of `sum`.
fn population_median(bins: &[HistogramBin], sum: u64) -> usize {
    let half = sum.div_ceil(2);
    let mut acc = 0;
    for (i, bin) in bins.iter().enumerate() {
        acc += bin.count;
        if acc >= half {
            return i + 1;
        }
    }
    bins.len()
}

/// Returns the index of the box to split next, or `None` if every box has a single color.
///
/// Ties go to the earliest box.
fn select(boxes: &[ColorBox], by_volume: bool) -> Option<usize> {
    let mut best: Option<(usize, u128)> = None;
    for (i, color_box) in boxes.iter().enumerate() {
        if !color_box.is_splittable() {
            continue;
        }

        let key = if by_volume {
            color_box.weighted_volume()
        } else {
            u128::from(color_box.sum)
        };

        if best.map_or(true, |(_, best_key)| key > best_key) {
            best = Some((i, key));
        }
    }
    best.map(|(i, _)| i)
}

/// Splits a box with at least two colors into a lower and upper half.
fn split(
    bins: &mut [HistogramBin],
    color_box: &ColorBox,
    strategy: SplitStrategy,
) -> (ColorBox, ColorBox) {
    let axis = color_box.widest_axis();
    let Range { start, end } = color_box.range;
    let slice = &mut bins[start..end];
    sort_along(slice, axis);

    let at = match strategy {
        SplitStrategy::MedianPopulation => population_median(slice, color_box.sum),
        SplitStrategy::HalfSum => {
            let (min, max) = color_box.bounds[axis.index()];
            let mid = (u16::from(min) + u16::from(max)) / 2;
            slice.partition_point(|bin| u16::from(axis.of(bin.color)) <= mid)
        }
    };
    let mid = start + at.clamp(1, slice.len() - 1);

    (ColorBox::new(bins, start..mid), ColorBox::new(bins, mid..end))
}

/// Partitions the bins into at most `target` boxes.
fn cut(bins: &mut [HistogramBin], target: usize, options: &MedianCutOptions) -> Vec<ColorBox> {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let switch = (target as f64 * options.effective_sort_switch_ratio()).round() as usize;

    let mut boxes = Vec::with_capacity(target);
    boxes.push(ColorBox::new(bins, 0..bins.len()));

    while boxes.len() < target {
        let by_volume = boxes.len() >= switch;
        let Some(i) = select(&boxes, by_volume) else {
            break;
        };
        let (lower, upper) = split(bins, &boxes[i], options.split);
        boxes[i] = lower;
        boxes.push(upper);
    }

    boxes
}

/// Returns the color chosen to stand for all colors in the box.
fn representative(
    bins: &mut [HistogramBin],
    color_box: &ColorBox,
    strategy: RepresentativeColor,
) -> PackedColor {
    let slice = &mut bins[color_box.range.clone()];
    if let [bin] = slice {
        return bin.color;
    }

    match strategy {
        RepresentativeColor::MedianPick => {
            sort_along(slice, color_box.widest_axis());
            slice[population_median(slice, color_box.sum) - 1].color
        }
        RepresentativeColor::WeightedAverage => {
            let mut sums = [0u64; 4];
            for bin in &*slice {
                for (sum, c) in sums.iter_mut().zip(unpack(bin.color)) {
                    *sum += u64::from(c) * bin.count;
                }
            }
            let total = color_box.sum;
            #[allow(clippy::cast_possible_truncation)]
            let mean = sums.map(|sum| ((sum + total / 2) / total) as u8);
            pack(mean)
        }
    }
}

/// Computes a palette of at most `palette_size` colors for the histogram using median cut.
///
/// The palette is sorted by ascending alpha and always has at least two colors:
/// if only a single box results, its color is repeated.
/// The returned [`QuantizeOutput::indexer`] is primed with the palette index of every histogram color.
///
/// # Errors
/// Returns [`QuantizeError::EmptyImage`] if the histogram has no colors.
///
/// # Examples
/// ```
/// # use packquant::{
/// #     median_cut, ColorIndexer, MedianCutOptions, PackedHistogram, PaletteSize, QuantizeError,
/// # };
/// # fn main() -> Result<(), QuantizeError> {
/// let histogram = PackedHistogram::from_colors([[255, 0, 0, 255], [0, 0, 255, 255]]);
/// let output = median_cut::build_palette(&histogram, PaletteSize::MAX, &MedianCutOptions::new())?;
/// assert_eq!(output.palette.len(), 2);
/// let red = output.indexer.closest_index([250, 5, 5, 255]);
/// assert_eq!(output.palette.get(usize::from(red)), Some([255, 0, 0, 255]));
/// # Ok(())
/// # }
/// ```
pub fn build_palette(
    histogram: &PackedHistogram,
    palette_size: PaletteSize,
    options: &MedianCutOptions,
) -> Result<QuantizeOutput, QuantizeError> {
    if histogram.is_empty() {
        return Err(QuantizeError::EmptyImage);
    }

    let shift = histogram.shift();
    let mut bins = histogram.bins().to_vec();
    let target = bins.len().min(palette_size.as_usize());
    let boxes = cut(&mut bins, target, options);

    let mut colors = boxes
        .iter()
        .map(|color_box| {
            let color = representative(&mut bins, color_box, options.representative);
            unpack(unshift_color(color, shift))
        })
        .collect::<Vec<_>>();

    if let [color] = colors[..] {
        colors.push(color);
    }

    colors.sort_by_key(|color| color[3]);

    let palette = Palette::new(colors)?;
    let exhaustive = ExhaustiveIndexer::new(palette.clone());

    let mut reverse = PackedColorMap::with_capacity(bins.len() * 2);
    let mut counts = vec![0; palette.len()];
    for bin in &bins {
        let index = exhaustive.closest_index(unpack(unshift_color(bin.color, shift)));
        reverse.put(bin.color, i32::from(index))?;
        counts[usize::from(index)] += bin.count;
    }

    debug!(
        "median cut reduced {} colors (shift {shift}) to {} boxes for a palette of {}",
        bins.len(),
        boxes.len(),
        palette.len(),
    );

    Ok(QuantizeOutput {
        palette,
        counts,
        indexer: CachingIndexer::new(MappedIndexer::new(exhaustive, reverse, shift)),
    })
}
