//! Contains the options for the median cut quantizer.

/// Where a box is split along its widest axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplitStrategy {
    /// Split so that each half holds about half of the box's pixels.
    #[default]
    MedianPopulation,
    /// Split at the midpoint of the box's value range along the axis.
    HalfSum,
}

/// How the palette color of a finished box is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepresentativeColor {
    /// The color of the bin at the population median along the box's widest axis.
    #[default]
    MedianPick,
    /// The count weighted mean of all colors in the box.
    WeightedAverage,
}

/// A builder struct to specify the parameters for median cut.
///
/// # Examples
/// ```
/// # use packquant::{MedianCutOptions, RepresentativeColor, SplitStrategy};
/// let options = MedianCutOptions::new()
///     .split_strategy(SplitStrategy::HalfSum)
///     .representative(RepresentativeColor::WeightedAverage)
///     .sort_switch_ratio(0.75);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianCutOptions {
    /// Where boxes are split.
    pub(crate) split: SplitStrategy,
    /// How box colors are chosen.
    pub(crate) representative: RepresentativeColor,
    /// The fraction of the palette built by splitting the most populated box
    /// before switching to the box with the largest weighted volume.
    pub(crate) sort_switch_ratio: f64,
}

impl Default for MedianCutOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MedianCutOptions {
    /// The default value for [`MedianCutOptions::sort_switch_ratio`].
    pub const DEFAULT_SORT_SWITCH_RATIO: f64 = 0.5;

    /// Creates a new [`MedianCutOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            split: SplitStrategy::MedianPopulation,
            representative: RepresentativeColor::MedianPick,
            sort_switch_ratio: Self::DEFAULT_SORT_SWITCH_RATIO,
        }
    }

    /// Sets where boxes are split.
    ///
    /// The default is [`SplitStrategy::MedianPopulation`].
    #[must_use]
    pub const fn split_strategy(mut self, split: SplitStrategy) -> Self {
        self.split = split;
        self
    }

    /// Sets how the palette color of each box is chosen.
    ///
    /// The default is [`RepresentativeColor::MedianPick`].
    #[must_use]
    pub const fn representative(mut self, representative: RepresentativeColor) -> Self {
        self.representative = representative;
        self
    }

    /// Sets the fraction of the target palette size that is reached by always splitting
    /// the most populated box. The remaining splits go to the box with the largest
    /// count weighted volume.
    ///
    /// The default ratio is `0.5`. Ratios outside of `0.0..=1.0` (or `NAN`) fall back to the default.
    #[must_use]
    pub const fn sort_switch_ratio(mut self, ratio: f64) -> Self {
        self.sort_switch_ratio = ratio;
        self
    }

    /// Returns the sort switch ratio to use, replacing invalid ratios with the default.
    pub(crate) fn effective_sort_switch_ratio(&self) -> f64 {
        if (0.0..=1.0).contains(&self.sort_switch_ratio) {
            self.sort_switch_ratio
        } else {
            Self::DEFAULT_SORT_SWITCH_RATIO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ratio_falls_back() {
        let ratio = |r| MedianCutOptions::new().sort_switch_ratio(r).effective_sort_switch_ratio();
        assert!((ratio(0.25) - 0.25).abs() < f64::EPSILON);
        assert!((ratio(-1.0) - 0.5).abs() < f64::EPSILON);
        assert!((ratio(f64::NAN) - 0.5).abs() < f64::EPSILON);
        assert!((ratio(1.5) - 0.5).abs() < f64::EPSILON);
    }
}
