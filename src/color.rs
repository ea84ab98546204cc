//! Packing of RGBA colors into `u32`s, precision reduction, and the color distance used for
//! nearest color lookups.

use palette::Srgba;
use std::cmp::Ordering;

/// An RGBA color packed into a `u32` as `alpha << 24 | red << 16 | green << 8 | blue`.
pub type PackedColor = u32;

/// The canonical fully transparent color (white with an alpha of `0`).
///
/// All pixels with an alpha at or below [`ALPHA_THRESHOLD`] are collapsed into this color.
pub const TRANSPARENT: PackedColor = pack([255, 255, 255, 0]);

/// Pixels with an alpha less than or equal to this value are treated as fully transparent.
pub const ALPHA_THRESHOLD: u8 = 8;

/// The largest supported bit shift for precision reduction.
pub const MAX_SHIFT: u32 = 7;

/// Packs the given `[red, green, blue, alpha]` components into a single [`PackedColor`].
#[inline]
#[must_use]
pub const fn pack([r, g, b, a]: [u8; 4]) -> PackedColor {
    u32::from_be_bytes([a, r, g, b])
}

/// Unpacks a [`PackedColor`] into its `[red, green, blue, alpha]` components.
#[inline]
#[must_use]
pub const fn unpack(color: PackedColor) -> [u8; 4] {
    let [a, r, g, b] = color.to_be_bytes();
    [r, g, b, a]
}

/// Returns the red component of a [`PackedColor`].
#[inline]
#[must_use]
pub const fn red(color: PackedColor) -> u8 {
    color.to_be_bytes()[1]
}

/// Returns the green component of a [`PackedColor`].
#[inline]
#[must_use]
pub const fn green(color: PackedColor) -> u8 {
    color.to_be_bytes()[2]
}

/// Returns the blue component of a [`PackedColor`].
#[inline]
#[must_use]
pub const fn blue(color: PackedColor) -> u8 {
    color.to_be_bytes()[3]
}

/// Returns the alpha component of a [`PackedColor`].
#[inline]
#[must_use]
pub const fn alpha(color: PackedColor) -> u8 {
    color.to_be_bytes()[0]
}

/// Drops the lowest `shift` bits of a component.
///
/// `shift` must not be greater than [`MAX_SHIFT`].
#[inline]
#[must_use]
pub const fn shift(component: u8, shift: u32) -> u8 {
    component >> shift
}

/// Undoes [`shift`] by moving the component back into the upper bits
/// and filling the lower bits with copies of the upper bits.
///
/// This maps the largest shifted value back to `255` and `0` back to `0`.
#[inline]
#[must_use]
pub const fn unshift(component: u8, shift: u32) -> u8 {
    if shift == 0 {
        return component;
    }

    let mut value = component << shift;
    let mut filled = 8 - shift;
    while filled < 8 {
        value |= value >> filled;
        filled *= 2;
    }
    value
}

/// Applies [`shift`] to each component of a packed color.
#[inline]
#[must_use]
pub fn shift_color(color: PackedColor, amount: u32) -> PackedColor {
    if amount == 0 {
        color
    } else {
        pack(unpack(color).map(|c| shift(c, amount)))
    }
}

/// Applies [`unshift`] to each component of a packed color.
#[inline]
#[must_use]
pub fn unshift_color(color: PackedColor, amount: u32) -> PackedColor {
    if amount == 0 {
        color
    } else {
        pack(unpack(color).map(|c| unshift(c, amount)))
    }
}

/// Collapses near transparent colors into [`TRANSPARENT`].
#[inline]
#[must_use]
pub const fn normalize_alpha(rgba: [u8; 4]) -> PackedColor {
    if rgba[3] <= ALPHA_THRESHOLD {
        TRANSPARENT
    } else {
        pack(rgba)
    }
}

/// Converts a [`PackedColor`] into an [`Srgba<u8>`].
#[must_use]
pub fn to_srgba(color: PackedColor) -> Srgba<u8> {
    let [r, g, b, a] = unpack(color);
    Srgba::new(r, g, b, a)
}

/// Converts an [`Srgba<u8>`] into a [`PackedColor`].
#[must_use]
pub fn from_srgba(color: Srgba<u8>) -> PackedColor {
    let (r, g, b, a) = color.into_components();
    pack([r, g, b, a])
}

/// One of the four components of a [`PackedColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The red component.
    Red,
    /// The green component.
    Green,
    /// The blue component.
    Blue,
    /// The alpha component.
    Alpha,
}

impl Channel {
    /// All channels, ordered by their priority when breaking ties between equal spans.
    pub const PRIORITY: [Self; 4] = [Self::Alpha, Self::Red, Self::Green, Self::Blue];

    /// The position of this channel in a `[red, green, blue, alpha]` array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
        }
    }

    /// Extracts this channel from a packed color.
    #[inline]
    #[must_use]
    pub const fn of(self, color: PackedColor) -> u8 {
        match self {
            Self::Red => red(color),
            Self::Green => green(color),
            Self::Blue => blue(color),
            Self::Alpha => alpha(color),
        }
    }

    /// The weight of this channel in [`distance`].
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Red => 3,
            Self::Green | Self::Alpha => 4,
            Self::Blue => 2,
        }
    }

    /// Orders two packed colors by this channel only.
    #[inline]
    #[must_use]
    pub fn compare(self, a: PackedColor, b: PackedColor) -> Ordering {
        self.of(a).cmp(&self.of(b))
    }
}

/// The weighted squared euclidean distance between two `[red, green, blue, alpha]` colors.
///
/// The channel weights are `3` for red, `4` for green, `2` for blue, and `4` for alpha.
/// The largest possible distance is `13 * 255 * 255`, so the result always fits in a `u32`.
#[inline]
#[must_use]
pub fn distance(x: [u8; 4], y: [u8; 4]) -> u32 {
    const WEIGHTS: [u32; 4] = [
        Channel::Red.weight(),
        Channel::Green.weight(),
        Channel::Blue.weight(),
        Channel::Alpha.weight(),
    ];

    let mut dist = 0;
    for c in 0..4 {
        let d = u32::from(x[c].abs_diff(y[c]));
        dist += WEIGHTS[c] * d * d;
    }
    dist
}
