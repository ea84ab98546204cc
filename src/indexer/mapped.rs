use super::ExhaustiveIndexer;
use crate::{
    color::{normalize_alpha, shift_color, unpack, unshift_color},
    ColorIndexer, PackedColor, PackedColorMap, Palette,
};
use parking_lot::RwLock;

/// Looks colors up in a map from precision reduced colors to palette indices.
///
/// The map is usually the reverse map produced by median cut, so every color of the source image
/// is a hit. Misses are resolved with an exhaustive search for the map key's color
/// (with the lost precision restored) and then added to the map, so all colors
/// that share a key always get the same index, regardless of lookup order.
#[derive(Debug)]
pub struct MappedIndexer {
    /// The fallback for colors not in the map.
    exhaustive: ExhaustiveIndexer,
    /// Precision reduced color to palette index.
    map: RwLock<PackedColorMap>,
    /// The number of low bits dropped from each component of the map keys.
    shift: u32,
}

impl MappedIndexer {
    /// Creates a new [`MappedIndexer`] from a map whose keys have each component shifted right by `shift`.
    ///
    /// Every value in `map` must be a valid index into the palette of `exhaustive`.
    #[must_use]
    pub fn new(exhaustive: ExhaustiveIndexer, map: PackedColorMap, shift: u32) -> Self {
        Self { exhaustive, map: RwLock::new(map), shift }
    }

    /// The number of low bits dropped from each component before lookup.
    #[must_use]
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// The number of colors currently in the map.
    #[must_use]
    pub fn mapped_colors(&self) -> usize {
        self.map.read().len()
    }

    /// Returns the map key for a color.
    #[inline]
    fn key(&self, rgba: [u8; 4]) -> PackedColor {
        shift_color(normalize_alpha(rgba), self.shift)
    }
}

impl ColorIndexer for MappedIndexer {
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        let key = self.key(rgba);

        let mapped = self.map.read().get(key);
        if let Some(index) = mapped {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = index as u8;
            return index;
        }

        let index = self
            .exhaustive
            .closest_index(unpack(unshift_color(key, self.shift)));

        // indices are never negative
        let _ = self.map.write().put(key, i32::from(index));

        index
    }

    fn to_palette(&self) -> Palette {
        self.exhaustive.to_palette()
    }

    fn palette_len(&self) -> usize {
        self.exhaustive.palette_len()
    }
}
