use crate::{color::distance, ColorIndexer, Palette};

/// Finds the nearest palette color by comparing against every palette entry.
///
/// Ties go to the lowest palette index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustiveIndexer {
    /// The palette colors as `[red, green, blue, alpha]`.
    colors: Vec<[u8; 4]>,
    /// The palette being indexed.
    palette: Palette,
}

impl ExhaustiveIndexer {
    /// Creates a new [`ExhaustiveIndexer`] for the given palette.
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        Self { colors: palette.colors().collect(), palette }
    }

    /// Returns the nearest palette index and its distance to the given color.
    #[must_use]
    pub fn closest(&self, rgba: [u8; 4]) -> (u8, u32) {
        let mut best = (0, u32::MAX);
        for (i, &color) in self.colors.iter().enumerate() {
            let dist = distance(color, rgba);
            if dist < best.1 {
                #[allow(clippy::cast_possible_truncation)]
                let i = i as u8;
                best = (i, dist);
                if dist == 0 {
                    break;
                }
            }
        }
        best
    }

    /// The palette being indexed.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

impl ColorIndexer for ExhaustiveIndexer {
    #[inline]
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        self.closest(rgba).0
    }

    fn to_palette(&self) -> Palette {
        self.palette.clone()
    }

    fn palette_len(&self) -> usize {
        self.colors.len()
    }
}
