use crate::{color::pack, ColorIndexer, PackedColor, Palette};
use parking_lot::Mutex;

/// Remembers the last looked up color and its palette index in front of another [`ColorIndexer`].
///
/// Neighboring pixels are often identical, so this skips most lookups in flat image regions.
#[derive(Debug)]
pub struct CachingIndexer<I> {
    /// The indexer used when the color differs from the last one.
    inner: I,
    /// The last color and its index.
    last: Mutex<Option<(PackedColor, u8)>>,
}

impl<I: ColorIndexer> CachingIndexer<I> {
    /// Creates a new [`CachingIndexer`] wrapping `inner`.
    #[must_use]
    pub fn new(inner: I) -> Self {
        Self { inner, last: Mutex::new(None) }
    }

    /// The wrapped indexer.
    #[must_use]
    pub fn inner(&self) -> &I {
        &self.inner
    }

    /// Consumes the cache and returns the wrapped indexer.
    #[must_use]
    pub fn into_inner(self) -> I {
        self.inner
    }

    /// Forgets the last lookup.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }
}

impl<I: ColorIndexer> ColorIndexer for CachingIndexer<I> {
    #[inline]
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        let color = pack(rgba);

        let last = *self.last.lock();
        if let Some((last_color, index)) = last {
            if last_color == color {
                return index;
            }
        }

        let index = self.inner.closest_index(rgba);
        *self.last.lock() = Some((color, index));
        index
    }

    fn to_palette(&self) -> Palette {
        self.inner.to_palette()
    }

    fn palette_len(&self) -> usize {
        self.inner.palette_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexer::ExhaustiveIndexer, tests::*};

    #[test]
    fn repeats_use_last_match() {
        let palette = Palette::new(test_data_256().into_iter().step_by(16)).unwrap();
        let exhaustive = ExhaustiveIndexer::new(palette.clone());
        let caching = CachingIndexer::new(exhaustive.clone());

        let colors = test_data_1024();
        for &color in &colors {
            let expected = exhaustive.closest_index(color);
            assert_eq!(caching.closest_index(color), expected);
            assert_eq!(caching.closest_index(color), expected);
            assert_eq!(*caching.last.lock(), Some((pack(color), expected)));
        }

        caching.reset();
        assert_eq!(*caching.last.lock(), None);
        assert_eq!(caching.to_palette(), palette);
        assert_eq!(caching.into_inner(), exhaustive);
    }
}
