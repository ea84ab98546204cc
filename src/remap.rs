//! Applies a [`ColorIndexer`] to every pixel of a [`Raster`].

use crate::{ColorIndexer, IndexedImage, Raster, Tile};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Writes the palette index of every pixel in `tile` into the row-major `indices` of the whole image.
fn remap_tile<R, I>(raster: &R, indexer: &I, tile: Tile, indices: &mut [u8])
where
    R: Raster + ?Sized,
    I: ColorIndexer + ?Sized,
{
    let width = raster.width() as usize;
    for y in tile.ys() {
        let start = y as usize * width + tile.x as usize;
        let row = &mut indices[start..(start + tile.width as usize)];
        for (x, index) in tile.xs().zip(row) {
            *index = indexer.closest_index(raster.rgba(x, y));
        }
    }
}

/// Replaces every pixel of the raster with the index of its nearest palette color.
///
/// Pixels are visited tile by tile.
///
/// # Examples
/// ```
/// # use packquant::{indexer::ExhaustiveIndexer, remap, Bands, Palette, RasterImage, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let raster = RasterImage::new(3, 1, Bands::Gray, vec![0, 100, 255])?;
/// let palette = Palette::new([[0, 0, 0, 255], [255, 255, 255, 255]])?;
/// let image = remap(&raster, &ExhaustiveIndexer::new(palette));
/// assert_eq!(image.indices(), &[0, 0, 1]);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn remap<R, I>(raster: &R, indexer: &I) -> IndexedImage
where
    R: Raster + ?Sized,
    I: ColorIndexer + ?Sized,
{
    let (width, height) = (raster.width(), raster.height());
    let mut indices = vec![0; width as usize * height as usize];

    for tile in raster.tiles() {
        remap_tile(raster, indexer, tile, &mut indices);
    }

    IndexedImage::new_unchecked(width, height, indexer.palette_len(), indices)
}

/// Replaces every pixel of the raster with the index of its nearest palette color in parallel.
///
/// Tiles are distributed across threads and the shared `indexer` is used concurrently.
/// The result is identical to [`remap`].
#[cfg(feature = "threads")]
#[must_use]
pub fn remap_par<R, I>(raster: &R, indexer: &I) -> IndexedImage
where
    R: Raster + Sync + ?Sized,
    I: ColorIndexer + ?Sized,
{
    let (width, height) = (raster.width(), raster.height());

    let blocks = raster
        .tiles()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|tile| {
            let mut block = Vec::with_capacity(tile.area());
            for y in tile.ys() {
                block.extend(tile.xs().map(|x| indexer.closest_index(raster.rgba(x, y))));
            }
            (tile, block)
        })
        .collect::<Vec<_>>();

    let mut indices = vec![0; width as usize * height as usize];
    for (tile, block) in blocks {
        for (y, row) in tile.ys().zip(block.chunks_exact(tile.width as usize)) {
            let start = y as usize * width as usize + tile.x as usize;
            indices[start..(start + row.len())].copy_from_slice(row);
        }
    }

    IndexedImage::new_unchecked(width, height, indexer.palette_len(), indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexer::ExhaustiveIndexer, tests::*, Palette};

    fn indexer() -> ExhaustiveIndexer {
        ExhaustiveIndexer::new(Palette::new(test_data_256().into_iter().step_by(4)).unwrap())
    }

    #[test]
    fn every_pixel_is_indexed() {
        let colors = test_data_1024();
        let raster = raster(32, 32, &colors).with_tile_size(5, 3).unwrap();
        let indexer = indexer();
        let image = remap(&raster, &indexer);

        assert_eq!((image.width(), image.height()), (32, 32));
        assert_eq!(image.bit_depth(), 6);
        for (&index, &color) in image.indices().iter().zip(&colors) {
            assert_eq!(index, indexer.closest_index(color));
        }
    }

    #[test]
    fn empty_raster() {
        let raster = raster(0, 0, &[]);
        let image = remap(&raster, &indexer());
        assert!(image.indices().is_empty());
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let colors = test_data_1024();
        let indexer = indexer();
        for tile in [(1, 1), (7, 5), (32, 32), (64, 1)] {
            let raster = raster(32, 32, &colors).with_tile_size(tile.0, tile.1).unwrap();
            assert_eq!(remap_par(&raster, &indexer), remap(&raster, &indexer));
        }
    }
}
