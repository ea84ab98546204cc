//! Nearest palette color lookup strategies.
//!
//! All indexers implement [`ColorIndexer`](crate::ColorIndexer):
//! - [`ExhaustiveIndexer`]: compares against every palette color.
//! - [`MappedIndexer`]: looks colors up in a precomputed color to index map
//!   and falls back to an exhaustive search for unseen colors.
//! - [`LruIndexer`]: a bounded cache of recent lookups in front of another indexer.
//! - [`CachingIndexer`]: remembers only the last lookup, for runs of identical pixels.
//!
//! The caching indexers are decorators, so they can be stacked:
//! ```
//! # use packquant::{
//! #     indexer::{CachingIndexer, ExhaustiveIndexer, LruIndexer},
//! #     ColorIndexer, Palette, QuantizeError,
//! # };
//! # fn main() -> Result<(), QuantizeError> {
//! let palette = Palette::new([[0, 0, 0, 255], [255, 255, 255, 255]])?;
//! let indexer = CachingIndexer::new(LruIndexer::new(ExhaustiveIndexer::new(palette), 1024));
//! assert_eq!(indexer.closest_index([200, 210, 220, 255]), 1);
//! # Ok(())
//! # }
//! ```

mod caching;
mod exhaustive;
mod lru;
mod mapped;

pub use caching::CachingIndexer;
pub use exhaustive::ExhaustiveIndexer;
pub use lru::LruIndexer;
pub use mapped::MappedIndexer;
