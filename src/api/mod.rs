//! Contains the types and functions for the high level builder API.

mod options;
mod quantizer;

pub use options::{MedianCutOptions, RepresentativeColor, SplitStrategy};
pub use quantizer::Quantizer;
