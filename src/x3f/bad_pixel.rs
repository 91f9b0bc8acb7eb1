//! Bad pixel collection and repair

mod collect;
mod interpolate;


pub use collect::{BadPixel, BadPixelSet, collect_bad_pixels};
pub use interpolate::{InterpolationReport, interpolate_bad_pixels};
