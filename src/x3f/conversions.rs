//! Decode orchestration and conversion to the output boundary

mod decode;
mod options;
mod x3f_to_tiff;


pub use decode::RawDecoder;
pub use options::{DecodeOptions, DecodeOptionsBuilder};
pub use x3f_to_tiff::RawPipeline;
