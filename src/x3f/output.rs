//! Output boundary: the writer trait handed decoded images and the
//! reference 16-bit TIFF writer

mod standard_tiff_writer;
pub mod types;
mod writer;


pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{OutputConfig, OutputConfigBuilder, ProcessedImage, TiffCompression};
pub use writer::ImageWriter;
