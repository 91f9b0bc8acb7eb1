//! Sigma X3F RAW container decoder
//!
//! Opens the directory-at-end container, loads the PROP, CAMF and image
//! sections on demand and turns the RAW image into an interleaved 16-bit
//! buffer, with bad pixel repair and Quattro sensor fusion on the way.

pub mod bad_pixel;
pub mod camf;
pub mod common;
pub mod container;
pub mod conversions;
pub mod diagnostics;
pub mod huffman;
pub mod image;
pub mod levels;
pub mod output;
pub mod quattro;

#[cfg(test)]
pub(crate) mod test_support;

pub use common::{ByteSource, DataError, DecodeError, FileSource, FormatError, Rect, Result, X3fError};

pub use container::{Container, Header, tags};

pub use camf::{Camf, Matrix, MatrixData};

pub use image::{DecodedImage, ImageBuffer, ImageCodec, ImageSection, PlaneLayout, decode_image};

pub use conversions::{DecodeOptions, DecodeOptionsBuilder, RawDecoder, RawPipeline};

pub use diagnostics::{Diagnostics, NoopDiagnostics, TimingDiagnostics, TracingDiagnostics};

pub use output::{
    ImageWriter, OutputConfig, OutputConfigBuilder, ProcessedImage, StandardTiffWriter,
    TiffCompression,
};

pub use quattro::{ChromaMedianDenoiser, DenoiseProfile, Denoiser};
