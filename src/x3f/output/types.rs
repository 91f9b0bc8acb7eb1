//! Output configuration and the image handed to writers

use crate::x3f::image::ImageBuffer;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate, fast level
    DeflateFast,
    /// Deflate, best compression
    DeflateBest,
    /// Deflate, balanced level
    DeflateBalanced,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub compression: TiffCompression,
    /// TIFF predictor tag value; 2 selects horizontal differencing
    pub predictor: Option<u16>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
        }
    }
}

impl OutputConfig {
    pub fn builder() -> OutputConfigBuilder {
        OutputConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct OutputConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
}

impl OutputConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn build(self) -> OutputConfig {
        let default = OutputConfig::default();
        OutputConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
        }
    }
}

/// Final pipeline product: interleaved 16-bit samples, one or three
/// channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u16>,
}

impl From<ImageBuffer> for ProcessedImage {
    fn from(image: ImageBuffer) -> Self {
        Self {
            width: image.width,
            height: image.height,
            channels: image.channels,
            data: image.data,
        }
    }
}
