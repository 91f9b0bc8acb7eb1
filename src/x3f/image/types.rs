use crate::x3f::common::error::{DataError, DecodeError};
use crate::x3f::common::geometry::Rect;

pub const FORMAT_HUFFMAN_X530: u32 = 0x0003_0005;
pub const FORMAT_HUFFMAN_10BIT: u32 = 0x0003_0006;
pub const FORMAT_TRUE: u32 = 0x0003_001e;
pub const FORMAT_MERRILL: u32 = 0x0001_001e;
pub const FORMAT_QUATTRO: u32 = 0x0001_0023;
pub const FORMAT_TRUE_SHORT: u32 = 0x0000_001e;
pub const FORMAT_QUATTRO_SHORT: u32 = 0x0000_0023;

/// Pixel codec of a RAW image section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCodec {
    HuffmanX530,
    Huffman10Bit,
    True,
    Merrill,
    Quattro,
}

impl ImageCodec {
    /// Resolves the codec from the section's `type` and `format` words.
    /// Some Quattro and TRUE files put the short codec id in `type`.
    pub fn detect(image_type: u32, format: u32) -> Option<Self> {
        let id = match image_type {
            FORMAT_TRUE_SHORT | FORMAT_QUATTRO_SHORT => image_type,
            _ => format,
        };
        match id {
            FORMAT_HUFFMAN_X530 => Some(ImageCodec::HuffmanX530),
            FORMAT_HUFFMAN_10BIT => Some(ImageCodec::Huffman10Bit),
            FORMAT_TRUE | FORMAT_TRUE_SHORT => Some(ImageCodec::True),
            FORMAT_MERRILL => Some(ImageCodec::Merrill),
            FORMAT_QUATTRO | FORMAT_QUATTRO_SHORT => Some(ImageCodec::Quattro),
            _ => None,
        }
    }

    pub fn try_detect(image_type: u32, format: u32) -> Result<Self, DecodeError> {
        Self::detect(image_type, format).ok_or(DecodeError::UnsupportedCodec(format))
    }

    pub fn is_true_engine(self) -> bool {
        matches!(
            self,
            ImageCodec::True | ImageCodec::Merrill | ImageCodec::Quattro
        )
    }
}

/// How the three TRUE planes relate to the image geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneLayout {
    /// All planes share the section's geometry.
    Uniform,
    /// Quattro data with every plane at the section's geometry.
    QuattroBinned,
    /// Quattro 1:1:4 sampling: planes 0 and 1 at half size, plane 2 full.
    Quattro114,
}

/// Interleaved 16-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u16>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; width * height * channels],
        }
    }

    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u16>,
    ) -> Result<Self, DataError> {
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(DataError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn row_stride(&self) -> usize {
        self.width * self.channels
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[u16] {
        let start = self.index(x, y);
        &self.data[start..start + self.channels]
    }

    /// Copies the inclusive rectangle `rect` into a new image.
    pub fn crop(&self, rect: &Rect) -> Result<ImageBuffer, DataError> {
        if !rect.fits_within(self.width, self.height) {
            return Err(DataError::RectOutOfBounds {
                x0: rect.x0 as usize,
                y0: rect.y0 as usize,
                x1: rect.x1 as usize,
                y1: rect.y1 as usize,
                columns: self.width,
                rows: self.height,
            });
        }
        let width = rect.columns() as usize;
        let height = rect.rows() as usize;
        let mut data = Vec::with_capacity(width * height * self.channels);
        for y in rect.y0 as usize..=rect.y1 as usize {
            let start = self.index(rect.x0 as usize, y);
            data.extend_from_slice(&self.data[start..start + width * self.channels]);
        }
        Ok(Self {
            width,
            height,
            channels: self.channels,
            data,
        })
    }
}

/// Result of decoding one RAW section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Three interleaved channels. For the Quattro 1:1:4 layout this is the
    /// low-resolution image with channel 2 box-filtered from the top layer.
    pub image: ImageBuffer,
    /// Full-resolution single-channel top layer of a Quattro 1:1:4 image.
    pub top_layer: Option<ImageBuffer>,
    pub layout: PlaneLayout,
}
