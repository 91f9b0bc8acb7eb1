use std::io::Write;

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tiff::tags::Predictor;
use tracing::debug;

use crate::x3f::common::error::{Result, X3fError};
use crate::x3f::output::types::{OutputConfig, ProcessedImage, TiffCompression};
use crate::x3f::output::writer::ImageWriter;

/// Writes `Gray16` for one channel and `RGB16` for three.
pub struct StandardTiffWriter;

impl StandardTiffWriter {
    fn compression(config: &OutputConfig) -> Compression {
        match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

impl ImageWriter for StandardTiffWriter {
    fn write_image(
        &self,
        image: &ProcessedImage,
        output: &mut dyn Write,
        config: &OutputConfig,
    ) -> Result<()> {
        debug!(
            width = image.width,
            height = image.height,
            channels = image.channels,
            "Encoding TIFF image"
        );
        if image.width == 0
            || image.height == 0
            || image.data.len() != image.width * image.height * image.channels
        {
            return Err(X3fError::InvalidDimensions(image.width, image.height));
        }

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| X3fError::Encode(e.to_string()))?
            .with_compression(Self::compression(config));
        if let Some(predictor) = config.predictor {
            encoder = encoder.with_predictor(match predictor {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            });
        }

        let (width, height) = (image.width as u32, image.height as u32);
        match image.channels {
            1 => encoder.write_image::<colortype::Gray16>(width, height, &image.data),
            3 => encoder.write_image::<colortype::RGB16>(width, height, &image.data),
            other => {
                return Err(X3fError::Encode(format!(
                    "cannot write {other}-channel image"
                )));
            }
        }
        .map_err(|e| X3fError::Encode(e.to_string()))?;

        output.write_all(&buffer)?;
        debug!(bytes = buffer.len(), "TIFF encoding complete");
        Ok(())
    }
}
