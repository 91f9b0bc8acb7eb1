use std::sync::OnceLock;

use tracing::{debug, instrument};

use crate::x3f::common::bytes::ByteCursor;
use crate::x3f::common::error::{DecodeError, FormatError, Result};
use crate::x3f::container::tags;
use crate::x3f::image::huffman_codec::HuffmanBody;
use crate::x3f::image::true_codec::TrueBody;
use crate::x3f::image::types::{DecodedImage, ImageCodec, PlaneLayout};

pub const IMAGE_HEADER_LEN: usize = 28;
const MAX_ROWS: u32 = 100_000;
const MAX_COLUMNS: u32 = 100_000;
/// Largest decoded frame accepted, in pixels.
const MAX_PIXELS: u64 = 1 << 26;

/// The `SECi` header in front of every image section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub version: u32,
    pub image_type: u32,
    pub format: u32,
    pub columns: u32,
    pub rows: u32,
    pub row_stride: u32,
}

impl ImageHeader {
    pub fn parse(data: &[u8]) -> std::result::Result<Self, FormatError> {
        let mut cursor = ByteCursor::new(data, "image section header");
        let tag = cursor.u32()?;
        if tag != tags::SECI {
            return Err(FormatError::BadSectionTag {
                expected: tags::SECI,
                found: tag,
            });
        }
        let header = Self {
            version: cursor.u32()?,
            image_type: cursor.u32()?,
            format: cursor.u32()?,
            columns: cursor.u32()?,
            rows: cursor.u32()?,
            row_stride: cursor.u32()?,
        };
        Ok(header)
    }

    /// Rejects dimensions no camera writes before anything is allocated
    /// for them.
    pub fn check_geometry(&self) -> std::result::Result<(), FormatError> {
        let pixels = u64::from(self.columns) * u64::from(self.rows);
        if self.rows > MAX_ROWS || self.columns > MAX_COLUMNS || pixels > MAX_PIXELS {
            return Err(FormatError::ImageGeometry {
                columns: self.columns,
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub fn is_preview(&self) -> bool {
        self.image_type & 0xff == 0x02
    }

    pub fn is_quattro(&self) -> bool {
        self.image_type & 0xff == 0x23 || self.format & 0xff == 0x23
    }
}

#[derive(Debug)]
enum ImageBody {
    Huffman(HuffmanBody),
    True(TrueBody),
}

/// A RAW image section. The body layout is parsed on load; pixels are
/// decoded once, on request.
#[derive(Debug)]
pub struct ImageSection {
    index: usize,
    header: ImageHeader,
    codec: ImageCodec,
    body: ImageBody,
    data: Vec<u8>,
    decoded: OnceLock<DecodedImage>,
}

impl ImageSection {
    /// Parses the section at directory position `index`. Returns `None` for
    /// previews and formats that are not RAW data.
    pub fn parse(index: usize, data: Vec<u8>) -> Result<Option<Self>> {
        let header = ImageHeader::parse(&data)?;
        if header.is_preview() {
            debug!(index, image_type = header.image_type, "Preview image");
            return Ok(None);
        }
        header.check_geometry()?;
        let Some(codec) = ImageCodec::detect(header.image_type, header.format) else {
            debug!(index, format = format_args!("{:#010x}", header.format), "Unknown image format");
            return Ok(None);
        };

        let body_bytes = &data[IMAGE_HEADER_LEN..];
        let body = if codec.is_true_engine() {
            ImageBody::True(TrueBody::parse(body_bytes, &header)?)
        } else {
            ImageBody::Huffman(HuffmanBody::parse(body_bytes, &header)?)
        };
        debug!(
            index,
            ?codec,
            columns = header.columns,
            rows = header.rows,
            "RAW image section"
        );

        Ok(Some(Self {
            index,
            header,
            codec,
            body,
            data,
            decoded: OnceLock::new(),
        }))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn codec(&self) -> ImageCodec {
        self.codec
    }

    pub fn is_quattro(&self) -> bool {
        self.header.is_quattro()
    }

    pub fn layout(&self) -> PlaneLayout {
        match &self.body {
            ImageBody::True(body) => body.layout,
            ImageBody::Huffman(_) => PlaneLayout::Uniform,
        }
    }

    /// Width and height of the three-channel image `decode` produces.
    pub fn decoded_dimensions(&self) -> (usize, usize) {
        match &self.body {
            ImageBody::True(body) => body
                .plane_geometry(&self.header)
                .map(|g| g[0])
                .unwrap_or((self.header.columns as usize, self.header.rows as usize)),
            ImageBody::Huffman(_) => (self.header.columns as usize, self.header.rows as usize),
        }
    }

    /// Decodes the pixels. A section decodes exactly once; later calls fail
    /// with `AlreadyDecoded` and the stored result stays available through
    /// `decoded`.
    #[instrument(skip(self), fields(index = self.index, codec = ?self.codec))]
    pub fn decode(&self) -> Result<&DecodedImage> {
        if self.decoded.get().is_some() {
            return Err(DecodeError::AlreadyDecoded.into());
        }
        let body_bytes = &self.data[IMAGE_HEADER_LEN..];
        let decoded = match &self.body {
            ImageBody::True(body) => body.decode(body_bytes, &self.header)?,
            ImageBody::Huffman(body) => body.decode(body_bytes, &self.header)?,
        };
        self.decoded
            .set(decoded)
            .map_err(|_| DecodeError::AlreadyDecoded)?;
        self.decoded
            .get()
            .ok_or(DecodeError::AlreadyDecoded.into())
    }

    pub fn decoded(&self) -> Option<&DecodedImage> {
        self.decoded.get()
    }
}
