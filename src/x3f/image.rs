//! RAW image sections
//!
//! Parses the `SECi` header, dispatches on the codec id and decodes pixels
//! with either the legacy Huffman codec or the TRUE engine codec, including
//! the three-plane Quattro layout.

mod huffman_codec;
mod section;
mod true_codec;
mod types;


use crate::x3f::common::error::Result;

pub use huffman_codec::{HuffmanBody, decode_row};
pub use section::{IMAGE_HEADER_LEN, ImageHeader, ImageSection};
pub use true_codec::{PlaneSize, TrueBody, decode_plane};
pub use types::{
    DecodedImage, FORMAT_HUFFMAN_10BIT, FORMAT_HUFFMAN_X530, FORMAT_MERRILL, FORMAT_QUATTRO,
    FORMAT_QUATTRO_SHORT, FORMAT_TRUE, FORMAT_TRUE_SHORT, ImageBuffer, ImageCodec, PlaneLayout,
};

/// Decodes a standalone image section, previews included. Unlike
/// `ImageSection::parse`, an unknown codec is an error here.
pub fn decode_image(section: &[u8]) -> Result<DecodedImage> {
    let header = ImageHeader::parse(section)?;
    header.check_geometry()?;
    let codec = ImageCodec::try_detect(header.image_type, header.format)?;
    let body = section.get(IMAGE_HEADER_LEN..).unwrap_or(&[]);
    let decoded = if codec.is_true_engine() {
        TrueBody::parse(body, &header)?.decode(body, &header)?
    } else {
        HuffmanBody::parse(body, &header)?.decode(body, &header)?
    };
    Ok(decoded)
}
