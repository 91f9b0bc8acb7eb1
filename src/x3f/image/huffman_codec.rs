use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;
use tracing::debug;

use crate::x3f::common::bytes::ByteCursor;
use crate::x3f::common::error::{DecodeError, FormatError};
use crate::x3f::huffman::{BitReader, HuffmanTree, legacy_diff};
use crate::x3f::image::section::ImageHeader;
use crate::x3f::image::types::{DecodedImage, ImageBuffer, PlaneLayout};

/// Layout of a legacy Huffman body: code table, per-row byte offsets and
/// the bit stream that follows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanBody {
    pub table: Vec<u32>,
    pub row_offsets: Vec<u32>,
    pub data_offset: usize,
}

impl HuffmanBody {
    pub fn parse(body: &[u8], header: &ImageHeader) -> Result<Self, FormatError> {
        let mut cursor = ByteCursor::new(body, "Huffman image header");
        let table_len = cursor.u32()? as usize;
        let table = read_words(&mut cursor, table_len)?;
        let row_offsets = read_words(&mut cursor, header.rows as usize)?;
        Ok(Self {
            table,
            row_offsets,
            data_offset: cursor.position(),
        })
    }

    pub fn decode(&self, body: &[u8], header: &ImageHeader) -> Result<DecodedImage, DecodeError> {
        let data = body.get(self.data_offset..).unwrap_or(&[]);
        let tree = HuffmanTree::from_legacy_table(&self.table, None);
        if tree.is_empty() {
            return Err(DecodeError::EmptyHuffmanTable);
        }
        if let Some((row, &offset)) = self
            .row_offsets
            .iter()
            .enumerate()
            .find(|&(_, &offset)| offset as usize > data.len())
        {
            return Err(DecodeError::RowOffsetOutOfRange {
                row,
                offset: offset as usize,
                available: data.len(),
            });
        }

        let width = header.columns as usize;
        let height = header.rows as usize;
        let mut image = ImageBuffer::new(width, height, 3);
        if width > 0 {
            image
                .data
                .par_chunks_mut(width * 3)
                .zip(self.row_offsets.par_iter())
                .for_each(|(line, &offset)| decode_row(&data[offset as usize..], &tree, line));
        }

        debug!(width, height, "Decoded Huffman image");
        Ok(DecodedImage {
            image,
            top_layer: None,
            layout: PlaneLayout::Uniform,
        })
    }
}

fn read_words(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<u32>, FormatError> {
    let bytes = cursor.bytes(count.saturating_mul(4))?;
    Ok(bytes.chunks_exact(4).map(LittleEndian::read_u32).collect())
}

/// Decodes one row of interleaved three-colour samples. Each colour keeps
/// a 16-bit signed accumulator starting at zero; negative values clamp to 0.
pub fn decode_row(data: &[u8], tree: &HuffmanTree, line: &mut [u16]) {
    let mut reader = BitReader::new(data);
    let mut acc = [0i16; 3];
    for pixel in line.chunks_exact_mut(3) {
        for (color, sample) in pixel.iter_mut().enumerate() {
            acc[color] = acc[color].wrapping_add(legacy_diff(&mut reader, tree) as i16);
            *sample = acc[color].max(0) as u16;
        }
    }
}
