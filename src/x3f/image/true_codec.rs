use rayon::prelude::*;
use tracing::{debug, trace};

use crate::x3f::common::bytes::ByteCursor;
use crate::x3f::common::error::{DecodeError, FormatError};
use crate::x3f::huffman::{BitReader, HuffmanTree, TrueCode, read_true_table, true_diff};
use crate::x3f::image::section::ImageHeader;
use crate::x3f::image::types::{DecodedImage, ImageBuffer, PlaneLayout};

const PLANE_ALIGN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSize {
    pub columns: u16,
    pub rows: u16,
}

/// Layout of a TRUE-engine body, parsed when the section is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrueBody {
    pub seeds: [u16; 3],
    pub table: Vec<TrueCode>,
    pub plane_sizes: [u32; 3],
    pub quattro_planes: Option<[PlaneSize; 3]>,
    pub layout: PlaneLayout,
    /// Offset of the first plane within the body.
    pub data_offset: usize,
}

impl TrueBody {
    pub fn parse(body: &[u8], header: &ImageHeader) -> Result<Self, FormatError> {
        let mut cursor = ByteCursor::new(body, "TRUE image header");

        let (quattro_planes, layout) = if header.is_quattro() {
            let mut planes = [PlaneSize { columns: 0, rows: 0 }; 3];
            for plane in &mut planes {
                plane.columns = cursor.u16()?;
                plane.rows = cursor.u16()?;
            }
            let rows = planes[0].rows;
            let layout = if u32::from(rows) == header.rows / 2 {
                PlaneLayout::Quattro114
            } else if u32::from(rows) == header.rows {
                PlaneLayout::QuattroBinned
            } else {
                return Err(FormatError::QuattroLayout {
                    plane_rows: rows,
                    image_rows: header.rows,
                });
            };
            (Some(planes), layout)
        } else {
            (None, PlaneLayout::Uniform)
        };

        let seeds = [cursor.u16()?, cursor.u16()?, cursor.u16()?];
        cursor.skip(2)?;

        let (table, consumed, terminated) = read_true_table(cursor.rest());
        if !terminated {
            return Err(FormatError::Truncated {
                what: "TRUE Huffman table",
                offset: cursor.position() + consumed,
                needed: 2,
                available: cursor.remaining().saturating_sub(consumed),
            });
        }
        cursor.skip(consumed)?;

        if quattro_planes.is_some() {
            cursor.skip(4)?;
        }
        let plane_sizes = [cursor.u32()?, cursor.u32()?, cursor.u32()?];

        trace!(
            ?seeds,
            codes = table.len(),
            ?plane_sizes,
            ?layout,
            "Parsed TRUE body"
        );
        Ok(Self {
            seeds,
            table,
            plane_sizes,
            quattro_planes,
            layout,
            data_offset: cursor.position(),
        })
    }

    /// Width and height of each plane, in plane order.
    pub fn plane_geometry(&self, header: &ImageHeader) -> Result<[(usize, usize); 3], DecodeError> {
        let full = (header.columns as usize, header.rows as usize);
        let planes = match (self.layout, self.quattro_planes) {
            (PlaneLayout::Quattro114, Some(q)) => {
                let dims = q.map(|p| (p.columns as usize, p.rows as usize));
                // No plane is larger than the frame the header describes.
                if let Some(plane) = dims.iter().position(|&(c, r)| c > full.0 || r > full.1) {
                    return Err(DecodeError::PlaneGeometry {
                        plane,
                        columns: dims[plane].0,
                        rows: dims[plane].1,
                        expected_columns: full.0,
                        expected_rows: full.1,
                    });
                }
                if dims[1] != dims[0] {
                    return Err(DecodeError::PlaneGeometry {
                        plane: 1,
                        columns: dims[1].0,
                        rows: dims[1].1,
                        expected_columns: dims[0].0,
                        expected_rows: dims[0].1,
                    });
                }
                dims
            }
            _ => [full; 3],
        };
        Ok(planes)
    }

    /// Byte range of each plane within `data`. Planes start on 16-byte
    /// boundaries.
    fn plane_ranges(&self, data: &[u8]) -> Result<[(usize, usize); 3], DecodeError> {
        let mut ranges = [(0, 0); 3];
        let mut offset = 0usize;
        for (plane, &size) in self.plane_sizes.iter().enumerate() {
            let size = size as usize;
            let end = offset.checked_add(size).filter(|&end| end <= data.len());
            let Some(end) = end else {
                return Err(DecodeError::PlaneOverrun {
                    plane,
                    offset,
                    size,
                    available: data.len(),
                });
            };
            ranges[plane] = (offset, end);
            offset = offset.saturating_add(size.div_ceil(PLANE_ALIGN) * PLANE_ALIGN);
        }
        Ok(ranges)
    }

    pub fn decode(&self, body: &[u8], header: &ImageHeader) -> Result<DecodedImage, DecodeError> {
        let data = body.get(self.data_offset..).unwrap_or(&[]);
        let tree = HuffmanTree::from_true_table(&self.table);
        if tree.is_empty() {
            return Err(DecodeError::EmptyHuffmanTable);
        }
        let geometry = self.plane_geometry(header)?;
        let ranges = self.plane_ranges(data)?;

        let mut planes: Vec<Vec<u16>> = (0..3usize)
            .into_par_iter()
            .map(|plane| {
                let (start, end) = ranges[plane];
                let (columns, rows) = geometry[plane];
                decode_plane(&data[start..end], rows, columns, &tree, self.seeds[plane])
            })
            .collect();

        let (width, height) = geometry[0];
        let mut image = ImageBuffer::new(width, height, 3);
        let interleaved = if self.layout == PlaneLayout::Quattro114 { 2 } else { 3 };
        for (channel, plane) in planes.iter().take(interleaved).enumerate() {
            for (pixel, &value) in image.data.chunks_exact_mut(3).zip(plane) {
                pixel[channel] = value;
            }
        }

        let top_layer = if self.layout == PlaneLayout::Quattro114 {
            let (top_width, top_height) = geometry[2];
            let top = ImageBuffer {
                width: top_width,
                height: top_height,
                channels: 1,
                data: std::mem::take(&mut planes[2]),
            };
            box_filter_into(&top, &mut image);
            Some(top)
        } else {
            None
        };

        debug!(
            width,
            height,
            layout = ?self.layout,
            top_layer = top_layer.is_some(),
            "Decoded TRUE image"
        );
        Ok(DecodedImage {
            image,
            top_layer,
            layout: self.layout,
        })
    }
}

/// Decodes one plane. Columns 0 and 1 predict from the previous row of the
/// same parity; later columns from two columns back. Values are clamped to
/// the 16-bit range.
pub fn decode_plane(data: &[u8], rows: usize, columns: usize, tree: &HuffmanTree, seed: u16) -> Vec<u16> {
    let mut out = vec![0u16; rows * columns];
    let mut reader = BitReader::new(data);
    let mut row_start = [[i32::from(seed); 2]; 2];

    for (row, line) in out.chunks_exact_mut(columns.max(1)).enumerate().take(rows) {
        let mut col_acc = [0i32; 2];
        for (col, sample) in line.iter_mut().enumerate() {
            let diff = true_diff(&mut reader, tree);
            let prev = if col < 2 {
                row_start[row & 1][col & 1]
            } else {
                col_acc[col & 1]
            };
            let value = prev.wrapping_add(diff);
            col_acc[col & 1] = value;
            if col < 2 {
                row_start[row & 1][col & 1] = value;
            }
            *sample = value.clamp(0, i32::from(u16::MAX)) as u16;
        }
    }
    out
}

/// Fills channel 2 of `image` with the 2x2 mean of `top` wherever the
/// block lies inside the top layer.
fn box_filter_into(top: &ImageBuffer, image: &mut ImageBuffer) {
    let width = image.width;
    if width == 0 {
        return;
    }
    image
        .data
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, line)| {
            let (y0, y1) = (row * 2, row * 2 + 1);
            if y1 >= top.height {
                return;
            }
            for col in 0..width {
                let (x0, x1) = (col * 2, col * 2 + 1);
                if x1 >= top.width {
                    break;
                }
                let sum = u32::from(top.data[y0 * top.width + x0])
                    + u32::from(top.data[y0 * top.width + x1])
                    + u32::from(top.data[y1 * top.width + x0])
                    + u32::from(top.data[y1 * top.width + x1]);
                line[col * 3 + 2] = (sum / 4) as u16;
            }
        });
}
