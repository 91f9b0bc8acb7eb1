use byteorder::{ByteOrder, LittleEndian};

use crate::x3f::common::bytes::{ByteCursor, c_string};

/// Element encoding of a matrix payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int16,
    UInt8,
    UInt16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl ElementType {
    pub fn from_matrix_type(matrix_type: u32) -> Option<Self> {
        match matrix_type {
            0 => Some(ElementType::Int16),
            1 | 2 => Some(ElementType::UInt32),
            3 => Some(ElementType::Float32),
            5 => Some(ElementType::UInt8),
            6 => Some(ElementType::UInt16),
            _ => None,
        }
    }

    /// Guess used when `matrix_type` is not one of the known codes.
    pub fn from_width(width: usize) -> Option<Self> {
        match width {
            8 => Some(ElementType::Float64),
            4 => Some(ElementType::UInt32),
            2 => Some(ElementType::UInt16),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        match self {
            ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::UInt32 | ElementType::Int32 | ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }
}

/// Decoded matrix payload. Narrow integer types are widened.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    U32(Vec<u32>),
    I32(Vec<i32>),
}

impl MatrixData {
    pub fn len(&self) -> usize {
        match self {
            MatrixData::F64(v) => v.len(),
            MatrixData::F32(v) => v.len(),
            MatrixData::U32(v) => v.len(),
            MatrixData::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            MatrixData::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            MatrixData::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Floating point payloads widened to `f64`.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            MatrixData::F64(v) => Some(v.clone()),
            MatrixData::F32(v) => Some(v.iter().map(|&x| f64::from(x)).collect()),
            _ => None,
        }
    }

    /// Any payload converted to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            MatrixData::F64(v) => v.clone(),
            MatrixData::F32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            MatrixData::U32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            MatrixData::I32(v) => v.iter().map(|&x| f64::from(x)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixDim {
    pub size: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub matrix_type: u32,
    pub element_type: ElementType,
    pub dims: Vec<MatrixDim>,
    pub data: MatrixData,
}

/// Why a matrix entry could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixIssue {
    Header,
    UnknownElementType { matrix_type: u32 },
    ShortPayload { needed: usize, available: usize },
}

impl Matrix {
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    pub fn dim_sizes(&self) -> Vec<u32> {
        self.dims.iter().map(|d| d.size).collect()
    }

    /// Parses the value region of a matrix entry. `entry` spans the whole
    /// entry, since dimension names and the data offset are entry-relative.
    pub fn parse(entry: &[u8], value_offset: usize) -> Result<Matrix, MatrixIssue> {
        let mut cursor = ByteCursor::at(entry, value_offset, "CAMF matrix");
        let matrix_type = cursor.u32().map_err(|_| MatrixIssue::Header)?;
        let dim_count = cursor.u32().map_err(|_| MatrixIssue::Header)? as usize;
        let data_offset = cursor.u32().map_err(|_| MatrixIssue::Header)? as usize;

        if dim_count.saturating_mul(12) > cursor.remaining() {
            return Err(MatrixIssue::Header);
        }

        let mut dims = Vec::with_capacity(dim_count);
        let mut elements = 1usize;
        for _ in 0..dim_count {
            let size = cursor.u32().map_err(|_| MatrixIssue::Header)?;
            let name_offset = cursor.u32().map_err(|_| MatrixIssue::Header)? as usize;
            cursor.skip(4).map_err(|_| MatrixIssue::Header)?;
            let name = match entry.get(name_offset..) {
                Some(tail) if name_offset > 0 => c_string(tail),
                _ => String::new(),
            };
            elements = elements.saturating_mul(size as usize);
            dims.push(MatrixDim { size, name });
        }

        let available = entry.len().saturating_sub(data_offset);
        let element_type = match ElementType::from_matrix_type(matrix_type) {
            Some(t) => t,
            None if elements > 0 => ElementType::from_width(available / elements)
                .ok_or(MatrixIssue::UnknownElementType { matrix_type })?,
            None => ElementType::UInt32,
        };

        let needed = elements.saturating_mul(element_type.width());
        if needed > available {
            return Err(MatrixIssue::ShortPayload { needed, available });
        }
        let raw = if needed == 0 {
            &[][..]
        } else {
            entry
                .get(data_offset..data_offset + needed)
                .ok_or(MatrixIssue::ShortPayload { needed, available })?
        };

        Ok(Matrix {
            matrix_type,
            element_type,
            dims,
            data: decode_elements(raw, element_type),
        })
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn decode_elements(raw: &[u8], element_type: ElementType) -> MatrixData {
    let width = element_type.width();
    let words = raw.chunks_exact(width);
    match element_type {
        ElementType::Float64 => {
            MatrixData::F64(words.map(|w| finite_or_zero(LittleEndian::read_f64(w))).collect())
        }
        ElementType::Float32 => MatrixData::F32(
            words
                .map(|w| {
                    let v = LittleEndian::read_f32(w);
                    if v.is_finite() { v } else { 0.0 }
                })
                .collect(),
        ),
        ElementType::UInt32 => MatrixData::U32(words.map(LittleEndian::read_u32).collect()),
        ElementType::UInt16 => {
            MatrixData::U32(words.map(|w| u32::from(LittleEndian::read_u16(w))).collect())
        }
        ElementType::UInt8 => MatrixData::U32(words.map(|w| u32::from(w[0])).collect()),
        ElementType::Int32 => MatrixData::I32(words.map(LittleEndian::read_i32).collect()),
        ElementType::Int16 => {
            MatrixData::I32(words.map(|w| i32::from(LittleEndian::read_i16(w))).collect())
        }
    }
}
