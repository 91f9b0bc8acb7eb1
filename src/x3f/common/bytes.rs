//! Bounds-checked little-endian field access over byte slices.

use byteorder::{ByteOrder, LittleEndian};

use crate::x3f::common::error::FormatError;

/// Returns `len` bytes at `offset`, or a `Truncated` error naming `what`.
pub fn slice_at<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], FormatError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(FormatError::Truncated {
            what,
            offset,
            needed: len,
            available: data.len().saturating_sub(offset),
        })
}

pub fn u16_at(data: &[u8], offset: usize, what: &'static str) -> Result<u16, FormatError> {
    slice_at(data, offset, 2, what).map(LittleEndian::read_u16)
}

pub fn u32_at(data: &[u8], offset: usize, what: &'static str) -> Result<u32, FormatError> {
    slice_at(data, offset, 4, what).map(LittleEndian::read_u32)
}

/// Reads a NUL-terminated 8-bit string; the whole slice if no terminator.
pub fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Sequential reader used for headers whose fields follow each other.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, pos: 0, what }
    }

    pub fn at(data: &'a [u8], pos: usize, what: &'static str) -> Self {
        Self { data, pos, what }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        let out = slice_at(self.data, self.pos, len, self.what)?;
        self.pos += len;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), FormatError> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        self.bytes(1).map(|b| b[0])
    }

    pub fn u16(&mut self) -> Result<u16, FormatError> {
        self.bytes(2).map(LittleEndian::read_u16)
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        self.bytes(4).map(LittleEndian::read_u32)
    }

    pub fn f32(&mut self) -> Result<f32, FormatError> {
        self.bytes(4).map(LittleEndian::read_f32)
    }

    pub fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or(&[])
    }
}
