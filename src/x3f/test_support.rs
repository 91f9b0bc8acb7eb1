//! Synthetic encoders used to build fixtures for the decoders.

use crate::x3f::huffman::TrueCode;

#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bit(&mut self, bit: u32) {
        if self.used == 0 {
            self.bytes.push(0);
        }
        if bit & 1 == 1 {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> self.used;
        }
        self.used = (self.used + 1) % 8;
    }

    pub fn push_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.push_bit(value >> i);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Sixteen 4-bit codes; entry `i` encodes an `i`-bit magnitude.
pub fn true_table() -> Vec<TrueCode> {
    (0u8..16)
        .map(|i| TrueCode {
            code_size: 4,
            code: i << 4,
        })
        .collect()
}

pub fn true_table_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    for code in true_table() {
        out.push(code.code_size);
        out.push(code.code);
    }
    out.extend_from_slice(&[0, 0]);
    out
}

pub fn push_true_diff(writer: &mut BitWriter, diff: i32) {
    let magnitude = diff.unsigned_abs();
    let bits = 32 - magnitude.leading_zeros();
    assert!(bits < 16, "diff {diff} too large for the fixture table");
    writer.push_bits(bits, 4);
    if bits == 0 {
        return;
    }
    let value = if diff > 0 {
        magnitude
    } else {
        (diff + ((1i32 << bits) - 1)) as u32
    };
    writer.push_bits(value, bits);
}

/// Encodes a plane with the TRUE row/column predictor.
pub fn encode_true_plane(values: &[u16], rows: usize, columns: usize, seed: u16) -> Vec<u8> {
    let mut writer = BitWriter::new();
    let mut row_start = [[i32::from(seed); 2]; 2];
    for row in 0..rows {
        let mut col_acc = [0i32; 2];
        for col in 0..columns {
            let value = i32::from(values[row * columns + col]);
            let prev = if col < 2 {
                row_start[row & 1][col & 1]
            } else {
                col_acc[col & 1]
            };
            push_true_diff(&mut writer, value - prev);
            col_acc[col & 1] = value;
            if col < 2 {
                row_start[row & 1][col & 1] = value;
            }
        }
    }
    writer.finish()
}

pub fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn entry_shell(id: u32, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, id);
    put_u32(&mut out, 1);
    put_u32(&mut out, 0);
    put_u32(&mut out, 20);
    put_u32(&mut out, 0);
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    pad4(&mut out);
    let value_offset = out.len() as u32;
    out[16..20].copy_from_slice(&value_offset.to_le_bytes());
    out
}

fn seal(mut out: Vec<u8>) -> Vec<u8> {
    pad4(&mut out);
    let size = out.len() as u32;
    out[8..12].copy_from_slice(&size.to_le_bytes());
    out
}

pub fn text_entry(name: &str, text: &str) -> Vec<u8> {
    let mut out = entry_shell(0x5462_4d43, name);
    put_u32(&mut out, text.len() as u32 + 1);
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    seal(out)
}

pub fn property_entry(name: &str, pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut out = entry_shell(0x5062_4d43, name);
    let table_start = out.len() + 8;
    let pool_base = table_start + pairs.len() * 8;
    put_u32(&mut out, pairs.len() as u32);
    put_u32(&mut out, pool_base as u32);

    let mut pool = Vec::new();
    let mut offsets = Vec::new();
    for (key, value) in pairs {
        let key_off = pool.len() as u32;
        pool.extend_from_slice(key.as_bytes());
        pool.push(0);
        let value_off = pool.len() as u32;
        pool.extend_from_slice(value.as_bytes());
        pool.push(0);
        offsets.push((key_off, value_off));
    }
    for (key_off, value_off) in offsets {
        put_u32(&mut out, key_off);
        put_u32(&mut out, value_off);
    }
    out.extend_from_slice(&pool);
    seal(out)
}

/// Builds a matrix entry; `data` must already be encoded at the width
/// implied by `matrix_type`.
pub fn matrix_entry(name: &str, matrix_type: u32, dims: &[(u32, &str)], data: &[u8]) -> Vec<u8> {
    let mut out = entry_shell(0x4d62_4d43, name);
    let header_at = out.len();
    put_u32(&mut out, matrix_type);
    put_u32(&mut out, dims.len() as u32);
    put_u32(&mut out, 0);

    let dims_at = out.len();
    for (size, _) in dims {
        put_u32(&mut out, *size);
        put_u32(&mut out, 0);
        put_u32(&mut out, 0);
    }
    for (i, (_, dim_name)) in dims.iter().enumerate() {
        if dim_name.is_empty() {
            continue;
        }
        let name_off = out.len() as u32;
        out.extend_from_slice(dim_name.as_bytes());
        out.push(0);
        let slot = dims_at + i * 12 + 4;
        out[slot..slot + 4].copy_from_slice(&name_off.to_le_bytes());
    }
    pad4(&mut out);
    let data_off = out.len() as u32;
    out[header_at + 8..header_at + 12].copy_from_slice(&data_off.to_le_bytes());
    out.extend_from_slice(data);
    let size = out.len() as u32;
    out[8..12].copy_from_slice(&size.to_le_bytes());
    out
}

pub fn u32_matrix(name: &str, dims: &[u32], values: &[u32]) -> Vec<u8> {
    let dims: Vec<(u32, &str)> = dims.iter().map(|&d| (d, "")).collect();
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    matrix_entry(name, 2, &dims, &data)
}

/// Type-2 CAMF section around already-built entry bytes.
pub fn camf_type2_section(key: u32, entries: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, 0x6343_4553);
    put_u32(&mut out, 0x0002_0000);
    put_u32(&mut out, 2);
    put_u32(&mut out, 0);
    put_u32(&mut out, 0);
    put_u32(&mut out, 0);
    put_u32(&mut out, key);
    out.extend_from_slice(&crate::x3f::camf::xor_stream(key, entries));
    out
}

/// One TRUE plane to encode.
pub struct PlaneFixture<'a> {
    pub columns: usize,
    pub rows: usize,
    pub values: &'a [u16],
    pub seed: u16,
}

fn image_header(out: &mut Vec<u8>, image_type: u32, format: u32, columns: u32, rows: u32) {
    put_u32(out, 0x6943_4553);
    put_u32(out, 0x0002_0000);
    put_u32(out, image_type);
    put_u32(out, format);
    put_u32(out, columns);
    put_u32(out, rows);
    put_u32(out, 0);
}

/// A complete TRUE-engine image section. With `quattro`, the plane sizes
/// of `planes` are written into the Quattro header.
pub fn true_section(
    image_type: u32,
    format: u32,
    columns: u32,
    rows: u32,
    planes: &[PlaneFixture<'_>; 3],
    quattro: bool,
) -> Vec<u8> {
    let mut out = Vec::new();
    image_header(&mut out, image_type, format, columns, rows);
    if quattro {
        for plane in planes {
            put_u16(&mut out, plane.columns as u16);
            put_u16(&mut out, plane.rows as u16);
        }
    }
    for plane in planes {
        put_u16(&mut out, plane.seed);
    }
    put_u16(&mut out, 0);
    out.extend_from_slice(&true_table_bytes());
    if quattro {
        put_u32(&mut out, 0);
    }

    let encoded: Vec<Vec<u8>> = planes
        .iter()
        .map(|p| encode_true_plane(p.values, p.rows, p.columns, p.seed))
        .collect();
    for plane in &encoded {
        put_u32(&mut out, plane.len() as u32);
    }
    let data_start = out.len();
    for plane in &encoded {
        out.extend_from_slice(plane);
        while (out.len() - data_start) % 16 != 0 {
            out.push(0);
        }
    }
    out
}

/// Legacy table with four 2-bit codes; slot `k` (the diff) is coded as `k`.
pub fn legacy_table() -> Vec<u32> {
    (0u32..4).map(|k| (2 << 27) | k).collect()
}

/// A legacy Huffman image section. `diffs` holds `rows * columns * 3`
/// values in `0..4`; every row starts on a byte boundary.
pub fn huffman_section(columns: u32, rows: u32, diffs: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    image_header(&mut out, 1, 0x0003_0005, columns, rows);
    let table = legacy_table();
    put_u32(&mut out, table.len() as u32);
    for word in &table {
        put_u32(&mut out, *word);
    }

    let row_len = columns as usize * 3;
    let mut stream = Vec::new();
    let mut offsets = Vec::new();
    for row in diffs.chunks(row_len.max(1)).take(rows as usize) {
        offsets.push(stream.len() as u32);
        let mut writer = BitWriter::new();
        for &diff in row {
            writer.push_bits(u32::from(diff), 2);
        }
        stream.extend_from_slice(&writer.finish());
    }
    for offset in offsets {
        put_u32(&mut out, offset);
    }
    out.extend_from_slice(&stream);
    out
}

/// A `SECp` section with UTF-16 strings.
pub fn property_section(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut pool: Vec<u16> = Vec::new();
    let mut table = Vec::new();
    for (name, value) in pairs {
        let name_off = pool.len() as u32;
        pool.extend(name.encode_utf16());
        pool.push(0);
        let value_off = pool.len() as u32;
        pool.extend(value.encode_utf16());
        pool.push(0);
        table.push((name_off, value_off));
    }

    let mut out = Vec::new();
    put_u32(&mut out, 0x7043_4553);
    put_u32(&mut out, 0x0002_0000);
    put_u32(&mut out, pairs.len() as u32);
    put_u32(&mut out, 0);
    put_u32(&mut out, 0);
    put_u32(&mut out, pool.len() as u32);
    for (name_off, value_off) in table {
        put_u32(&mut out, name_off);
        put_u32(&mut out, value_off);
    }
    for unit in pool {
        put_u16(&mut out, unit);
    }
    out
}

/// Assembles a file: header, section bodies, then the `SECd` directory and
/// the trailing pointer to it.
pub struct FileBuilder {
    body: Vec<u8>,
    entries: Vec<(u32, u32, u32)>,
}

impl FileBuilder {
    pub fn new(version: u32) -> Self {
        Self::with_white_balance(version, "")
    }

    pub fn with_white_balance(version: u32, white_balance: &str) -> Self {
        let mut body = Vec::new();
        put_u32(&mut body, 0x6256_4f46);
        put_u32(&mut body, version);
        body.extend_from_slice(&[0xab; 16]);
        if version < 0x0004_0000 {
            for value in [0, 64, 48, 0] {
                put_u32(&mut body, value);
            }
            if version >= 0x0002_0001 {
                let mut name = [0u8; 32];
                name[..white_balance.len()].copy_from_slice(white_balance.as_bytes());
                body.extend_from_slice(&name);
                if version >= 0x0002_0003 {
                    body.extend_from_slice(&[0u8; 32]);
                }
                let count = if version >= 0x0003_0000 { 64 } else { 32 };
                body.extend(std::iter::repeat_n(0u8, count * 5));
            }
        }
        Self {
            body,
            entries: Vec::new(),
        }
    }

    pub fn section(mut self, tag: u32, bytes: &[u8]) -> Self {
        pad4(&mut self.body);
        self.entries
            .push((self.body.len() as u32, bytes.len() as u32, tag));
        self.body.extend_from_slice(bytes);
        self
    }

    /// A raw directory entry, for out-of-range cases.
    pub fn raw_entry(mut self, offset: u32, length: u32, tag: u32) -> Self {
        self.entries.push((offset, length, tag));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        pad4(&mut self.body);
        let directory = self.body.len() as u32;
        put_u32(&mut self.body, 0x6443_4553);
        put_u32(&mut self.body, 0x0002_0000);
        put_u32(&mut self.body, self.entries.len() as u32);
        for (offset, length, tag) in &self.entries {
            put_u32(&mut self.body, *offset);
            put_u32(&mut self.body, *length);
            put_u32(&mut self.body, *tag);
        }
        put_u32(&mut self.body, directory);
        self.body
    }
}
