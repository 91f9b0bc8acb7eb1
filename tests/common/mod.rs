//! Synthetic X3F files for the integration tests and benchmarks.

#![allow(dead_code)]

use x3f_raw_rs::x3f::camf::xor_stream;

pub const VERSION_4_0: u32 = 0x0004_0000;
pub const FORMAT_TRUE: u32 = 0x0003_001e;
pub const FORMAT_QUATTRO: u32 = 0x0001_0023;

pub fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad(out: &mut Vec<u8>, align: usize) {
    while out.len() % align != 0 {
        out.push(0);
    }
}

#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    used: u32,
}

impl BitWriter {
    fn push_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> self.used;
            }
            self.used = (self.used + 1) % 8;
        }
    }
}

/// Sixteen 4-bit codes, code `i` announcing an `i`-bit magnitude.
fn code_table() -> Vec<u8> {
    let mut out: Vec<u8> = (0u8..16).flat_map(|i| [4, i << 4]).collect();
    out.extend_from_slice(&[0, 0]);
    out
}

/// Encodes one plane with the row/column predictor of the TRUE codec.
pub fn encode_plane(values: &[u16], rows: usize, columns: usize, seed: u16) -> Vec<u8> {
    let mut writer = BitWriter::default();
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
            let diff = value - prev;
            let magnitude = diff.unsigned_abs();
            let bits = 32 - magnitude.leading_zeros();
            assert!(bits < 16, "diff {diff} does not fit the code table");
            writer.push_bits(bits, 4);
            if bits > 0 {
                let coded = if diff > 0 {
                    magnitude
                } else {
                    (diff + (1 << bits) - 1) as u32
                };
                writer.push_bits(coded, bits);
            }
            col_acc[col & 1] = value;
            if col < 2 {
                row_start[row & 1][col & 1] = value;
            }
        }
    }
    writer.bytes
}

pub struct Plane {
    pub columns: usize,
    pub rows: usize,
    pub values: Vec<u16>,
    pub seed: u16,
}

/// A TRUE-engine `SECi` section. Quattro sections carry the plane sizes.
pub fn true_section(format: u32, columns: u32, rows: u32, planes: &[Plane; 3]) -> Vec<u8> {
    let quattro = format == FORMAT_QUATTRO;
    let mut out = Vec::new();
    for value in [0x6943_4553, 0x0002_0000, 1, format, columns, rows, 0] {
        put_u32(&mut out, value);
    }
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
    out.extend_from_slice(&code_table());
    if quattro {
        put_u32(&mut out, 0);
    }

    let encoded: Vec<Vec<u8>> = planes
        .iter()
        .map(|p| encode_plane(&p.values, p.rows, p.columns, p.seed))
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

/// A CAMF matrix entry of unsigned 32-bit values with unnamed dimensions.
pub fn u32_matrix(name: &str, dims: &[u32], values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in [0x4d62_4d43, 1, 0, 20, 0] {
        put_u32(&mut out, value);
    }
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    pad(&mut out, 4);
    let value_offset = out.len() as u32;
    out[16..20].copy_from_slice(&value_offset.to_le_bytes());

    let data_offset = out.len() + 12 + dims.len() * 12;
    put_u32(&mut out, 2);
    put_u32(&mut out, dims.len() as u32);
    put_u32(&mut out, data_offset as u32);
    for &size in dims {
        put_u32(&mut out, size);
        put_u32(&mut out, 0);
        put_u32(&mut out, 0);
    }
    for &value in values {
        put_u32(&mut out, value);
    }
    let size = out.len() as u32;
    out[8..12].copy_from_slice(&size.to_le_bytes());
    out
}

/// A type-2 (XOR obfuscated) CAMF section around `entries`.
pub fn camf_section(key: u32, entries: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in [0x6343_4553, 0x0002_0000, 2, 0, 0, 0, key] {
        put_u32(&mut out, value);
    }
    out.extend_from_slice(&xor_stream(key, &entries.concat()));
    out
}

/// A `SECp` property section with UTF-16 strings.
pub fn property_section(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut pool: Vec<u16> = Vec::new();
    let mut table = Vec::new();
    for (name, value) in pairs {
        let name_offset = pool.len() as u32;
        pool.extend(name.encode_utf16());
        pool.push(0);
        let value_offset = pool.len() as u32;
        pool.extend(value.encode_utf16());
        pool.push(0);
        table.push((name_offset, value_offset));
    }

    let mut out = Vec::new();
    for value in [0x7043_4553, 0x0002_0000, pairs.len() as u32, 0, 0, pool.len() as u32] {
        put_u32(&mut out, value);
    }
    for (name_offset, value_offset) in table {
        put_u32(&mut out, name_offset);
        put_u32(&mut out, value_offset);
    }
    for unit in pool {
        put_u16(&mut out, unit);
    }
    out
}

/// Version 4.0 file: header, sections, then the directory and its pointer.
#[derive(Default)]
pub struct X3fFile {
    sections: Vec<(u32, Vec<u8>)>,
}

impl X3fFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, tag: u32, bytes: Vec<u8>) -> Self {
        self.sections.push((tag, bytes));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        put_u32(&mut out, 0x6256_4f46);
        put_u32(&mut out, VERSION_4_0);
        out.extend_from_slice(&[0x5a; 16]);

        let mut entries = Vec::new();
        for (tag, bytes) in &self.sections {
            pad(&mut out, 4);
            entries.push((out.len() as u32, bytes.len() as u32, *tag));
            out.extend_from_slice(bytes);
        }
        pad(&mut out, 4);
        let directory = out.len() as u32;
        put_u32(&mut out, 0x6443_4553);
        put_u32(&mut out, 0x0002_0000);
        put_u32(&mut out, entries.len() as u32);
        for (offset, length, tag) in entries {
            put_u32(&mut out, offset);
            put_u32(&mut out, length);
            put_u32(&mut out, tag);
        }
        put_u32(&mut out, directory);
        out
    }
}

/// Deterministic texture in `0..4096` that keeps neighbouring diffs small.
pub fn texture(columns: usize, rows: usize, phase: usize) -> Vec<u16> {
    (0..rows)
        .flat_map(|y| (0..columns).map(move |x| (((x * 7 + y * 13 + phase) % 512) * 8) as u16))
        .collect()
}
