use tracing::{trace, warn};

use crate::x3f::camf::matrix::Matrix;
use crate::x3f::common::bytes::{ByteCursor, c_string, u32_at};

/// Entry tag for a property list (`CMbP`).
pub const CMBP: u32 = 0x5062_4d43;
/// Entry tag for a text blob (`CMbT`).
pub const CMBT: u32 = 0x5462_4d43;
/// Entry tag for a matrix (`CMbM`).
pub const CMBM: u32 = 0x4d62_4d43;

const ENTRY_HEADER_SIZE: usize = 20;

/// Name/value pairs of one CAMF property list, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyList {
    entries: Vec<(String, String)>,
}

impl PropertyList {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CamfValue {
    Text(String),
    Properties(PropertyList),
    Matrix(Matrix),
    /// An entry with an id this parser does not interpret.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CamfEntry {
    pub id: u32,
    pub version: u32,
    pub name: String,
    /// Byte offset of the entry within the decrypted buffer.
    pub offset: usize,
    pub size: u32,
    pub value: CamfValue,
}

impl CamfEntry {
    pub fn kind(&self) -> &'static str {
        match self.value {
            CamfValue::Text(_) => "text",
            CamfValue::Properties(_) => "property list",
            CamfValue::Matrix(_) => "matrix",
            CamfValue::Other => "unknown entry",
        }
    }
}

/// Walks the decrypted buffer entry by entry.
///
/// The walk ends quietly at the first position that cannot hold a valid
/// header; files commonly pad the tail. Matrix entries whose payload is
/// shorter than their dimensions are dropped with a warning.
pub fn parse_entries(decoded: &[u8]) -> Vec<CamfEntry> {
    let mut entries = Vec::new();
    let mut offset = 0usize;

    while decoded.len().saturating_sub(offset) >= ENTRY_HEADER_SIZE {
        let rest = &decoded[offset..];
        let Some(header) = EntryHeader::read(rest) else {
            trace!(offset, "End of CAMF entries");
            break;
        };

        let entry_bytes = &rest[..(header.size as usize).min(rest.len())];
        match parse_entry(&header, entry_bytes, offset) {
            Some(entry) => entries.push(entry),
            None => trace!(offset, id = header.id, "Skipped CAMF entry"),
        }
        offset += header.size as usize;
    }
    entries
}

struct EntryHeader {
    id: u32,
    version: u32,
    size: u32,
    name_offset: u32,
    value_offset: u32,
}

impl EntryHeader {
    fn read(data: &[u8]) -> Option<Self> {
        let header = Self {
            id: u32_at(data, 0, "CAMF entry").ok()?,
            version: u32_at(data, 4, "CAMF entry").ok()?,
            size: u32_at(data, 8, "CAMF entry").ok()?,
            name_offset: u32_at(data, 12, "CAMF entry").ok()?,
            value_offset: u32_at(data, 16, "CAMF entry").ok()?,
        };
        let size_ok = header.size as usize >= ENTRY_HEADER_SIZE;
        let name_ok = header.name_offset as usize >= ENTRY_HEADER_SIZE
            && header.name_offset < header.size
            && (header.name_offset as usize) < data.len();
        (size_ok && name_ok).then_some(header)
    }
}

fn parse_entry(header: &EntryHeader, entry: &[u8], offset: usize) -> Option<CamfEntry> {
    let name_start = header.name_offset as usize;
    let name_end = if header.value_offset == 0 {
        header.size as usize
    } else {
        header.value_offset as usize
    }
    .min(entry.len());
    let name = entry
        .get(name_start..name_end.max(name_start))
        .map(c_string)
        .unwrap_or_default();

    let value_offset = header.value_offset as usize;
    let has_value = value_offset != 0 && value_offset < entry.len();
    let value = match header.id {
        CMBT if has_value => CamfValue::Text(parse_text(entry, value_offset)),
        CMBT => CamfValue::Text(String::new()),
        CMBP if has_value => CamfValue::Properties(parse_properties(entry, value_offset)),
        CMBP => CamfValue::Properties(PropertyList::default()),
        CMBM if has_value => match Matrix::parse(entry, value_offset) {
            Ok(matrix) => CamfValue::Matrix(matrix),
            Err(issue) => {
                warn!(name = %name, ?issue, "Dropping malformed CAMF matrix");
                return None;
            }
        },
        CMBM => return None,
        _ => CamfValue::Other,
    };

    Some(CamfEntry {
        id: header.id,
        version: header.version,
        name,
        offset,
        size: header.size,
        value,
    })
}

fn parse_text(entry: &[u8], value_offset: usize) -> String {
    let Ok(declared) = u32_at(entry, value_offset, "CAMF text") else {
        return String::new();
    };
    let start = value_offset + 4;
    let end = start.saturating_add(declared as usize).min(entry.len());
    entry.get(start..end).map(c_string).unwrap_or_default()
}

fn parse_properties(entry: &[u8], value_offset: usize) -> PropertyList {
    let mut cursor = ByteCursor::at(entry, value_offset, "CAMF property list");
    let (Ok(count), Ok(pool_base)) = (cursor.u32(), cursor.u32()) else {
        return PropertyList::default();
    };
    let count = (count as usize).min(cursor.remaining() / 8);
    let pool_base = pool_base as usize;

    let string_at = |rel: u32| -> String {
        pool_base
            .checked_add(rel as usize)
            .and_then(|at| entry.get(at..))
            .map(c_string)
            .unwrap_or_default()
    };

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let (Ok(name_rel), Ok(value_rel)) = (cursor.u32(), cursor.u32()) else {
            break;
        };
        entries.push((string_at(name_rel), string_at(value_rel)));
    }
    PropertyList { entries }
}
