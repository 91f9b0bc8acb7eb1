use byteorder::{ByteOrder, LittleEndian};

use crate::x3f::common::bytes::{ByteCursor, u32_at};
use crate::x3f::common::error::FormatError;
use crate::x3f::container::tags;

/// Name/value strings of a PROP section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable {
    pub character_format: u32,
    entries: Vec<(String, String)>,
}

impl PropertyTable {
    /// Parses a wrapped (`SECp`) or bare (`PROP`) property section.
    ///
    /// Table offsets count UTF-16 code units from the start of the string
    /// pool. Entries whose name lies outside the pool are skipped.
    pub fn parse(section: &[u8], tag: u32) -> Result<Self, FormatError> {
        if tag == tags::SECP {
            let found = u32_at(section, 0, "property section")?;
            if found != tags::SECP {
                return Err(FormatError::BadSectionTag {
                    expected: tags::SECP,
                    found,
                });
            }
        }

        let mut cursor = ByteCursor::at(section, 8, "property section");
        let count = cursor.u32()? as usize;
        let character_format = cursor.u32()?;
        let _reserved = cursor.u32()?;
        let _total_length = cursor.u32()?;
        let table = cursor.bytes(count.saturating_mul(8))?;
        let pool = cursor.rest();

        let entries = table
            .chunks_exact(8)
            .filter_map(|pair| {
                let name = utf16_at(pool, LittleEndian::read_u32(&pair[0..4]))?;
                let value = utf16_at(pool, LittleEndian::read_u32(&pair[4..8])).unwrap_or_default();
                Some((name, value))
            })
            .collect();

        Ok(Self {
            character_format,
            entries,
        })
    }

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

fn utf16_at(pool: &[u8], units: u32) -> Option<String> {
    let start = (units as usize).checked_mul(2)?;
    let tail = pool.get(start..).filter(|t| !t.is_empty())?;
    let text: Vec<u16> = tail
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .take_while(|&unit| unit != 0)
        .collect();
    Some(String::from_utf16_lossy(&text))
}
