use tracing::trace;

use crate::x3f::common::bytes::{ByteCursor, c_string};
use crate::x3f::common::error::FormatError;
use crate::x3f::container::tags;

pub const VERSION_2_1: u32 = 0x0002_0001;
pub const VERSION_2_3: u32 = 0x0002_0003;
pub const VERSION_3_0: u32 = 0x0003_0000;
pub const VERSION_4_0: u32 = 0x0004_0000;

const BASE_LEN: usize = 4 + 4 + 16;
const LEGACY_LEN: usize = 4 * 4;
const NAME_LEN: usize = 32;
const EXT_DATA_2_1: usize = 32;
const EXT_DATA_3_0: usize = 64;

/// Largest header any version can declare.
pub const MAX_HEADER_LEN: usize = BASE_LEN + LEGACY_LEN + 2 * NAME_LEN + EXT_DATA_3_0 * 5;

/// Fields that only files older than 4.0 carry; newer bodies keep them in
/// CAMF.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyHeader {
    pub mark_bits: u32,
    pub columns: u32,
    pub rows: u32,
    pub rotation: u32,
    pub white_balance: Option<String>,
    pub color_mode: Option<String>,
    pub extended_types: Vec<u8>,
    pub extended_data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: u32,
    pub unique_identifier: [u8; 16],
    pub legacy: Option<LegacyHeader>,
}

impl Header {
    /// Bytes a header of `version` occupies.
    pub fn required_len(version: u32) -> usize {
        if version >= VERSION_4_0 {
            return BASE_LEN;
        }
        let mut len = BASE_LEN + LEGACY_LEN;
        if version >= VERSION_2_1 {
            len += NAME_LEN;
            if version >= VERSION_2_3 {
                len += NAME_LEN;
            }
            len += extended_count(version) * 5;
        }
        len
    }

    /// Parses the header from the first bytes of the file. `data` may be
    /// shorter than `MAX_HEADER_LEN` when the file itself is.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let truncated = |version: u32, needed: usize| FormatError::TruncatedHeader {
            version,
            needed: needed as u64,
            available: data.len() as u64,
        };

        let mut cursor = ByteCursor::new(data, "file header");
        let magic = cursor.u32().map_err(|_| truncated(0, BASE_LEN))?;
        if magic != tags::FOVB {
            return Err(FormatError::BadMagic {
                expected: tags::FOVB,
                found: magic,
            });
        }
        let version = cursor.u32().map_err(|_| truncated(0, BASE_LEN))?;
        let needed = Self::required_len(version);
        if data.len() < needed {
            return Err(truncated(version, needed));
        }

        let mut unique_identifier = [0u8; 16];
        unique_identifier.copy_from_slice(cursor.bytes(16)?);

        let legacy = if version < VERSION_4_0 {
            Some(Self::parse_legacy(&mut cursor, version)?)
        } else {
            None
        };
        trace!(version = format_args!("{:#x}", version), "Parsed header");

        Ok(Self {
            version,
            unique_identifier,
            legacy,
        })
    }

    fn parse_legacy(cursor: &mut ByteCursor<'_>, version: u32) -> Result<LegacyHeader, FormatError> {
        let mut legacy = LegacyHeader {
            mark_bits: cursor.u32()?,
            columns: cursor.u32()?,
            rows: cursor.u32()?,
            rotation: cursor.u32()?,
            white_balance: None,
            color_mode: None,
            extended_types: Vec::new(),
            extended_data: Vec::new(),
        };
        if version < VERSION_2_1 {
            return Ok(legacy);
        }

        legacy.white_balance = Some(c_string(cursor.bytes(NAME_LEN)?));
        if version >= VERSION_2_3 {
            legacy.color_mode = Some(c_string(cursor.bytes(NAME_LEN)?));
        }
        let count = extended_count(version);
        legacy.extended_types = cursor.bytes(count)?.to_vec();
        legacy.extended_data = (0..count)
            .map(|_| cursor.f32())
            .collect::<Result<_, _>>()?;
        Ok(legacy)
    }

    pub fn version_string(&self) -> String {
        format!("{}.{}", self.version >> 16, self.version & 0xffff)
    }

    /// Header white balance preset, when present and non-empty.
    pub fn white_balance(&self) -> Option<&str> {
        self.legacy
            .as_ref()
            .and_then(|l| l.white_balance.as_deref())
            .filter(|wb| !wb.is_empty())
    }
}

fn extended_count(version: u32) -> usize {
    if version >= VERSION_3_0 {
        EXT_DATA_3_0
    } else {
        EXT_DATA_2_1
    }
}
