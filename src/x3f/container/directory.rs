use tracing::debug;

use crate::x3f::common::bytes::{ByteCursor, u32_at};
use crate::x3f::common::error::{FormatError, Result};
use crate::x3f::common::source::ByteSource;
use crate::x3f::container::section::SectionKind;
use crate::x3f::container::tags;

const DIRECTORY_HEADER_LEN: u64 = 12;
const ENTRY_LEN: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub offset: u32,
    pub length: u32,
    pub tag: u32,
}

impl DirectoryEntry {
    pub fn kind(&self) -> SectionKind {
        SectionKind::from_tag(self.tag)
    }

    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

/// Section index stored at the end of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub version: u32,
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    /// Follows the trailing pointer and reads the `SECd` table. Every entry
    /// is checked against the file size here, so later section reads never
    /// leave the file.
    pub fn read<S: ByteSource + ?Sized>(source: &S) -> Result<Self> {
        let file_size = source.len();
        if file_size < 4 {
            return Err(FormatError::FileTooSmall(file_size).into());
        }

        let pointer = source.read_vec(file_size - 4, 4)?;
        let offset = u64::from(u32_at(&pointer, 0, "directory pointer")?);
        if offset + DIRECTORY_HEADER_LEN > file_size {
            return Err(FormatError::DirectoryOutOfRange { offset, file_size }.into());
        }

        let head = source.read_vec(offset, DIRECTORY_HEADER_LEN as usize)?;
        let mut cursor = ByteCursor::new(&head, "directory header");
        let tag = cursor.u32()?;
        if tag != tags::SECD {
            return Err(FormatError::BadDirectoryTag(tag).into());
        }
        let version = cursor.u32()?;
        let count = u64::from(cursor.u32()?);

        let table_start = offset + DIRECTORY_HEADER_LEN;
        if table_start + count * ENTRY_LEN > file_size {
            return Err(FormatError::DirectoryOutOfRange { offset, file_size }.into());
        }
        let table = source.read_vec(table_start, (count * ENTRY_LEN) as usize)?;

        let entries = table
            .chunks_exact(ENTRY_LEN as usize)
            .enumerate()
            .map(|(index, record)| {
                let mut cursor = ByteCursor::new(record, "directory entry");
                let entry = DirectoryEntry {
                    offset: cursor.u32()?,
                    length: cursor.u32()?,
                    tag: cursor.u32()?,
                };
                if entry.end() > file_size {
                    return Err(FormatError::EntryOutOfRange {
                        index,
                        offset: entry.offset,
                        length: entry.length,
                        file_size,
                    });
                }
                Ok(entry)
            })
            .collect::<std::result::Result<Vec<_>, FormatError>>()?;

        debug!(
            version = format_args!("{:#x}", version),
            entries = entries.len(),
            "Read directory"
        );
        Ok(Self { version, entries })
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry answering a request for `tag`: the exact tag, or a bare
    /// or wrapped tag of the same section kind.
    pub fn find(&self, tag: u32) -> Option<&DirectoryEntry> {
        let kind = SectionKind::from_tag(tag);
        self.entries
            .iter()
            .find(|entry| entry.tag == tag || (kind.is_known() && entry.kind() == kind))
    }

    pub fn of_kind(&self, kind: SectionKind) -> impl Iterator<Item = &DirectoryEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.kind() == kind)
    }
}
