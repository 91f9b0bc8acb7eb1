//! File container
//!
//! Reads the header and the trailing section directory, then loads the
//! PROP, CAMF and image sections on demand. Every section is populated at
//! most once; repeated loads return the stored result.

mod directory;
mod header;
mod properties;
mod section;


use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, info, instrument, warn};

use crate::x3f::camf::{Camf, white_balance_name};
use crate::x3f::common::error::{FormatError, Result, X3fError};
use crate::x3f::common::source::{ByteSource, FileSource};
use crate::x3f::image::ImageSection;

pub use directory::{Directory, DirectoryEntry};
pub use header::{
    Header, LegacyHeader, MAX_HEADER_LEN, VERSION_2_1, VERSION_2_3, VERSION_3_0, VERSION_4_0,
};
pub use properties::PropertyTable;
pub use section::SectionKind;

/// Four-character tags used by the file format, stored little-endian.
pub mod tags {
    pub const FOVB: u32 = 0x6256_4f46;
    pub const SECD: u32 = 0x6443_4553;
    pub const PROP: u32 = 0x504f_5250;
    pub const SECP: u32 = 0x7043_4553;
    pub const IMAG: u32 = 0x4641_4d49;
    pub const IMA2: u32 = 0x3241_4d49;
    pub const SECI: u32 = 0x6943_4553;
    pub const CAMF: u32 = 0x464d_4143;
    pub const SECC: u32 = 0x6343_4553;

    /// Renders a tag as its ASCII characters, e.g. `SECd`.
    pub fn fourcc(tag: u32) -> String {
        tag.to_le_bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect()
    }
}

/// An opened file: header and directory are read eagerly, sections lazily.
pub struct Container<S: ByteSource = FileSource> {
    source: S,
    header: Header,
    directory: Directory,
    properties: OnceLock<PropertyTable>,
    camf: OnceLock<Camf>,
    images: OnceLock<Vec<ImageSection>>,
}

impl Container<FileSource> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening container");
        Self::from_source(FileSource::open(path)?)
    }
}

impl<S: ByteSource> Container<S> {
    #[instrument(skip(source), fields(size = source.len()))]
    pub fn from_source(source: S) -> Result<Self> {
        let head_len = source.len().min(MAX_HEADER_LEN as u64) as usize;
        let head = source.read_vec(0, head_len)?;
        let header = Header::parse(&head)?;
        let directory = Directory::read(&source)?;
        debug!(
            version = %header.version_string(),
            sections = directory.len(),
            "Container opened"
        );

        Ok(Self {
            source,
            header,
            directory,
            properties: OnceLock::new(),
            camf: OnceLock::new(),
            images: OnceLock::new(),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn file_size(&self) -> u64 {
        self.source.len()
    }

    /// Raw bytes of one directory entry.
    pub fn section_bytes(&self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        if entry.end() > self.source.len() {
            return Err(FormatError::DirectoryOutOfRange {
                offset: u64::from(entry.offset),
                file_size: self.source.len(),
            }
            .into());
        }
        Ok(self
            .source
            .read_vec(u64::from(entry.offset), entry.length as usize)?)
    }

    /// Loads the section requested by `tag`. Loading an already loaded
    /// section is a no-op.
    pub fn load_section(&self, tag: u32) -> Result<()> {
        let entry = self
            .directory
            .find(tag)
            .ok_or(X3fError::SectionNotFound(tag))?;
        match entry.kind() {
            SectionKind::Properties => self.load_properties().map(|_| ()),
            SectionKind::Camf => self.load_camf().map(|_| ()),
            SectionKind::Image => self.load_images().map(|_| ()),
            SectionKind::Unsupported(found) => Err(X3fError::UnsupportedSection(found)),
        }
    }

    pub fn load_properties(&self) -> Result<&PropertyTable> {
        if let Some(properties) = self.properties.get() {
            return Ok(properties);
        }
        let entry = self
            .directory
            .find(tags::SECP)
            .ok_or(X3fError::SectionNotFound(tags::SECP))?;
        let table = PropertyTable::parse(&self.section_bytes(entry)?, entry.tag)?;
        debug!(properties = table.len(), "Loaded properties");
        Ok(self.properties.get_or_init(|| table))
    }

    pub fn load_camf(&self) -> Result<&Camf> {
        if let Some(camf) = self.camf.get() {
            return Ok(camf);
        }
        let entry = self
            .directory
            .find(tags::SECC)
            .ok_or(X3fError::SectionNotFound(tags::SECC))?;
        let camf = Camf::parse(&self.section_bytes(entry)?)?;
        Ok(self.camf.get_or_init(|| camf))
    }

    /// Reads every image entry and keeps the RAW ones, in directory order.
    /// Previews and unknown formats are skipped, and so are sections that
    /// fail to parse as long as another RAW section loads. If none does, the
    /// first failure is returned.
    pub fn load_images(&self) -> Result<&[ImageSection]> {
        if let Some(images) = self.images.get() {
            return Ok(images.as_slice());
        }
        let mut images = Vec::new();
        let mut first_error = None;
        for (index, entry) in self.directory.entries().iter().enumerate() {
            if entry.kind() != SectionKind::Image {
                continue;
            }
            let parsed = self
                .section_bytes(entry)
                .and_then(|bytes| ImageSection::parse(index, bytes));
            match parsed {
                Ok(Some(section)) => images.push(section),
                Ok(None) => debug!(index, "Skipped non-RAW image section"),
                Err(e) => {
                    warn!(index, error = %e, "Skipped unreadable image section");
                    first_error.get_or_insert(e);
                }
            }
        }
        if images.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
            if self.directory.of_kind(SectionKind::Image).next().is_none() {
                return Err(X3fError::SectionNotFound(tags::SECI));
            }
        }
        debug!(raw_images = images.len(), "Loaded image sections");
        Ok(self.images.get_or_init(|| images).as_slice())
    }

    pub fn properties(&self) -> Option<&PropertyTable> {
        self.properties.get()
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get()?.get(name)
    }

    pub fn camf(&self) -> Option<&Camf> {
        self.camf.get()
    }

    /// Loaded RAW image sections; empty until `load_images` ran.
    pub fn image_sections(&self) -> &[ImageSection] {
        self.images.get().map_or(&[], Vec::as_slice)
    }

    /// The last RAW image section, which holds the full capture.
    pub fn raw_image(&self) -> Result<&ImageSection> {
        let images = self.images.get().ok_or(X3fError::NotLoaded("image"))?;
        images.last().ok_or(X3fError::NoRawImage)
    }

    /// White balance preset: the CAMF code if CAMF is loaded, else the
    /// header field, else `Auto`.
    pub fn white_balance(&self) -> String {
        if let Some(code) = self.camf().and_then(Camf::white_balance_code) {
            return white_balance_name(code).to_string();
        }
        self.header
            .white_balance()
            .unwrap_or(white_balance_name(0))
            .to_string()
    }
}
