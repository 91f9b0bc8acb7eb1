//! CAMF calibration metadata
//!
//! A CAMF section is deobfuscated with one of three schemes and then walked
//! as a stream of typed entries: text blobs, property lists and
//! N-dimensional matrices.

mod decrypt;
mod entry;
mod lookup;
mod matrix;

#[cfg(test)]
mod tests;

use tracing::{debug, instrument};

use crate::x3f::common::error::Result;

pub use decrypt::{
    CAMF_HEADER_SIZE, CamfHeader, CamfScheme, decrypt, huffman_12bit, huffman_accumulator,
    xor_stream,
};
pub use entry::{CMBM, CMBP, CMBT, CamfEntry, CamfValue, PropertyList, parse_entries};
pub use lookup::{CAMERA_ID_SDQ, CAMERA_ID_SDQH, white_balance_name};
pub use matrix::{ElementType, Matrix, MatrixData, MatrixDim, MatrixIssue};

/// Parsed CAMF section.
#[derive(Debug, Clone)]
pub struct Camf {
    header: CamfHeader,
    entries: Vec<CamfEntry>,
}

impl Camf {
    /// Decrypts and parses the raw bytes of a CAMF directory entry.
    #[instrument(skip(section), fields(len = section.len()))]
    pub fn parse(section: &[u8]) -> Result<Self> {
        let (header, decoded) = decrypt(section)?;
        let entries = parse_entries(&decoded);
        debug!(
            camf_type = header.camf_type,
            decoded = decoded.len(),
            entries = entries.len(),
            "Loaded CAMF"
        );
        Ok(Self { header, entries })
    }

    pub fn from_entries(header: CamfHeader, entries: Vec<CamfEntry>) -> Self {
        Self { header, entries }
    }

    pub fn header(&self) -> &CamfHeader {
        &self.header
    }

    pub fn entries(&self) -> &[CamfEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
