use thiserror::Error;

/// Structural problems with the container or a section layout.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Truncated header: version {version:#x} needs {needed} bytes, file has {available}")]
    TruncatedHeader {
        version: u32,
        needed: u64,
        available: u64,
    },

    #[error("File too small to hold a directory pointer: {0} bytes")]
    FileTooSmall(u64),

    #[error("Directory offset {offset} out of range for a file of {file_size} bytes")]
    DirectoryOutOfRange { offset: u64, file_size: u64 },

    #[error("Bad directory tag: {0:#010x}")]
    BadDirectoryTag(u32),

    #[error("Directory entry {index} ({offset}+{length}) exceeds file size {file_size}")]
    EntryOutOfRange {
        index: usize,
        offset: u32,
        length: u32,
        file_size: u64,
    },

    #[error("Unexpected section tag: expected {expected:#010x}, found {found:#010x}")]
    BadSectionTag { expected: u32, found: u32 },

    #[error("Truncated {what}: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Implausible image geometry: {columns}x{rows}")]
    ImageGeometry { columns: u32, rows: u32 },

    #[error("Unknown Quattro layer size: plane 0 has {plane_rows} rows, image has {image_rows}")]
    QuattroLayout { plane_rows: u16, image_rows: u32 },
}

/// Failures while running one of the bit-level codecs.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported image codec: {0:#010x}")]
    UnsupportedCodec(u32),

    #[error("Unsupported CAMF type: {0}")]
    UnsupportedCamfType(u32),

    #[error("Huffman table has no codes")]
    EmptyHuffmanTable,

    #[error("CAMF payload too short: {available} bytes, need more than {needed}")]
    CamfPayloadTooShort { needed: usize, available: usize },

    #[error("Plane {plane} claims {size} bytes at offset {offset}, only {available} available")]
    PlaneOverrun {
        plane: usize,
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("Row {row} starts at byte {offset}, past the {available} bytes of image data")]
    RowOffsetOutOfRange {
        row: usize,
        offset: usize,
        available: usize,
    },

    #[error("Plane {plane} is {columns}x{rows}, expected {expected_columns}x{expected_rows}")]
    PlaneGeometry {
        plane: usize,
        columns: usize,
        rows: usize,
        expected_columns: usize,
        expected_rows: usize,
    },

    #[error("Image section was already decoded")]
    AlreadyDecoded,
}

/// Metadata that parsed but does not have the shape a caller asked for.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No CAMF entry named '{0}'")]
    MissingEntry(String),

    #[error("CAMF entry '{name}' is not a {expected}")]
    WrongKind { name: String, expected: &'static str },

    #[error("Matrix '{name}' has {actual} elements, expected {expected}")]
    ElementCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Matrix '{name}' has dimensions {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        name: String,
        expected: Vec<u32>,
        actual: Vec<u32>,
    },

    #[error("Expected {expected} channels, found {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Buffer holds {actual} samples, geometry needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Rectangle [{x0},{y0},{x1},{y1}] is outside a {columns}x{rows} image")]
    RectOutOfBounds {
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        columns: usize,
        rows: usize,
    },
}

#[derive(Error, Debug)]
pub enum X3fError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Section {0:#010x} not found")]
    SectionNotFound(u32),

    #[error("Unsupported section type: {0:#010x}")]
    UnsupportedSection(u32),

    #[error("Section '{0}' is not loaded")]
    NotLoaded(&'static str),

    #[error("File contains no RAW image section")]
    NoRawImage,

    #[error("Failed to encode output image: {0}")]
    Encode(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, X3fError>;
