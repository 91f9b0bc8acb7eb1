//! Common utilities module
//!
//! Error taxonomy, positional byte sources and little-endian field helpers
//! shared by every section decoder.

pub mod bytes;
pub mod error;
pub mod geometry;
pub mod source;

#[cfg(test)]
mod tests;

pub use error::{DataError, DecodeError, FormatError, Result, X3fError};
pub use geometry::Rect;
pub use source::{ByteSource, FileSource};
