use std::fmt;

use crate::x3f::container::tags;

/// Section kinds the container knows how to load. Wrapped (`SEC*`) and bare
/// tags of the same section map to the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Properties,
    Camf,
    Image,
    Unsupported(u32),
}

impl SectionKind {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            tags::SECP | tags::PROP => SectionKind::Properties,
            tags::SECC | tags::CAMF => SectionKind::Camf,
            tags::SECI | tags::IMAG | tags::IMA2 => SectionKind::Image,
            other => SectionKind::Unsupported(other),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, SectionKind::Unsupported(_))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Properties => f.write_str("properties"),
            SectionKind::Camf => f.write_str("CAMF"),
            SectionKind::Image => f.write_str("image"),
            SectionKind::Unsupported(tag) => write!(f, "unsupported ({})", tags::fourcc(*tag)),
        }
    }
}
