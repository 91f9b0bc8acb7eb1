use std::io::Write;

use crate::x3f::common::error::Result;
use crate::x3f::output::types::{OutputConfig, ProcessedImage};

pub trait ImageWriter {
    fn write_image(
        &self,
        image: &ProcessedImage,
        output: &mut dyn Write,
        config: &OutputConfig,
    ) -> Result<()>;
}
