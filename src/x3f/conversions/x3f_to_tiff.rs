use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, info_span, instrument};

use crate::x3f::common::error::Result;
use crate::x3f::common::source::ByteSource;
use crate::x3f::container::Container;
use crate::x3f::conversions::decode::RawDecoder;
use crate::x3f::conversions::options::DecodeOptions;
use crate::x3f::diagnostics::Diagnostics;
use crate::x3f::output::{ImageWriter, OutputConfig, ProcessedImage, StandardTiffWriter};
use crate::x3f::quattro::Denoiser;

/// X3F in, image file out.
pub struct RawPipeline<W: ImageWriter> {
    decoder: RawDecoder,
    writer: W,
    config: OutputConfig,
}

impl RawPipeline<StandardTiffWriter> {
    pub fn new(options: DecodeOptions, config: OutputConfig) -> Self {
        Self {
            decoder: RawDecoder::new(options),
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<W: ImageWriter> RawPipeline<W> {
    pub fn with_custom(writer: W, options: DecodeOptions, config: OutputConfig) -> Self {
        Self {
            decoder: RawDecoder::new(options),
            writer,
            config,
        }
    }

    pub fn with_denoiser(mut self, denoiser: Arc<dyn Denoiser>) -> Self {
        self.decoder = self.decoder.with_denoiser(denoiser);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.decoder = self.decoder.with_diagnostics(diagnostics);
        self
    }

    pub fn decoder(&self) -> &RawDecoder {
        &self.decoder
    }

    /// Decodes an in-memory file and writes it to `output`.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<ProcessedImage> {
        info!("Starting X3F conversion");
        let container = {
            let _span = info_span!("open").entered();
            Container::from_source(Arc::<[u8]>::from(input_data))?
        };
        self.convert_container(&container, output)
    }

    /// Decodes an opened container and writes it to `output`.
    pub fn convert_container<S: ByteSource>(
        &self,
        container: &Container<S>,
        output: &mut dyn Write,
    ) -> Result<ProcessedImage> {
        let image = self.decoder.decode(container)?;
        {
            let _span = info_span!("encode", width = image.width, height = image.height).entered();
            self.writer.write_image(&image, output, &self.config)?;
        }
        info!(
            width = image.width,
            height = image.height,
            channels = image.channels,
            "Conversion complete"
        );
        Ok(image)
    }

    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<ProcessedImage> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let container = {
            let _span = info_span!("open_input_file").entered();
            Container::open(input_path)?
        };
        let mut output_file = {
            let _span = info_span!("create_output_file").entered();
            std::fs::File::create(output_path)?
        };
        let image = self.convert_container(&container, &mut output_file)?;
        output_file.flush()?;
        Ok(image)
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OutputConfig) {
        self.config = config;
    }

    pub fn options(&self) -> &DecodeOptions {
        self.decoder.options()
    }

    pub fn set_options(&mut self, options: DecodeOptions) {
        self.decoder.set_options(options);
    }
}
