use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::x3f::bad_pixel::{collect_bad_pixels, interpolate_bad_pixels};
use crate::x3f::camf::Camf;
use crate::x3f::common::error::{Result, X3fError};
use crate::x3f::common::source::ByteSource;
use crate::x3f::container::Container;
use crate::x3f::conversions::options::DecodeOptions;
use crate::x3f::diagnostics::{Diagnostics, NoopDiagnostics, step};
use crate::x3f::image::{DecodedImage, ImageBuffer, PlaneLayout};
use crate::x3f::levels::black_level;
use crate::x3f::output::ProcessedImage;
use crate::x3f::quattro::{Denoiser, expand_quattro};

/// Turns an opened container into a finished image: decode, bad pixel
/// repair, Quattro expansion, crop and black level.
#[derive(Clone)]
pub struct RawDecoder {
    options: DecodeOptions,
    denoiser: Option<Arc<dyn Denoiser>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RawDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            denoiser: None,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    pub fn with_denoiser(mut self, denoiser: Arc<dyn Denoiser>) -> Self {
        self.denoiser = Some(denoiser);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DecodeOptions) {
        self.options = options;
    }

    #[instrument(skip_all, fields(file_size = container.file_size()))]
    pub fn decode<S: ByteSource>(&self, container: &Container<S>) -> Result<ProcessedImage> {
        let diagnostics = self.diagnostics.as_ref();

        step(diagnostics, "load_metadata", || self.load_metadata(container));
        let camf = container.camf();

        let decoded = step(diagnostics, "decode_raw", || Self::raw_pixels(container))?;
        let layout = decoded.layout;
        // The section keeps its pixels; copies are made only where a step
        // writes in place.
        let mut image = Cow::Borrowed(&decoded.image);
        let mut top_layer = decoded.top_layer.as_ref().map(Cow::Borrowed);
        self.validate_dimensions(&image)?;

        if self.options.fix_bad_pixels {
            if let Some(camf) = camf {
                step(diagnostics, "fix_bad_pixels", || {
                    self.fix_bad_pixels(camf, &mut image);
                    if let Some(top) = top_layer.as_mut() {
                        self.fix_bad_pixels(camf, top);
                    }
                });
            }
        }

        let black = self
            .options
            .subtract_black_level
            .then(|| black_level(&image, container));

        let mut expanded = false;
        if self.options.expand_quattro && layout == PlaneLayout::Quattro114 {
            if let Some(top) = top_layer.as_deref() {
                let active = camf.and_then(Camf::active_image_area);
                let denoiser = self
                    .denoiser
                    .as_deref()
                    .filter(|_| self.options.denoise);
                image = Cow::Owned(step(diagnostics, "expand_quattro", || {
                    expand_quattro(&image, top, active.as_ref(), denoiser)
                })?);
                expanded = true;
            }
        }

        if self.options.crop_to_active_area {
            match camf.and_then(Camf::active_image_area) {
                Some(area) => {
                    let rect = if layout == PlaneLayout::Quattro114 && !expanded {
                        area.halved()
                    } else {
                        area
                    };
                    image = Cow::Owned(step(diagnostics, "crop", || image.crop(&rect))?);
                }
                None => diagnostics.note("No active image area, image left uncropped"),
            }
        }

        if let Some(level) = black {
            step(diagnostics, "subtract_black_level", || {
                level.subtract_from(image.to_mut());
            });
            diagnostics.note(&format!(
                "Black level {:.1} {:.1} {:.1} from {} samples",
                level.level[0], level.level[1], level.level[2], level.samples
            ));
        }

        info!(
            width = image.width,
            height = image.height,
            channels = image.channels,
            expanded,
            "Decoded image"
        );
        Ok(ProcessedImage::from(image.into_owned()))
    }

    /// Pixels of the last RAW section, decoding it unless that already
    /// happened.
    fn raw_pixels<S: ByteSource>(container: &Container<S>) -> Result<&DecodedImage> {
        container.load_images()?;
        let section = container.raw_image()?;
        debug!(
            index = section.index(),
            codec = ?section.codec(),
            layout = ?section.layout(),
            "Decoding RAW section"
        );
        match section.decoded() {
            Some(decoded) => Ok(decoded),
            None => section.decode(),
        }
    }

    /// PROP is optional and CAMF failures only cost the metadata driven
    /// steps, so neither aborts the decode.
    fn load_metadata<S: ByteSource>(&self, container: &Container<S>) {
        match container.load_properties() {
            Ok(properties) => debug!(count = properties.len(), "Properties loaded"),
            Err(X3fError::SectionNotFound(_)) => debug!("No property section"),
            Err(e) => warn!(error = %e, "Failed to load properties"),
        }
        match container.load_camf() {
            Ok(camf) => debug!(entries = camf.len(), "CAMF loaded"),
            Err(X3fError::SectionNotFound(_)) => {
                self.diagnostics.note("No CAMF section");
            }
            Err(e) => {
                warn!(error = %e, "Failed to load CAMF");
                self.diagnostics.note(&format!("CAMF unavailable: {e}"));
            }
        }
    }

    fn fix_bad_pixels(&self, camf: &Camf, image: &mut Cow<'_, ImageBuffer>) {
        let bad = collect_bad_pixels(camf, image.width, image.height, image.channels);
        if bad.is_empty() {
            return;
        }
        let report = interpolate_bad_pixels(image.to_mut(), &bad);
        self.diagnostics.note(&format!(
            "{}-channel image: fixed {} of {} bad pixels in {} passes",
            image.channels,
            report.fixed,
            bad.len(),
            report.passes
        ));
    }

    fn validate_dimensions(&self, image: &ImageBuffer) -> Result<()> {
        if self.options.validate_dimensions && (image.width == 0 || image.height == 0) {
            return Err(X3fError::InvalidDimensions(image.width, image.height));
        }
        Ok(())
    }
}

impl Default for RawDecoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}
