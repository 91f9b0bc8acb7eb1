//! Black level from the masked dark-shield areas


use rayon::prelude::*;
use tracing::debug;

use crate::x3f::camf::{CAMERA_ID_SDQH, Camf};
use crate::x3f::common::geometry::Rect;
use crate::x3f::common::source::ByteSource;
use crate::x3f::container::Container;
use crate::x3f::image::ImageBuffer;

/// Per-channel mean and standard deviation of the dark areas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlackLevel {
    pub level: [f64; 3],
    pub deviation: [f64; 3],
    pub samples: u64,
}

impl BlackLevel {
    /// Subtracts the rounded level from every pixel of a three-channel
    /// image, clamping at zero.
    pub fn subtract_from(&self, image: &mut ImageBuffer) {
        if image.channels != 3 || self.samples == 0 {
            return;
        }
        let offset = self.level.map(|l| l.round().clamp(0.0, f64::from(u16::MAX)) as u16);
        image.data.par_chunks_exact_mut(3).for_each(|pixel| {
            for (value, &black) in pixel.iter_mut().zip(&offset) {
                *value = value.saturating_sub(black);
            }
        });
    }
}

/// Dark areas of an image of `width` x `height`, in image coordinates.
pub fn dark_areas(camf: &Camf, model: Option<&str>, width: u32, height: u32) -> Vec<(&'static str, Rect)> {
    let mut areas = Vec::new();
    if let Some(rect) = camf.rect_scaled("DarkShieldTop", width, height, true) {
        areas.push(("DarkShieldTop", rect));
    }

    let skip_bottom =
        model == Some("SIGMA DP2") || camf.camera_id() == Some(CAMERA_ID_SDQH);
    if skip_bottom {
        debug!(?model, "Skipping DarkShieldBottom");
    } else if let Some(rect) = camf.rect_scaled("DarkShieldBottom", width, height, true) {
        areas.push(("DarkShieldBottom", rect));
    }

    let ranges = camf
        .matrix_with_dims("DarkShieldColRange", &[2, 2])
        .ok()
        .and_then(|m| m.data.as_u32());
    if let (Some(range), Some(keep)) = (ranges, camf.rect("KeepImageArea")) {
        let keep_columns = u64::from(keep.columns());
        let scale = |v: u32| (u64::from(v) * u64::from(width) / keep_columns) as u32;
        let bottom = height.saturating_sub(1);
        areas.push(("Left", Rect::new(scale(range[0]), 0, scale(range[1]), bottom)));
        areas.push(("Right", Rect::new(scale(range[2]), 0, scale(range[3]), bottom)));
    }
    areas
}

/// Mean and deviation over `areas` of a three-channel image. Areas are
/// clipped to the image; overlapping areas count twice.
pub fn measure(image: &ImageBuffer, areas: &[(&'static str, Rect)]) -> BlackLevel {
    let mut result = BlackLevel::default();
    if image.channels != 3 || areas.is_empty() {
        return result;
    }

    let pixels = || {
        areas.iter().flat_map(|(_, rect)| {
            let x1 = (rect.x1 as usize).min(image.width.saturating_sub(1));
            let y1 = (rect.y1 as usize).min(image.height.saturating_sub(1));
            let (x0, y0) = (rect.x0 as usize, rect.y0 as usize);
            (y0..=y1)
                .filter(move |_| image.width > 0 && image.height > 0)
                .flat_map(move |y| (x0..=x1).map(move |x| image.pixel(x, y)))
        })
    };

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels() {
        for (total, &value) in sum.iter_mut().zip(pixel) {
            *total += u64::from(value);
        }
        count += 1;
    }
    if count == 0 {
        return result;
    }
    result.samples = count;
    result.level = sum.map(|s| s as f64 / count as f64);

    let mut squares = [0f64; 3];
    for pixel in pixels() {
        for c in 0..3 {
            let diff = f64::from(pixel[c]) - result.level[c];
            squares[c] += diff * diff;
        }
    }
    result.deviation = squares.map(|s| (s / count as f64).sqrt());
    result
}

/// Black level of `image` from the loaded CAMF of `container`. Zero when
/// CAMF is not loaded or names no dark area.
pub fn black_level<S: ByteSource>(image: &ImageBuffer, container: &Container<S>) -> BlackLevel {
    let Some(camf) = container.camf() else {
        debug!("CAMF not loaded, black level is zero");
        return BlackLevel::default();
    };
    let areas = dark_areas(
        camf,
        container.property("CAMMODEL"),
        image.width as u32,
        image.height as u32,
    );
    let level = measure(image, &areas);
    debug!(
        areas = areas.len(),
        level = ?level.level,
        deviation = ?level.deviation,
        "Black level"
    );
    level
}
