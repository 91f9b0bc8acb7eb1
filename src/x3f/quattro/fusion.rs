use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::x3f::common::error::DataError;
use crate::x3f::common::geometry::Rect;
use crate::x3f::image::ImageBuffer;
use crate::x3f::quattro::area::AreaView;
use crate::x3f::quattro::denoise::{DenoiseProfile, Denoiser};
use crate::x3f::quattro::resample::bicubic_upscale;
use crate::x3f::quattro::transform::YuvTransform;

const FUSION: YuvTransform = YuvTransform::Yis4T;

/// Fuses a low-resolution BMT image with its full-resolution top layer
/// into a BMT image of twice the size.
///
/// `active` is the active area in expanded coordinates. With a denoiser,
/// the halved area is filtered before upsampling and the expanded area
/// after fusion, with V at double strength. Without `active` the whole
/// frame is filtered.
pub fn expand_quattro(
    image: &ImageBuffer,
    top: &ImageBuffer,
    active: Option<&Rect>,
    denoiser: Option<&dyn Denoiser>,
) -> Result<ImageBuffer, DataError> {
    if image.channels != 3 {
        return Err(DataError::ChannelMismatch {
            expected: 3,
            actual: image.channels,
        });
    }
    if top.channels != 1 {
        return Err(DataError::ChannelMismatch {
            expected: 1,
            actual: top.channels,
        });
    }
    let (width, height) = (image.width * 2, image.height * 2);
    debug!(
        low = format_args!("{}x{}", image.width, image.height),
        top = format_args!("{}x{}", top.width, top.height),
        expanded = format_args!("{}x{}", width, height),
        "Expanding Quattro image"
    );

    let mut yuv = image.clone();
    let area = AreaView::full(&yuv);
    FUSION.forward(&mut yuv.data, &area)?;

    let h = DenoiseProfile::F23.strength();
    if let Some(denoiser) = denoiser {
        let _span = info_span!("denoise_low_resolution").entered();
        let view = filter_area(&yuv, active.map(Rect::halved));
        denoiser.denoise(
            view.window_mut(&mut yuv.data),
            view.rows,
            view.columns,
            view.channels,
            view.row_stride,
            [h, h, h],
        );
    }

    let mut expanded = {
        let _span = info_span!("bicubic_upscale").entered();
        bicubic_upscale(&yuv, width, height)
    };
    overwrite_luma(&mut expanded, top);

    if let Some(denoiser) = denoiser {
        let _span = info_span!("denoise_full_resolution").entered();
        let view = filter_area(&expanded, active.copied());
        denoiser.denoise(
            view.window_mut(&mut expanded.data),
            view.rows,
            view.columns,
            view.channels,
            view.row_stride,
            [h, h, 2.0 * h],
        );
    }

    let area = AreaView::full(&expanded);
    FUSION.inverse(&mut expanded.data, &area)?;
    Ok(expanded)
}

fn filter_area(image: &ImageBuffer, rect: Option<Rect>) -> AreaView {
    rect.and_then(|r| match AreaView::of_rect(image, &r) {
        Ok(view) => Some(view),
        Err(e) => {
            debug!(error = %e, "Active area outside the image, filtering the whole frame");
            None
        }
    })
    .unwrap_or_else(|| AreaView::full(image))
}

/// Replaces Y with `4 * top` wherever the top layer covers the frame,
/// aligned at the top-left corner.
fn overwrite_luma(expanded: &mut ImageBuffer, top: &ImageBuffer) {
    let width = expanded.width;
    if width == 0 {
        return;
    }
    let columns = width.min(top.width);
    expanded
        .data
        .par_chunks_mut(width * 3)
        .take(top.height)
        .enumerate()
        .for_each(|(y, line)| {
            let top_row = &top.data[y * top.width..y * top.width + columns];
            for (pixel, &t) in line.chunks_exact_mut(3).zip(top_row) {
                pixel[0] = (u32::from(t) * 4).min(u32::from(u16::MAX)) as u16;
            }
        });
}
