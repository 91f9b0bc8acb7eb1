use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::x3f::bad_pixel::collect::{BadPixel, BadPixelSet};
use crate::x3f::image::ImageBuffer;

/// Outcome of `interpolate_bad_pixels`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpolationReport {
    pub passes: usize,
    pub fixed: usize,
    pub unfixable: usize,
}

#[derive(Debug, Default)]
struct PassStats {
    all_four: usize,
    linear: usize,
    corner: usize,
    left: usize,
}

/// Replaces bad pixels with the rounded mean of their valid orthogonal
/// neighbours, repeating until nothing is left or nothing changes.
///
/// A pixel needs all four neighbours, or a complete horizontal or vertical
/// pair. Once a pass makes no progress any two valid neighbours are
/// accepted, and that stays so for the remaining passes. Neighbours
/// outside the image count as bad. Validity is taken from the set at the
/// start of each pass.
pub fn interpolate_bad_pixels(image: &mut ImageBuffer, bad: &BadPixelSet) -> InterpolationReport {
    let mut report = InterpolationReport::default();
    let (width, height, channels) = (image.width, image.height, image.channels);
    let mut remaining: BTreeSet<BadPixel> = bad
        .iter()
        .filter(|p| p.col < width && p.row < height)
        .copied()
        .collect();
    if remaining.is_empty() || channels == 0 {
        return report;
    }

    let mut relaxed = false;
    while !remaining.is_empty() {
        let is_valid = |col: Option<usize>, row: Option<usize>| match (col, row) {
            (Some(c), Some(r)) if c < width && r < height => {
                !remaining.contains(&BadPixel { row: r, col: c })
            }
            _ => false,
        };

        let mut stats = PassStats::default();
        let mut fixed = Vec::new();
        for pixel in &remaining {
            let (col, row) = (pixel.col, pixel.row);
            let neighbours = [
                (col.checked_sub(1), Some(row)),
                (col.checked_add(1), Some(row)),
                (Some(col), row.checked_sub(1)),
                (Some(col), row.checked_add(1)),
            ];
            let valid = neighbours.map(|(c, r)| is_valid(c, r));
            let count = valid.iter().filter(|&&v| v).count();

            let use_mask = if count == 4 {
                stats.all_four += 1;
                valid
            } else if valid[0] && valid[1] {
                stats.linear += 1;
                [true, true, false, false]
            } else if valid[2] && valid[3] {
                stats.linear += 1;
                [false, false, true, true]
            } else if relaxed && count == 2 {
                stats.corner += 1;
                valid
            } else {
                stats.left += 1;
                continue;
            };

            let used = use_mask.iter().filter(|&&v| v).count() as u32;
            let target = image.index(col, row);
            for c in 0..channels {
                let sum: u32 = neighbours
                    .iter()
                    .zip(use_mask)
                    .filter(|&(_, used)| used)
                    .filter_map(|(&(nc, nr), _)| Some(image.index(nc?, nr?)))
                    .map(|idx| u32::from(image.data[idx + c]))
                    .sum();
                image.data[target + c] = ((sum + used / 2) / used) as u16;
            }
            fixed.push(*pixel);
        }

        debug!(
            pass = report.passes,
            fixed = fixed.len(),
            all_four = stats.all_four,
            linear = stats.linear,
            corner = stats.corner,
            left = stats.left,
            "Bad pixel pass"
        );
        report.passes += 1;

        if fixed.is_empty() {
            if relaxed {
                report.unfixable = remaining.len();
                warn!(count = remaining.len(), "Failed to interpolate bad pixels");
                break;
            }
            relaxed = true;
        }
        report.fixed += fixed.len();
        for pixel in &fixed {
            remaining.remove(pixel);
        }
    }
    report
}
