use rayon::prelude::*;

use crate::x3f::image::ImageBuffer;

/// Catmull-Rom kernel (`a = -0.5`).
pub fn cubic_weight(x: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        1.5 * x * x * x - 2.5 * x * x + 1.0
    } else if x < 2.0 {
        -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
    } else {
        0.0
    }
}

/// Resamples `src` to `dst_width` x `dst_height` with a 4x4 bicubic
/// kernel. Source coordinates are pixel-centre aligned and clamp at the
/// borders; results are truncated to the 16-bit range.
pub fn bicubic_upscale(src: &ImageBuffer, dst_width: usize, dst_height: usize) -> ImageBuffer {
    let channels = src.channels;
    let mut dst = ImageBuffer::new(dst_width, dst_height, channels);
    if src.width == 0 || src.height == 0 || dst_width == 0 || channels == 0 {
        return dst;
    }

    let scale_x = src.width as f64 / dst_width as f64;
    let scale_y = src.height as f64 / dst_height as f64;
    let max_x = src.width as isize - 1;
    let max_y = src.height as isize - 1;

    dst.data
        .par_chunks_mut(dst_width * channels)
        .enumerate()
        .for_each(|(dst_y, line)| {
            let src_yf = (dst_y as f64 + 0.5) * scale_y;
            let y0 = src_yf as isize;
            let fy = src_yf - y0 as f64;
            let wy: [f64; 4] = std::array::from_fn(|j| cubic_weight(j as f64 - 1.0 - fy));

            for dst_x in 0..dst_width {
                let src_xf = (dst_x as f64 + 0.5) * scale_x;
                let x0 = src_xf as isize;
                let fx = src_xf - x0 as f64;
                let wx: [f64; 4] = std::array::from_fn(|i| cubic_weight(i as f64 - 1.0 - fx));

                for c in 0..channels {
                    let mut sum = 0.0;
                    let mut weight_sum = 0.0;
                    for (j, wy) in wy.iter().enumerate() {
                        let sy = (y0 + j as isize - 1).clamp(0, max_y) as usize;
                        for (i, wx) in wx.iter().enumerate() {
                            let sx = (x0 + i as isize - 1).clamp(0, max_x) as usize;
                            let weight = wx * wy;
                            sum += f64::from(src.data[(sy * src.width + sx) * channels + c]) * weight;
                            weight_sum += weight;
                        }
                    }
                    let value = if weight_sum != 0.0 { sum / weight_sum } else { sum };
                    line[dst_x * channels + c] = value.clamp(0.0, 65535.0) as u16;
                }
            }
        });
    dst
}
