use tracing::trace;

use crate::x3f::common::error::DataError;
use crate::x3f::quattro::area::AreaView;

/// Offset added to U and V so negative chroma survives the trip through
/// unsigned samples.
pub const O_UV: i32 = 32768;

/// Reversible integer BMT/YUV transforms. All three share
/// `U = 2B - 2T` and `V = B - 2M + T` and differ in luma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YuvTransform {
    /// `Y = (B + M + T) / 3`
    Std,
    /// `Y = T`
    YisT,
    /// `Y = 4T`, leaving headroom for a top layer scaled by four.
    Yis4T,
}

fn clamp_u16(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

impl YuvTransform {
    pub fn forward_pixel(self, bmt: [u16; 3]) -> [u16; 3] {
        let [b, m, t] = bmt.map(i32::from);
        let y = match self {
            YuvTransform::Std => (b + m + t + 1) / 3,
            YuvTransform::YisT => t,
            YuvTransform::Yis4T => 4 * t,
        };
        let u = 2 * b - 2 * t;
        let v = b - 2 * m + t;
        [clamp_u16(y), clamp_u16(u + O_UV), clamp_u16(v + O_UV)]
    }

    pub fn inverse_pixel(self, yuv: [u16; 3]) -> [u16; 3] {
        let y = i32::from(yuv[0]);
        let u = i32::from(yuv[1]) - O_UV;
        let v = i32::from(yuv[2]) - O_UV;
        let (b, m, t) = match self {
            YuvTransform::Std => (
                (12 * y + 3 * u + 2 * v + 6) / 12,
                (3 * y - v + 1) / 3,
                (12 * y - 3 * u + 2 * v + 6) / 12,
            ),
            YuvTransform::YisT => ((2 * y + u + 1) / 2, (4 * y + u - 2 * v + 2) / 4, y),
            YuvTransform::Yis4T => (
                (y + 2 * u + 2) / 4,
                (y + u - 2 * v + 2) / 4,
                (y + 2) / 4,
            ),
        };
        [clamp_u16(b), clamp_u16(m), clamp_u16(t)]
    }

    /// Converts the pixels of `area` from BMT to YUV in place.
    pub fn forward(self, data: &mut [u16], area: &AreaView) -> Result<(), DataError> {
        self.apply(data, area, |p| self.forward_pixel(p))
    }

    /// Converts the pixels of `area` from YUV back to BMT in place.
    pub fn inverse(self, data: &mut [u16], area: &AreaView) -> Result<(), DataError> {
        self.apply(data, area, |p| self.inverse_pixel(p))
    }

    fn apply<F>(self, data: &mut [u16], area: &AreaView, op: F) -> Result<(), DataError>
    where
        F: Fn([u16; 3]) -> [u16; 3] + Sync + Send,
    {
        if area.channels != 3 {
            return Err(DataError::ChannelMismatch {
                expected: 3,
                actual: area.channels,
            });
        }
        area.check(data.len())?;
        trace!(transform = ?self, rows = area.rows, columns = area.columns, "YUV transform");
        area.par_for_each_row(data, |_, line| {
            for pixel in line.chunks_exact_mut(3) {
                let out = op([pixel[0], pixel[1], pixel[2]]);
                pixel.copy_from_slice(&out);
            }
        });
        Ok(())
    }
}
