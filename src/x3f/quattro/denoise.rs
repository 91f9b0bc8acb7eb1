use tracing::debug;

use crate::x3f::camf::Camf;
use crate::x3f::common::error::DataError;
use crate::x3f::image::{ImageBuffer, ImageCodec};
use crate::x3f::quattro::area::AreaView;
use crate::x3f::quattro::transform::YuvTransform;

/// Pluggable noise filter over a YUV window.
///
/// `buffer` starts at the window's first sample; row `r` begins at
/// `r * row_stride`. `strength` holds one filter strength per channel.
pub trait Denoiser: Send + Sync {
    fn denoise(
        &self,
        buffer: &mut [u16],
        rows: usize,
        columns: usize,
        channels: usize,
        row_stride: usize,
        strength: [f32; 3],
    );
}

/// 3x3 median on the V channel with replicated borders. Luma and U are
/// left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromaMedianDenoiser;

impl Denoiser for ChromaMedianDenoiser {
    fn denoise(
        &self,
        buffer: &mut [u16],
        rows: usize,
        columns: usize,
        channels: usize,
        row_stride: usize,
        strength: [f32; 3],
    ) {
        if channels != 3 || strength[2] <= 0.0 || rows == 0 || columns == 0 {
            return;
        }
        let at = |x: usize, y: usize| y * row_stride + x * channels + 2;
        if at(columns - 1, rows - 1) >= buffer.len() {
            return;
        }

        let mut filtered = Vec::with_capacity(rows * columns);
        for y in 0..rows {
            for x in 0..columns {
                let mut window = [0u16; 9];
                for (k, slot) in window.iter_mut().enumerate() {
                    let nx = (x + k % 3).saturating_sub(1).min(columns - 1);
                    let ny = (y + k / 3).saturating_sub(1).min(rows - 1);
                    *slot = buffer[at(nx, ny)];
                }
                window.sort_unstable();
                filtered.push(window[4]);
            }
        }
        for y in 0..rows {
            for x in 0..columns {
                buffer[at(x, y)] = filtered[y * columns + x];
            }
        }
    }
}

/// Sensor-specific denoise settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenoiseProfile {
    Std,
    F20,
    F23,
}

impl DenoiseProfile {
    pub fn strength(self) -> f32 {
        match self {
            DenoiseProfile::Std => 100.0,
            DenoiseProfile::F20 => 70.0,
            DenoiseProfile::F23 => 300.0,
        }
    }

    pub fn transform(self) -> YuvTransform {
        match self {
            DenoiseProfile::Std => YuvTransform::Std,
            DenoiseProfile::F20 => YuvTransform::YisT,
            DenoiseProfile::F23 => YuvTransform::Yis4T,
        }
    }

    pub fn from_sensor_id(sensor_id: &str) -> Self {
        match sensor_id.trim() {
            "F20" => DenoiseProfile::F20,
            "F23" => DenoiseProfile::F23,
            _ => DenoiseProfile::Std,
        }
    }
}

/// Picks the profile from the CAMF sensor id, or from the codec when the
/// file carries none.
pub fn detect_profile(camf: Option<&Camf>, codec: ImageCodec) -> DenoiseProfile {
    if let Some(sensor_id) = camf.and_then(Camf::sensor_id) {
        return DenoiseProfile::from_sensor_id(sensor_id);
    }
    match codec {
        ImageCodec::Quattro => DenoiseProfile::F23,
        ImageCodec::True | ImageCodec::Merrill => DenoiseProfile::F20,
        ImageCodec::HuffmanX530 | ImageCodec::Huffman10Bit => DenoiseProfile::Std,
    }
}

/// Runs `denoiser` over `area` of a BMT image: forward transform, filter,
/// inverse transform.
pub fn denoise_area(
    image: &mut ImageBuffer,
    area: &AreaView,
    profile: DenoiseProfile,
    denoiser: &dyn Denoiser,
) -> Result<(), DataError> {
    let transform = profile.transform();
    transform.forward(&mut image.data, area)?;
    let h = profile.strength();
    debug!(?profile, rows = area.rows, columns = area.columns, "Denoising area");
    denoiser.denoise(
        area.window_mut(&mut image.data),
        area.rows,
        area.columns,
        area.channels,
        area.row_stride,
        [h, h, h],
    );
    transform.inverse(&mut image.data, area)
}
