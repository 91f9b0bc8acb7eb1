//! Quattro sensor fusion
//!
//! Integer BMT/YUV transforms, bicubic upsampling and the fusion of the
//! low-resolution bottom/middle layers with the full-resolution top layer.
//! Denoising is delegated to a pluggable [`Denoiser`].

mod area;
mod denoise;
mod fusion;
mod resample;
mod transform;


pub use area::AreaView;
pub use denoise::{ChromaMedianDenoiser, DenoiseProfile, Denoiser, denoise_area, detect_profile};
pub use fusion::expand_quattro;
pub use resample::{bicubic_upscale, cubic_weight};
pub use transform::{O_UV, YuvTransform};
