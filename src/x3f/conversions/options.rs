/// What the decoder does after the RAW section is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fuse a Quattro 1:1:4 image with its top layer at full resolution
    pub expand_quattro: bool,
    /// Interpolate the bad pixels listed in CAMF
    pub fix_bad_pixels: bool,
    /// Crop to the CAMF active image area
    pub crop_to_active_area: bool,
    /// Reject empty images before handing them to the writer
    pub validate_dimensions: bool,
    /// Run the denoiser during Quattro expansion, if one is attached
    pub denoise: bool,
    /// Subtract the black level measured in the dark areas
    pub subtract_black_level: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            expand_quattro: true,
            fix_bad_pixels: true,
            crop_to_active_area: false,
            validate_dimensions: true,
            denoise: false,
            subtract_black_level: false,
        }
    }
}

impl DecodeOptions {
    pub fn builder() -> DecodeOptionsBuilder {
        DecodeOptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct DecodeOptionsBuilder {
    expand_quattro: Option<bool>,
    fix_bad_pixels: Option<bool>,
    crop_to_active_area: Option<bool>,
    validate_dimensions: Option<bool>,
    denoise: Option<bool>,
    subtract_black_level: Option<bool>,
}

impl DecodeOptionsBuilder {
    pub fn expand_quattro(mut self, enable: bool) -> Self {
        self.expand_quattro = Some(enable);
        self
    }

    pub fn fix_bad_pixels(mut self, enable: bool) -> Self {
        self.fix_bad_pixels = Some(enable);
        self
    }

    pub fn crop_to_active_area(mut self, enable: bool) -> Self {
        self.crop_to_active_area = Some(enable);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn denoise(mut self, enable: bool) -> Self {
        self.denoise = Some(enable);
        self
    }

    pub fn subtract_black_level(mut self, enable: bool) -> Self {
        self.subtract_black_level = Some(enable);
        self
    }

    pub fn build(self) -> DecodeOptions {
        let default = DecodeOptions::default();
        DecodeOptions {
            expand_quattro: self.expand_quattro.unwrap_or(default.expand_quattro),
            fix_bad_pixels: self.fix_bad_pixels.unwrap_or(default.fix_bad_pixels),
            crop_to_active_area: self
                .crop_to_active_area
                .unwrap_or(default.crop_to_active_area),
            validate_dimensions: self
                .validate_dimensions
                .unwrap_or(default.validate_dimensions),
            denoise: self.denoise.unwrap_or(default.denoise),
            subtract_black_level: self
                .subtract_black_level
                .unwrap_or(default.subtract_black_level),
        }
    }
}
