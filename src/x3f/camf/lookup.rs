use tracing::trace;

use crate::x3f::camf::Camf;
use crate::x3f::camf::entry::{CamfEntry, CamfValue, PropertyList};
use crate::x3f::camf::matrix::{Matrix, MatrixData};
use crate::x3f::common::error::DataError;
use crate::x3f::common::geometry::Rect;

/// Camera id of the sd Quattro.
pub const CAMERA_ID_SDQ: u32 = 15;
/// Camera id of the sd Quattro H.
pub const CAMERA_ID_SDQH: u32 = 16;

/// Maps the CAMF `WhiteBalance` code to its preset name.
pub fn white_balance_name(code: u32) -> &'static str {
    match code {
        2 => "Sunlight",
        3 => "Shadow",
        4 => "Overcast",
        5 => "Incandescent",
        6 => "Florescent",
        7 => "Flash",
        8 => "Custom",
        11 => "ColorTemp",
        12 => "AutoLSP",
        _ => "Auto",
    }
}

impl Camf {
    pub fn entry(&self, name: &str) -> Option<&CamfEntry> {
        self.entries().iter().find(|e| e.name == name)
    }

    fn matrices<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Matrix> + 'n
    where
        'a: 'n,
    {
        self.entries().iter().filter_map(move |e| match &e.value {
            CamfValue::Matrix(m) if e.name == name => Some(m),
            _ => None,
        })
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.entries().iter().find_map(|e| match &e.value {
            CamfValue::Text(t) if e.name == name => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn property_list(&self, name: &str) -> Option<&PropertyList> {
        self.entries().iter().find_map(|e| match &e.value {
            CamfValue::Properties(p) if e.name == name => Some(p),
            _ => None,
        })
    }

    /// Looks `name` up in every property list called `list`, in file order.
    pub fn property(&self, list: &str, name: &str) -> Option<&str> {
        self.entries()
            .iter()
            .filter_map(|e| match &e.value {
                CamfValue::Properties(p) if e.name == list => Some(p),
                _ => None,
            })
            .find_map(|p| p.get(name))
    }

    pub fn matrix(&self, name: &str) -> Option<&Matrix> {
        self.matrices(name).next()
    }

    /// Returns the matrix only if its dimensions match `dims`; a zero in
    /// `dims` accepts any size for that axis.
    pub fn matrix_with_dims(&self, name: &str, dims: &[u32]) -> Result<&Matrix, DataError> {
        let matrix = self
            .matrix(name)
            .ok_or_else(|| DataError::MissingEntry(name.to_string()))?;
        let actual = matrix.dim_sizes();
        let matches = actual.len() == dims.len()
            && actual.iter().zip(dims).all(|(&a, &e)| e == 0 || a == e);
        if !matches {
            return Err(DataError::DimensionMismatch {
                name: name.to_string(),
                expected: dims.to_vec(),
                actual,
            });
        }
        Ok(matrix)
    }

    pub fn u32_scalar(&self, name: &str) -> Option<u32> {
        self.matrices(name)
            .filter(|m| m.element_count() == 1)
            .find_map(|m| m.data.as_u32().map(|v| v[0]))
    }

    pub fn i32_scalar(&self, name: &str) -> Option<i32> {
        self.matrices(name)
            .filter(|m| m.element_count() == 1)
            .find_map(|m| m.data.as_i32().map(|v| v[0]))
    }

    pub fn f64_scalar(&self, name: &str) -> Option<f64> {
        self.matrices(name)
            .filter(|m| m.element_count() == 1)
            .find_map(|m| m.data.as_f64().map(|v| v[0]))
    }

    /// `expected == 0` accepts any length.
    pub fn u32_vector(&self, name: &str, expected: usize) -> Option<&[u32]> {
        self.matrices(name)
            .filter(|m| expected == 0 || m.element_count() == expected)
            .find_map(|m| m.data.as_u32())
    }

    pub fn i32_vector(&self, name: &str, expected: usize) -> Option<&[i32]> {
        self.matrices(name)
            .filter(|m| expected == 0 || m.element_count() == expected)
            .find_map(|m| m.data.as_i32())
    }

    pub fn f64_vector(&self, name: &str, expected: usize) -> Option<Vec<f64>> {
        self.matrices(name)
            .filter(|m| expected == 0 || m.element_count() == expected)
            .find_map(|m| m.data.as_f64())
    }

    /// A four-element integer matrix read as `[x0, y0, x1, y1]`.
    pub fn rect(&self, name: &str) -> Option<Rect> {
        let matrix = self.matrix(name)?;
        match &matrix.data {
            MatrixData::U32(v) => Rect::from_slice(v),
            MatrixData::I32(v) => {
                let values: Vec<u32> = v.iter().map(|&x| x.max(0) as u32).collect();
                Rect::from_slice(&values)
            }
            _ => None,
        }
    }

    /// `name` clipped to `KeepImageArea`, made relative to it and, when
    /// `rescale` is set, scaled from keep-area resolution to
    /// `width`x`height`.
    pub fn rect_scaled(&self, name: &str, width: u32, height: u32, rescale: bool) -> Option<Rect> {
        let rect = self.rect(name)?;
        let keep = self.rect("KeepImageArea")?;
        if !keep.is_valid() {
            return None;
        }
        if rect.x0 > keep.x1 || rect.y0 > keep.y1 || rect.x1 < keep.x0 || rect.y1 < keep.y0 {
            return None;
        }

        let mut out = Rect::new(
            rect.x0.max(keep.x0) - keep.x0,
            rect.y0.max(keep.y0) - keep.y0,
            rect.x1.min(keep.x1) - keep.x0,
            rect.y1.min(keep.y1) - keep.y0,
        );
        if rescale {
            let scale = |v: u32, size: u32, keep: u32| (u64::from(v) * u64::from(size) / u64::from(keep)) as u32;
            out = Rect::new(
                scale(out.x0, width, keep.columns()),
                scale(out.y0, height, keep.rows()),
                scale(out.x1, width, keep.columns()),
                scale(out.y1, height, keep.rows()),
            );
        }
        trace!(name, ?out, "Scaled CAMF rectangle");
        Some(out)
    }

    pub fn active_image_area(&self) -> Option<Rect> {
        self.u32_vector("ActiveImageArea", 4).and_then(Rect::from_slice)
    }

    pub fn camera_id(&self) -> Option<u32> {
        self.u32_scalar("CAMERAID")
    }

    /// TRUE-engine files carry both white balance property lists.
    pub fn is_true_engine(&self) -> bool {
        let has = |names: [&str; 2]| {
            self.entries().iter().any(|e| {
                matches!(e.value, CamfValue::Properties(_)) && names.contains(&e.name.as_str())
            })
        };
        has(["WhiteBalanceColorCorrections", "DP1_WhiteBalanceColorCorrections"])
            && has(["WhiteBalanceGains", "DP1_WhiteBalanceGains"])
    }

    /// Per-channel saturation value of the RAW data.
    pub fn max_raw(&self) -> Option<[u32; 3]> {
        if let Some(depth) = self.u32_scalar("ImageDepth") {
            let max = 1u32.checked_shl(depth).map_or(u32::MAX, |v| v - 1);
            return Some([max; 3]);
        }
        let field = if self.is_true_engine() {
            "RawSaturationLevel"
        } else {
            "SaturationLevel"
        };
        self.i32_vector(field, 3)
            .map(|v| [v[0] as u32, v[1] as u32, v[2] as u32])
    }

    pub fn white_balance_code(&self) -> Option<u32> {
        self.u32_scalar("WhiteBalance")
    }

    /// Resolves `wb` through the property list `list` to a matrix name and
    /// returns that matrix as `f64`. `Daylight` falls back to `Sunlight`.
    pub fn matrix_for_white_balance(&self, list: &str, wb: &str, dims: &[u32]) -> Option<Vec<f64>> {
        let Some(matrix_name) = self.property(list, wb) else {
            return if wb == "Daylight" {
                self.matrix_for_white_balance(list, "Sunlight", dims)
            } else {
                None
            };
        };
        self.matrix_with_dims(matrix_name, dims)
            .ok()
            .map(|m| m.data.to_f64_vec())
    }

    /// Sensor generation string, from a text entry or the `SensorID`
    /// property of any list.
    pub fn sensor_id(&self) -> Option<&str> {
        self.text("SensorID").or_else(|| {
            self.entries().iter().find_map(|e| match &e.value {
                CamfValue::Properties(p) => p.get("SensorID"),
                _ => None,
            })
        })
    }
}
