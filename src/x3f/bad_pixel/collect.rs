use std::collections::BTreeSet;

use tracing::debug;

use crate::x3f::camf::{CAMERA_ID_SDQ, CAMERA_ID_SDQH, Camf};

/// One defective sensor position. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BadPixel {
    pub row: usize,
    pub col: usize,
}

/// De-duplicated bad pixels inside a `width` x `height` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadPixelSet {
    width: usize,
    height: usize,
    pixels: BTreeSet<BadPixel>,
}

impl BadPixelSet {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: BTreeSet::new(),
        }
    }

    /// Adds `(col, row)` if it lies inside the frame. Returns whether the
    /// pixel was new.
    pub fn insert(&mut self, col: i64, row: i64) -> bool {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return false;
        }
        self.pixels.insert(BadPixel {
            row: row as usize,
            col: col as usize,
        })
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        self.pixels.contains(&BadPixel { row, col })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BadPixel> {
        self.pixels.iter()
    }
}

/// Autofocus sensor rows and columns that read as defects on the sd
/// Quattro bodies. Ranges are inclusive; each hit marks a `size` block.
#[derive(Debug, Clone, Copy)]
struct AfGrid {
    col_first: i64,
    col_last: i64,
    col_pitch: i64,
    col_size: i64,
    row_first: i64,
    row_last: i64,
    row_pitch: i64,
    row_size: i64,
}

impl AfGrid {
    const fn new(col: [i64; 4], row: [i64; 4]) -> Self {
        Self {
            col_first: col[0],
            col_last: col[1],
            col_pitch: col[2],
            col_size: col[3],
            row_first: row[0],
            row_last: row[1],
            row_pitch: row[2],
            row_size: row[3],
        }
    }

    fn for_camera(camera_id: u32, channels: usize) -> Option<Self> {
        let top_layer = channels == 1;
        match (camera_id, top_layer) {
            (CAMERA_ID_SDQ, true) => Some(Self::new([217, 5641, 16, 1], [464, 3312, 32, 2])),
            (CAMERA_ID_SDQ, false) => Some(Self::new([108, 2820, 8, 1], [232, 1656, 16, 1])),
            (CAMERA_ID_SDQH, true) => Some(Self::new([233, 6425, 16, 1], [592, 3888, 32, 2])),
            (CAMERA_ID_SDQH, false) => Some(Self::new([116, 2820, 8, 1], [296, 1944, 16, 1])),
            _ => None,
        }
    }

    fn mark(&self, set: &mut BadPixelSet) {
        for row in (self.row_first..=self.row_last).step_by(self.row_pitch as usize) {
            for col in (self.col_first..=self.col_last).step_by(self.col_pitch as usize) {
                for r in 0..self.row_size {
                    for c in 0..self.col_size {
                        set.insert(col + c, row + r);
                    }
                }
            }
        }
    }
}

/// Gathers bad pixels for an image of `width` x `height` with `channels`
/// channels from every CAMF source that applies. Three-channel images use
/// the packed list, the two swapped-coordinate tables, the highlight grid
/// and the chroma table; the single-channel Quattro top layer uses the
/// luma table. Both get the AF grid on sd Quattro bodies.
pub fn collect_bad_pixels(camf: &Camf, width: usize, height: usize, channels: usize) -> BadPixelSet {
    let mut set = BadPixelSet::new(width, height);

    if channels == 3 {
        if let (Some(keep), Some(packed)) = (
            camf.u32_vector("KeepImageArea", 4),
            camf.u32_vector("BadPixels", 0),
        ) {
            let (x0, y0) = (i64::from(keep[0]), i64::from(keep[1]));
            for &value in packed {
                let col = i64::from((value & 0x000f_ff00) >> 8) - x0;
                let row = i64::from((value & 0xfff0_0000) >> 20) - y0;
                set.insert(col, row);
            }
        }

        // These tables store (row, col, _) triples.
        for name in ["BadPixelsF20", "Jpeg_BadClusters"] {
            let Some(matrix) = camf.matrix(name) else {
                continue;
            };
            let dims = matrix.dim_sizes();
            if dims.len() != 2 || dims[0] != 3 {
                continue;
            }
            if let Some(values) = matrix.data.as_u32() {
                for triple in values.chunks_exact(3).take(dims[1] as usize) {
                    set.insert(i64::from(triple[1]), i64::from(triple[0]));
                }
            }
        }

        if let Some(info) = camf
            .matrix_with_dims("HighlightPixelsInfo", &[2, 2])
            .ok()
            .and_then(|m| m.data.as_u32())
        {
            let [start_col, start_row, pitch_col, pitch_row] = [info[0], info[1], info[2], info[3]]
                .map(|v| v as usize);
            if pitch_col > 0 && pitch_row > 0 {
                for row in (start_row..height).step_by(pitch_row) {
                    for col in (start_col..width).step_by(pitch_col) {
                        set.insert(col as i64, row as i64);
                    }
                }
            } else {
                debug!("HighlightPixelsInfo has a zero pitch, skipping");
            }
        }
    }

    let table = if channels == 1 {
        "BadPixelsLumaF23"
    } else {
        "BadPixelsChromaF23"
    };
    if let Some(values) = camf.u32_vector(table, 0) {
        mark_run_table(values, &mut set);
    }

    if let Some(grid) = camf
        .camera_id()
        .and_then(|id| AfGrid::for_camera(id, channels))
    {
        debug!("Marking AF grid as bad pixels");
        grid.mark(&mut set);
    }

    debug!(count = set.len(), channels, "Collected bad pixels");
    set
}

/// `row, col, col, ..., 0` groups, repeated.
fn mark_run_table(values: &[u32], set: &mut BadPixelSet) {
    let mut row: Option<u32> = None;
    for &value in values {
        match row {
            None => row = Some(value),
            Some(_) if value == 0 => row = None,
            Some(r) => {
                set.insert(i64::from(value), i64::from(r));
            }
        }
    }
}
