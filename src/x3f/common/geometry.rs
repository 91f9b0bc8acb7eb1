/// Inclusive pixel rectangle `[x0, y0] ..= [x1, y1]`, the convention CAMF
/// uses for every area it stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_slice(values: &[u32]) -> Option<Self> {
        match values {
            [x0, y0, x1, y1] => Some(Self::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    pub fn columns(&self) -> u32 {
        self.x1.saturating_sub(self.x0) + 1
    }

    pub fn rows(&self) -> u32 {
        self.y1.saturating_sub(self.y0) + 1
    }

    pub fn is_valid(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    pub fn fits_within(&self, columns: usize, rows: usize) -> bool {
        self.is_valid() && (self.x1 as usize) < columns && (self.y1 as usize) < rows
    }

    /// Halves every coordinate, mapping a full-resolution area onto a
    /// half-resolution image.
    pub fn halved(&self) -> Self {
        Self::new(self.x0 / 2, self.y0 / 2, self.x1 / 2, self.y1 / 2)
    }

    /// Doubles the rectangle onto a 2x image, clamped to `columns`x`rows`.
    pub fn doubled_within(&self, columns: usize, rows: usize) -> Option<Self> {
        if columns == 0 || rows == 0 {
            return None;
        }
        let max_x = columns as u32 - 1;
        let max_y = rows as u32 - 1;
        let rect = Self::new(
            self.x0.saturating_mul(2).min(max_x),
            self.y0.saturating_mul(2).min(max_y),
            self.x1.saturating_mul(2).saturating_add(1).min(max_x),
            self.y1.saturating_mul(2).saturating_add(1).min(max_y),
        );
        rect.is_valid().then_some(rect)
    }
}
