use rayon::prelude::*;

use crate::x3f::common::error::DataError;
use crate::x3f::common::geometry::Rect;
use crate::x3f::image::ImageBuffer;

/// A rectangular window into an interleaved buffer owned by someone else.
///
/// Offsets and strides count samples, not pixels. A view never owns data;
/// every accessor takes the backing slice and checks the window against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaView {
    pub offset: usize,
    pub row_stride: usize,
    pub rows: usize,
    pub columns: usize,
    pub channels: usize,
}

impl AreaView {
    /// The whole of `image`.
    pub fn full(image: &ImageBuffer) -> Self {
        Self {
            offset: 0,
            row_stride: image.row_stride(),
            rows: image.height,
            columns: image.width,
            channels: image.channels,
        }
    }

    /// The inclusive rectangle `rect` of `image`.
    pub fn of_rect(image: &ImageBuffer, rect: &Rect) -> Result<Self, DataError> {
        if !rect.fits_within(image.width, image.height) {
            return Err(DataError::RectOutOfBounds {
                x0: rect.x0 as usize,
                y0: rect.y0 as usize,
                x1: rect.x1 as usize,
                y1: rect.y1 as usize,
                columns: image.width,
                rows: image.height,
            });
        }
        Ok(Self {
            offset: image.index(rect.x0 as usize, rect.y0 as usize),
            row_stride: image.row_stride(),
            rows: rect.rows() as usize,
            columns: rect.columns() as usize,
            channels: image.channels,
        })
    }

    pub fn row_len(&self) -> usize {
        self.columns * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Samples from `offset` to the end of the last row.
    pub fn span(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.rows - 1) * self.row_stride + self.row_len()
    }

    /// Checks that the view lies inside a buffer of `len` samples and that
    /// rows do not overlap.
    pub fn check(&self, len: usize) -> Result<(), DataError> {
        let required = self.offset + self.span();
        if (!self.is_empty() && self.row_stride < self.row_len()) || required > len {
            return Err(DataError::BufferSize {
                expected: required,
                actual: len,
            });
        }
        Ok(())
    }

    /// Sample index of channel 0 of pixel `(x, y)` within the view.
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.offset + y * self.row_stride + x * self.channels
    }

    pub fn row<'a>(&self, data: &'a [u16], y: usize) -> &'a [u16] {
        let start = self.index(0, y);
        &data[start..start + self.row_len()]
    }

    /// The backing samples starting at the view's first pixel, the layout
    /// a `Denoiser` expects.
    pub fn window_mut<'a>(&self, data: &'a mut [u16]) -> &'a mut [u16] {
        let end = (self.offset + self.span()).min(data.len());
        &mut data[self.offset.min(end)..end]
    }

    /// Runs `f` over every row of the view in parallel. Each slice holds
    /// exactly `columns * channels` samples.
    pub fn par_for_each_row<F>(&self, data: &mut [u16], f: F)
    where
        F: Fn(usize, &mut [u16]) + Sync + Send,
    {
        if self.is_empty() {
            return;
        }
        let width = self.row_len();
        self.window_mut(data)
            .par_chunks_mut(self.row_stride.max(1))
            .take(self.rows)
            .enumerate()
            .for_each(|(y, line)| {
                let end = width.min(line.len());
                f(y, &mut line[..end]);
            });
    }
}
