//! Owned BGRA pixel buffer with the memory layout the classifier runtime
//! requires: 4 bytes per pixel in blue‑green‑red‑alpha order, 8 bits per
//! channel, premultiplied alpha, rows padded to a 64‑byte alignment, and a
//! bottom‑left origin (row 0 holds the *last* row of the drawn bitmap).

use crate::{PreprocessError, Result};
use image::RgbaImage;

pub const BYTES_PER_PIXEL: usize = 4;
pub const ROW_ALIGNMENT: usize = 64;

/// One frame's worth of BGRA pixels, created fresh per capture and consumed
/// by a single prediction call.  Dropping the buffer releases the memory.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes_per_row: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer.  Allocation failure is an error, not a
    /// crash: the caller drops the frame and carries on.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidDimensions { width, height });
        }

        let row = width as usize * BYTES_PER_PIXEL;
        let bytes_per_row = row.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        let len = bytes_per_row
            .checked_mul(height as usize)
            .ok_or(PreprocessError::Oversized(width, height))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);

        Ok(Self { width, height, bytes_per_row, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes, padded up to [`ROW_ALIGNMENT`].
    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// The `y`-th row, padding excluded.  Row 0 is the bottom of the drawn
    /// bitmap.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.bytes_per_row;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Whole plane including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take exclusive access for drawing.  The lock is released when the
    /// guard goes out of scope.
    pub fn lock(&mut self) -> LockedPixels<'_> {
        LockedPixels { buf: self }
    }
}

/// Exclusive access guard over a [`PixelBuffer`]'s memory.
pub struct LockedPixels<'a> {
    buf: &'a mut PixelBuffer,
}

impl LockedPixels<'_> {
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.buf.bytes_per_row;
        let width = self.buf.width as usize * BYTES_PER_PIXEL;
        &mut self.buf.data[start..start + width]
    }

    /// Draw an RGBA bitmap into the buffer, premultiplying alpha and
    /// flipping vertically: bitmap row `y` lands in buffer row `h - 1 - y`.
    pub fn draw_rgba(&mut self, bitmap: &RgbaImage) -> Result<()> {
        let (w, h) = (self.buf.width, self.buf.height);
        if bitmap.width() != w || bitmap.height() != h {
            return Err(PreprocessError::DimensionMismatch {
                want_w: w,
                want_h: h,
                got_w: bitmap.width(),
                got_h: bitmap.height(),
            });
        }

        for (y, row) in bitmap.rows().enumerate() {
            let dst = self.row_mut(h - 1 - y as u32);
            for (x, px) in row.enumerate() {
                let [r, g, b, a] = px.0;
                let base = x * BYTES_PER_PIXEL;
                dst[base] = premultiply(b, a);
                dst[base + 1] = premultiply(g, a);
                dst[base + 2] = premultiply(r, a);
                dst[base + 3] = a;
            }
        }
        Ok(())
    }
}

#[inline]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}
