//! camlabel‑preprocess – resize captured stills and convert them into the
//! BGRA pixel‑buffer layout the classifier runtime consumes.
//!
//! Two stages, matching what the runtime expects:
//!
//! 1. [`resize_exact`] – linear resample to the model's spatial dimensions.
//!    No aspect‑ratio preservation; the caller picks the ratio.
//! 2. [`PixelBuffer`] – a fresh 32‑bit BGRA buffer per frame, premultiplied
//!    alpha, 64‑byte row alignment, vertically flipped (the runtime's origin
//!    is bottom‑left, the decoded image's is top‑left).
//!
//! Every allocation step is fallible and surfaces as [`PreprocessError`];
//! callers treat a per‑frame failure as "skip this frame", never as fatal.

use image::{DynamicImage, RgbImage};
use resize::{Pixel, Type};
use rgb::FromSlice;
use thiserror::Error;

mod pixelbuffer;
pub use pixelbuffer::{LockedPixels, PixelBuffer, BYTES_PER_PIXEL, ROW_ALIGNMENT};

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("resample failed: {0}")]
    Resize(#[from] resize::Error),
    #[error("pixel buffer allocation failed: {0}")]
    Alloc(#[from] std::collections::TryReserveError),
    #[error("pixel buffer {0}x{1} does not fit in memory")]
    Oversized(u32, u32),
    #[error("bitmap is {got_w}x{got_h}, buffer expects {want_w}x{want_h}")]
    DimensionMismatch { want_w: u32, want_h: u32, got_w: u32, got_h: u32 },
    #[error("resized bitmap container could not be rebuilt")]
    BufferCreate,
}

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Resize-then-convert front end for a fixed model input size.
#[derive(Clone)]
pub struct Preprocessor {
    dst_w: u32,
    dst_h: u32,
}

impl Preprocessor {
    /// Create a pre‑processor that outputs WxH BGRA pixel buffers.
    pub fn new(dst_w: u32, dst_h: u32) -> Self {
        Self { dst_w, dst_h }
    }

    /// Resize `image` to the target dimensions and convert it into the
    /// runtime's pixel layout.  Deterministic: identical inputs produce
    /// byte-identical buffers.
    pub fn run(&self, image: &DynamicImage) -> Result<PixelBuffer> {
        let rgb = image.to_rgb8();
        let resized = resize_exact(&rgb, self.dst_w, self.dst_h)?;
        let rgba = DynamicImage::ImageRgb8(resized).to_rgba8();

        let mut buf = PixelBuffer::new(self.dst_w, self.dst_h)?;
        buf.lock().draw_rgba(&rgba)?;
        Ok(buf)
    }
}

/// Resample `src` to exactly `dst_w` × `dst_h` with a linear (Triangle)
/// filter.  Zero target dimensions are rejected up front so callers can drop
/// the frame instead of feeding the scaler a degenerate context.
pub fn resize_exact(src: &RgbImage, dst_w: u32, dst_h: u32) -> Result<RgbImage> {
    if dst_w == 0 || dst_h == 0 {
        return Err(PreprocessError::InvalidDimensions { width: dst_w, height: dst_h });
    }

    let mut dst = vec![0u8; dst_w as usize * dst_h as usize * 3];

    let mut resizer = resize::new(
        src.width() as usize,
        src.height() as usize,
        dst_w as usize,
        dst_h as usize,
        Pixel::RGB8,
        Type::Triangle,
    )?;

    resizer.resize(src.as_raw().as_rgb(), dst.as_rgb_mut())?;

    RgbImage::from_raw(dst_w, dst_h, dst).ok_or(PreprocessError::BufferCreate)
}
