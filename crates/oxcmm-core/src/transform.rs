//! Pixel and color executor
//!
//! Applies a compiled [`RowTransform`] to a strided pixel buffer, one call
//! per row, or to a single fixed-width color sample.

use crate::backend::RowTransform;
use crate::pixmap::{Pixmap, PixmapMut, required_len};
use crate::{CmmError, Result};
use std::mem::size_of_val;

/// Maximum channels in a color sample
pub const MAX_COLORS: usize = 32;

/// One color, 16 bits per channel
pub type ColorSample = [u16; MAX_COLORS];

/// Transform `src` into `dst` row by row.
///
/// Both buffers must carry as many color channels (alpha excluded) as the
/// transform was compiled for. Each row is `src.width()` pixels; the source
/// and destination pointers advance by their own strides.
pub fn transform_pixmap_with<T: RowTransform + ?Sized>(xf: &T, dst: &mut PixmapMut<'_>, src: &Pixmap<'_>) -> Result<()> {
    let (input, output) = xf.formats();
    if input.channels() != src.color_channels() || output.channels() != dst.color_channels() {
        return Err(CmmError::ChannelMismatch {
            src_expected: input.channels(),
            src_actual: src.color_channels(),
            dst_expected: output.channels(),
            dst_actual: dst.color_channels(),
        });
    }
    if dst.width < src.width || dst.height < src.height {
        return Err(CmmError::DimensionMismatch {
            src_w: src.width,
            src_h: src.height,
            dst_w: dst.width,
            dst_h: dst.height,
        });
    }

    let (width, height) = (src.width, src.height);
    let src_row = width.checked_mul(input.bytes_per_pixel()).ok_or(CmmError::TooLarge)?;
    let dst_row = width.checked_mul(output.bytes_per_pixel()).ok_or(CmmError::TooLarge)?;
    check_capacity(height, src.stride, src_row, src.samples.len())?;
    check_capacity(height, dst.stride, dst_row, dst.samples.len())?;

    for k in 0..height {
        let s = k * src.stride;
        let d = k * dst.stride;
        xf.transform_row(&src.samples[s..s + src_row], &mut dst.samples[d..d + dst_row], width);
    }
    Ok(())
}

fn check_capacity(height: usize, stride: usize, row: usize, len: usize) -> Result<()> {
    if height > 1 && stride < row {
        return Err(CmmError::BufferTooSmall {
            expected: row,
            actual: stride,
        });
    }
    let expected = required_len(height, stride, row)?;
    if len < expected {
        return Err(CmmError::BufferTooSmall { expected, actual: len });
    }
    Ok(())
}

/// Transform exactly one color. The sample layout is the caller's
/// responsibility; no channel validation happens here.
pub fn transform_color_with<T: RowTransform + ?Sized>(xf: &T, dst: &mut ColorSample, src: &ColorSample) {
    xf.transform_row(sample_bytes(src), sample_bytes_mut(dst), 1);
}

fn sample_bytes(sample: &ColorSample) -> &[u8] {
    // SAFETY: u16 has no padding and u8 has alignment 1.
    unsafe { std::slice::from_raw_parts(sample.as_ptr().cast(), size_of_val(sample)) }
}

fn sample_bytes_mut(sample: &mut ColorSample) -> &mut [u8] {
    // SAFETY: as above; every byte pattern is a valid u16.
    unsafe { std::slice::from_raw_parts_mut(sample.as_mut_ptr().cast(), size_of_val(sample)) }
}
