//! Borrowed pixel buffer views
//!
//! Row-major, strided sample storage owned by the caller. Geometry is
//! validated at construction at one byte per channel; the executor checks
//! again against the real per-pixel size of the link it applies.

use crate::{CmmError, Result};

/// Minimum storage length for a strided image of `row_bytes`-wide rows.
pub(crate) fn required_len(height: usize, stride: usize, row_bytes: usize) -> Result<usize> {
    if height == 0 {
        return Ok(0);
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(CmmError::TooLarge)
}

fn validate(width: usize, height: usize, stride: usize, n: usize, len: usize) -> Result<()> {
    let row = width.checked_mul(n).ok_or(CmmError::TooLarge)?;
    if stride < row {
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

/// Read-only source pixels
#[derive(Debug, Clone, Copy)]
pub struct Pixmap<'a> {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) stride: usize,
    pub(crate) n: usize,
    pub(crate) alpha: bool,
    pub(crate) samples: &'a [u8],
}

impl<'a> Pixmap<'a> {
    /// `n` counts every channel including alpha; `stride` is in bytes.
    pub fn new(width: usize, height: usize, stride: usize, n: usize, alpha: bool, samples: &'a [u8]) -> Result<Self> {
        validate(width, height, stride, n, samples.len())?;
        Ok(Self {
            width,
            height,
            stride,
            n,
            alpha,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    /// Channels excluding alpha
    pub fn color_channels(&self) -> usize {
        self.n.saturating_sub(self.alpha as usize)
    }

    pub fn samples(&self) -> &'a [u8] {
        self.samples
    }
}

/// Writable destination pixels
#[derive(Debug)]
pub struct PixmapMut<'a> {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) stride: usize,
    pub(crate) n: usize,
    pub(crate) alpha: bool,
    pub(crate) samples: &'a mut [u8],
}

impl<'a> PixmapMut<'a> {
    /// Same layout rules as [`Pixmap::new`].
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        n: usize,
        alpha: bool,
        samples: &'a mut [u8],
    ) -> Result<Self> {
        validate(width, height, stride, n, samples.len())?;
        Ok(Self {
            width,
            height,
            stride,
            n,
            alpha,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    /// Channels excluding alpha
    pub fn color_channels(&self) -> usize {
        self.n.saturating_sub(self.alpha as usize)
    }

    pub fn samples(&self) -> &[u8] {
        self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        self.samples
    }

    /// Read-only view of the same pixels
    pub fn as_pixmap(&self) -> Pixmap<'_> {
        Pixmap {
            width: self.width,
            height: self.height,
            stride: self.stride,
            n: self.n,
            alpha: self.alpha,
            samples: self.samples,
        }
    }
}
