//! Packed pixel-format descriptors
//!
//! A format word describes how one pixel of a caller buffer is laid out:
//! backend color-space code, color channel count, bytes per channel and
//! number of extra (alpha) channels, packed the way the backend expects it.

use oxcmm_lcms_sys as sys;
use std::fmt;

/// Packed pixel layout passed to the backend
///
/// The word uses the lcms2 `TYPE_*` encoding: color space in bits 16 to 20,
/// extra channels in bits 7 to 9, channel count in bits 3 to 6 and bytes per
/// channel in bits 0 to 2. Other engines translate from this encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// Pack a format word.
    pub const fn new(space: u32, channels: u32, bytes: u32, extra: u32) -> Self {
        Self(sys::COLORSPACE_SH(space) | sys::CHANNELS_SH(channels) | sys::BYTES_SH(bytes) | sys::EXTRA_SH(extra))
    }

    /// Backend color-space code
    pub const fn space(self) -> u32 {
        sys::T_COLORSPACE(self.0)
    }

    /// Color channels, excluding extra channels
    pub const fn channels(self) -> usize {
        sys::T_CHANNELS(self.0) as usize
    }

    /// Extra (alpha) channels
    pub const fn extra(self) -> usize {
        sys::T_EXTRA(self.0) as usize
    }

    /// Bytes per channel
    pub const fn bytes(self) -> usize {
        sys::T_BYTES(self.0) as usize
    }

    /// Same layout with the extra channels removed
    pub const fn without_extra(self) -> Self {
        Self::new(self.space(), self.channels() as u32, self.bytes() as u32, 0)
    }

    /// Bytes occupied by one pixel
    pub const fn bytes_per_pixel(self) -> usize {
        (self.channels() + self.extra()) * self.bytes()
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelFormat")
            .field("space", &self.space())
            .field("channels", &self.channels())
            .field("extra", &self.extra())
            .field("bytes", &self.bytes())
            .finish()
    }
}
