//! Rendering and link parameters
//!
//! Per-link configuration supplied by the caller's color-space model.

use oxcmm_lcms_sys as sys;
use std::ops::{BitOr, BitOrAssign};

/// Rendering intent for color conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingIntent {
    /// Perceptual - best for photos, maintains relative appearance
    #[default]
    Perceptual,
    /// Relative colorimetric - preserves in-gamut colors exactly
    RelativeColorimetric,
    /// Saturation - maintains saturation, good for business graphics
    Saturation,
    /// Absolute colorimetric - preserves white point
    AbsoluteColorimetric,
}

impl RenderingIntent {
    /// Convert from ICC rendering intent value
    pub fn from_icc(value: u32) -> Self {
        match value {
            0 => Self::Perceptual,
            1 => Self::RelativeColorimetric,
            2 => Self::Saturation,
            3 => Self::AbsoluteColorimetric,
            _ => Self::Perceptual,
        }
    }

    /// Convert to ICC rendering intent value
    ///
    /// lcms2 takes the ICC codes unchanged.
    pub fn to_icc(self) -> u32 {
        match self {
            Self::Perceptual => 0,
            Self::RelativeColorimetric => 1,
            Self::Saturation => 2,
            Self::AbsoluteColorimetric => 3,
        }
    }
}

/// Backend transform flag word
///
/// Bits follow the lcms2 `cmsFLAGS_*` encoding. Engines over other
/// libraries map the bits they understand and ignore the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CmmFlags(pub u32);

impl CmmFlags {
    pub const NONE: Self = Self(0);
    /// Skip the automatic white-on-white correction
    pub const NO_WHITE_ON_WHITE_FIXUP: Self = Self(sys::FLAGS_NOWHITEONWHITEFIXUP);
    pub const NO_CACHE: Self = Self(sys::FLAGS_NOCACHE);
    pub const NO_OPTIMIZE: Self = Self(sys::FLAGS_NOOPTIMIZE);
    pub const HIGH_RES_PRECALC: Self = Self(sys::FLAGS_HIGHRESPRECALC);
    /// Baseline optimization for every link
    pub const LOW_RES_PRECALC: Self = Self(sys::FLAGS_LOWRESPRECALC);
    pub const BLACK_POINT_COMPENSATION: Self = Self(sys::FLAGS_BLACKPOINTCOMPENSATION);
    /// Pass extra channels through untransformed
    pub const COPY_ALPHA: Self = Self(sys::FLAGS_COPY_ALPHA);

    /// Raw flag bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Copy with every bit of `other` cleared
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for CmmFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CmmFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Intent and black-point handling requested for one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderingParams {
    /// Rendering intent
    pub intent: RenderingIntent,
    /// Use black point compensation
    pub black_point_compensation: bool,
}

impl RenderingParams {
    /// Perceptual intent, no black point compensation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rendering intent
    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Enable black point compensation
    pub fn with_bpc(mut self) -> Self {
        self.black_point_compensation = true;
        self
    }
}

/// Sample layout and engine flags for one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    /// Caller-supplied engine flags
    pub cmm_flags: CmmFlags,
    /// Bytes per channel, 1 or 2
    pub bytes_per_channel: u8,
    /// Buffers carry one trailing alpha channel
    pub alpha: bool,
}

impl LinkParams {
    /// No alpha, no extra flags
    pub fn new(bytes_per_channel: u8) -> Self {
        Self {
            cmm_flags: CmmFlags::NONE,
            bytes_per_channel,
            alpha: false,
        }
    }

    /// Set alpha presence
    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    /// Add engine flags
    pub fn with_flags(mut self, flags: CmmFlags) -> Self {
        self.cmm_flags |= flags;
        self
    }

    /// Flag word for a link: the baseline precalc flag plus caller flags,
    /// black point compensation and alpha copy as requested.
    pub fn transform_flags(&self, rendering: &RenderingParams) -> CmmFlags {
        let mut flags = CmmFlags::LOW_RES_PRECALC | self.cmm_flags;
        if rendering.black_point_compensation {
            flags |= CmmFlags::BLACK_POINT_COMPENSATION;
        }
        if self.alpha {
            flags |= CmmFlags::COPY_ALPHA;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_intent_roundtrip() {
        for i in 0..4 {
            let intent = RenderingIntent::from_icc(i);
            assert_eq!(intent.to_icc(), i);
        }
    }

    #[test]
    fn test_rendering_params_builder() {
        let rend = RenderingParams::new()
            .with_intent(RenderingIntent::Saturation)
            .with_bpc();
        assert_eq!(rend.intent, RenderingIntent::Saturation);
        assert!(rend.black_point_compensation);
    }

    #[test]
    fn test_flag_assembly() {
        let rend = RenderingParams::new();
        let plain = LinkParams::new(1).transform_flags(&rend);
        assert_eq!(plain, CmmFlags::LOW_RES_PRECALC);

        let all = LinkParams::new(2)
            .with_alpha(true)
            .with_flags(CmmFlags::NO_WHITE_ON_WHITE_FIXUP)
            .transform_flags(&rend.with_bpc());
        assert!(all.contains(CmmFlags::LOW_RES_PRECALC));
        assert!(all.contains(CmmFlags::NO_WHITE_ON_WHITE_FIXUP));
        assert!(all.contains(CmmFlags::BLACK_POINT_COMPENSATION));
        assert!(all.contains(CmmFlags::COPY_ALPHA));
        assert!(!all.contains(CmmFlags::NO_CACHE));

        let no_alpha = all.without(CmmFlags::COPY_ALPHA);
        assert!(!no_alpha.contains(CmmFlags::COPY_ALPHA));
        assert_eq!(no_alpha | CmmFlags::COPY_ALPHA, all);
    }
}
