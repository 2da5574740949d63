//! ICC fixture profiles
//!
//! Every fixture is serialized to ICC bytes by the `lcms2` crate, so tests
//! exercise the same byte-stream path a host would use.

use anyhow::Context;
use lcms2::{CIExyY, CIExyYTRIPLE, Profile, ToneCurve};

const D50: CIExyY = CIExyY {
    x: 0.3457,
    y: 0.3585,
    Y: 1.0,
};

const D65: CIExyY = CIExyY {
    x: 0.3127,
    y: 0.3290,
    Y: 1.0,
};

fn primaries(r: (f64, f64), g: (f64, f64), b: (f64, f64)) -> CIExyYTRIPLE {
    CIExyYTRIPLE {
        Red: CIExyY { x: r.0, y: r.1, Y: 1.0 },
        Green: CIExyY { x: g.0, y: g.1, Y: 1.0 },
        Blue: CIExyY { x: b.0, y: b.1, Y: 1.0 },
    }
}

fn srgb_curve() -> anyhow::Result<ToneCurve> {
    ToneCurve::new_parametric(4, &[2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045])
        .context("sRGB tone curve")
}

fn rgb_icc(white: &CIExyY, prims: &CIExyYTRIPLE, curve: &ToneCurve) -> anyhow::Result<Vec<u8>> {
    let profile = Profile::new_rgb(white, prims, &[curve, curve, curve]).context("RGB profile creation")?;
    profile.icc().context("ICC serialization")
}

/// Built-in lcms2 sRGB
pub fn srgb() -> anyhow::Result<Vec<u8>> {
    Profile::new_srgb().icc().context("sRGB serialization")
}

/// Display P3 primaries with the sRGB transfer curve
pub fn display_p3() -> anyhow::Result<Vec<u8>> {
    let prims = primaries((0.680, 0.320), (0.265, 0.690), (0.150, 0.060));
    rgb_icc(&D65, &prims, &srgb_curve()?)
}

/// Adobe RGB (1998)-like: wide green primary, pure 2.2 gamma
pub fn adobe_like() -> anyhow::Result<Vec<u8>> {
    let prims = primaries((0.640, 0.330), (0.210, 0.710), (0.150, 0.060));
    rgb_icc(&D65, &prims, &ToneCurve::new(2.2))
}

/// Narrow-gamut RGB with a 1.8 gamma, useful as a proofing space that
/// visibly differs from both endpoints
pub fn narrow_rgb() -> anyhow::Result<Vec<u8>> {
    let prims = primaries((0.600, 0.340), (0.320, 0.540), (0.160, 0.090));
    rgb_icc(&D50, &prims, &ToneCurve::new(1.8))
}

/// Gray with a 2.2 gamma
pub fn gray() -> anyhow::Result<Vec<u8>> {
    let profile = Profile::new_gray(&D50, &ToneCurve::new(2.2)).context("gray profile creation")?;
    profile.icc().context("ICC serialization")
}

/// Bytes that are not an ICC profile
pub fn garbage() -> Vec<u8> {
    (0..512u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect()
}

/// A valid profile cut short inside its tag table
pub fn truncated() -> anyhow::Result<Vec<u8>> {
    let mut bytes = srgb()?;
    bytes.truncate(140);
    Ok(bytes)
}
