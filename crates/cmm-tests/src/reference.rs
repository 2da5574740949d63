//! Reference implementation wrappers
//!
//! Independent transforms used to cross-check the engine: moxcms (pure
//! Rust) and the safe `lcms2` bindings over the same native library.

use anyhow::{Context, anyhow};
use oxcmm_core::RenderingIntent;

fn moxcms_intent(intent: RenderingIntent) -> moxcms::RenderingIntent {
    match intent {
        RenderingIntent::Perceptual => moxcms::RenderingIntent::Perceptual,
        RenderingIntent::RelativeColorimetric => moxcms::RenderingIntent::RelativeColorimetric,
        RenderingIntent::Saturation => moxcms::RenderingIntent::Saturation,
        RenderingIntent::AbsoluteColorimetric => moxcms::RenderingIntent::AbsoluteColorimetric,
    }
}

fn lcms2_intent(intent: RenderingIntent) -> lcms2::Intent {
    match intent {
        RenderingIntent::Perceptual => lcms2::Intent::Perceptual,
        RenderingIntent::RelativeColorimetric => lcms2::Intent::RelativeColorimetric,
        RenderingIntent::Saturation => lcms2::Intent::Saturation,
        RenderingIntent::AbsoluteColorimetric => lcms2::Intent::AbsoluteColorimetric,
    }
}

/// Transform packed RGB8 pixels with moxcms
pub fn transform_moxcms(
    src_profile_data: &[u8],
    dst_profile_data: &[u8],
    intent: RenderingIntent,
    src_pixels: &[u8],
) -> anyhow::Result<Vec<u8>> {
    use moxcms::{ColorProfile, Layout, TransformOptions};

    let src_profile =
        ColorProfile::new_from_slice(src_profile_data).map_err(|e| anyhow!("moxcms src profile: {e:?}"))?;
    let dst_profile =
        ColorProfile::new_from_slice(dst_profile_data).map_err(|e| anyhow!("moxcms dst profile: {e:?}"))?;

    let options = TransformOptions {
        rendering_intent: moxcms_intent(intent),
        ..TransformOptions::default()
    };
    let transform = src_profile
        .create_transform_8bit(Layout::Rgb, &dst_profile, Layout::Rgb, options)
        .map_err(|e| anyhow!("moxcms transform: {e:?}"))?;

    let mut dst_pixels = vec![0u8; src_pixels.len()];
    transform
        .transform(src_pixels, &mut dst_pixels)
        .map_err(|e| anyhow!("moxcms execute: {e:?}"))?;
    Ok(dst_pixels)
}

/// Transform packed RGB8 pixels with the `lcms2` crate
pub fn transform_lcms2(
    src_profile_data: &[u8],
    dst_profile_data: &[u8],
    intent: RenderingIntent,
    src_pixels: &[u8],
) -> anyhow::Result<Vec<u8>> {
    use lcms2::{PixelFormat, Profile, Transform};

    let src_profile = Profile::new_icc(src_profile_data).context("lcms2 src profile")?;
    let dst_profile = Profile::new_icc(dst_profile_data).context("lcms2 dst profile")?;

    let transform = Transform::new(
        &src_profile,
        PixelFormat::RGB_8,
        &dst_profile,
        PixelFormat::RGB_8,
        lcms2_intent(intent),
    )
    .context("lcms2 transform")?;

    let mut dst_pixels = vec![0u8; src_pixels.len()];
    transform.transform_pixels(src_pixels, &mut dst_pixels);
    Ok(dst_pixels)
}
