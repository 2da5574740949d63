//! One instance per worker
//!
//! Instances are not shared across threads; each rayon worker creates its
//! own, opens its own profiles and must reproduce the single-threaded
//! result exactly.

use cmm_tests::{CountingHost, TestPattern, convert_rgb8, generate_pattern, init_tracing, profiles};
use oxcmm_core::{HostContext, LCMS_ENGINE, Profile, RenderingParams, SystemHost};
use rayon::prelude::*;
use std::sync::Arc;

fn convert_on_fresh_instance(
    host: Arc<dyn HostContext>,
    src_bytes: &[u8],
    prf_bytes: Option<&[u8]>,
    dst_bytes: &[u8],
    pixels: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let instance = LCMS_ENGINE.new_instance(host)?;
    let mut src = Profile::new(src_bytes);
    let mut dst = Profile::new(dst_bytes);
    let mut prf = prf_bytes.map(Profile::new);
    LCMS_ENGINE.new_profile(&instance, &mut src)?;
    LCMS_ENGINE.new_profile(&instance, &mut dst)?;
    if let Some(prf) = prf.as_mut() {
        LCMS_ENGINE.new_profile(&instance, prf)?;
    }

    let out = convert_rgb8(
        &LCMS_ENGINE,
        &instance,
        &RenderingParams::new(),
        &src,
        prf.as_ref(),
        &dst,
        pixels,
    );

    LCMS_ENGINE.drop_profile(&instance, &mut src);
    LCMS_ENGINE.drop_profile(&instance, &mut dst);
    if let Some(prf) = prf.as_mut() {
        LCMS_ENGINE.drop_profile(&instance, prf);
    }
    LCMS_ENGINE.drop_instance(Some(instance));
    out
}

#[test]
fn test_parallel_workers_match_serial() {
    init_tracing();
    let src = profiles::srgb().unwrap();
    let dst = profiles::display_p3().unwrap();
    let inputs: Vec<Vec<u8>> = (0..16)
        .map(|seed| generate_pattern(TestPattern::Random(seed), 64, 4))
        .collect();

    let serial: Vec<Vec<u8>> = inputs
        .iter()
        .map(|px| convert_on_fresh_instance(SystemHost::shared(), &src, None, &dst, px).unwrap())
        .collect();

    let parallel: Vec<Vec<u8>> = inputs
        .par_iter()
        .map(|px| convert_on_fresh_instance(SystemHost::shared(), &src, None, &dst, px))
        .collect::<anyhow::Result<_>>()
        .unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn test_parallel_proofing_with_shared_host() {
    init_tracing();
    let host = CountingHost::shared();
    let src = profiles::adobe_like().unwrap();
    let prf = profiles::narrow_rgb().unwrap();
    let dst = profiles::srgb().unwrap();
    let pixels = generate_pattern(TestPattern::ColorCube, 8, 8);

    let expected = convert_on_fresh_instance(host.clone(), &src, Some(&prf), &dst, &pixels).unwrap();
    let results: Vec<Vec<u8>> = (0..32)
        .into_par_iter()
        .map(|_| convert_on_fresh_instance(host.clone(), &src, Some(&prf), &dst, &pixels))
        .collect::<anyhow::Result<_>>()
        .unwrap();

    assert!(results.iter().all(|r| *r == expected));
    assert_eq!(host.live(), 0, "every worker released its allocations");
}
