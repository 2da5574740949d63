//! Parity against reference transforms
//!
//! The engine's direct links should agree with moxcms within a few code
//! values, and with the safe `lcms2` bindings almost exactly.

use cmm_tests::reference::{transform_lcms2, transform_moxcms};
use cmm_tests::{TestPattern, convert_rgb8, generate_pattern, init_tracing, max_channel_diff, profiles};
use oxcmm_core::{LCMS_ENGINE, Profile, RenderingIntent, RenderingParams, SystemHost};

type ProfileFn = fn() -> anyhow::Result<Vec<u8>>;

const PAIRS: [(&str, ProfileFn, ProfileFn); 4] = [
    ("srgb->p3", profiles::srgb, profiles::display_p3),
    ("p3->srgb", profiles::display_p3, profiles::srgb),
    ("srgb->adobe", profiles::srgb, profiles::adobe_like),
    ("adobe->p3", profiles::adobe_like, profiles::display_p3),
];

const PATTERNS: [TestPattern; 4] = [
    TestPattern::GradientH,
    TestPattern::ColorCube,
    TestPattern::Grayscale,
    TestPattern::Random(42),
];

fn engine_convert(src_bytes: &[u8], dst_bytes: &[u8], intent: RenderingIntent, pixels: &[u8]) -> Vec<u8> {
    let instance = LCMS_ENGINE.new_instance(SystemHost::shared()).unwrap();
    let mut src = Profile::new(src_bytes);
    let mut dst = Profile::new(dst_bytes);
    LCMS_ENGINE.new_profile(&instance, &mut src).unwrap();
    LCMS_ENGINE.new_profile(&instance, &mut dst).unwrap();
    let rend = RenderingParams::new().with_intent(intent);
    let out = convert_rgb8(&LCMS_ENGINE, &instance, &rend, &src, None, &dst, pixels).unwrap();
    LCMS_ENGINE.drop_profile(&instance, &mut src);
    LCMS_ENGINE.drop_profile(&instance, &mut dst);
    out
}

#[test]
fn test_matches_moxcms() {
    init_tracing();
    for (name, src_fn, dst_fn) in PAIRS {
        let (src, dst) = (src_fn().unwrap(), dst_fn().unwrap());
        for pattern in PATTERNS {
            let input = generate_pattern(pattern, 64, 16);
            let ours = engine_convert(&src, &dst, RenderingIntent::RelativeColorimetric, &input);
            let theirs = transform_moxcms(&src, &dst, RenderingIntent::RelativeColorimetric, &input).unwrap();
            let diff = max_channel_diff(&ours, &theirs);
            assert!(diff <= 4, "{name} {pattern:?}: max channel difference {diff}");
        }
    }
}

#[test]
fn test_matches_lcms2_bindings() {
    init_tracing();
    for (name, src_fn, dst_fn) in PAIRS {
        let (src, dst) = (src_fn().unwrap(), dst_fn().unwrap());
        for intent in [RenderingIntent::Perceptual, RenderingIntent::RelativeColorimetric] {
            let input = generate_pattern(TestPattern::Random(7), 128, 8);
            let ours = engine_convert(&src, &dst, intent, &input);
            let theirs = transform_lcms2(&src, &dst, intent, &input).unwrap();
            let diff = max_channel_diff(&ours, &theirs);
            assert!(diff <= 1, "{name} {intent:?}: max channel difference {diff}");
        }
    }
}
