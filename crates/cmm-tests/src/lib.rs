//! # cmm-tests
//!
//! Integration testing framework for oxcmm.
//!
//! This crate provides:
//! - ICC fixture profiles generated through the `lcms2` crate
//! - A counting host for allocator accounting and warning capture
//! - A fault-injecting link backend for failure-path tests
//! - Test patterns and strided buffer helpers
//! - moxcms reference transforms for parity checks
//!
//! ## Test Categories
//!
//! 1. **Lifecycle**: profile open/close balance, malformed input
//! 2. **Topology**: direct, proof equal to source or destination
//! 3. **Proof chain**: manual device-link path and its cleanup
//! 4. **Executor**: strides, depths, alpha, single colors
//! 5. **Parallelism**: one instance per worker
//! 6. **Parity**: agreement with moxcms

pub mod fault;
pub mod host;
pub mod patterns;
pub mod profiles;
pub mod reference;

pub use fault::{BackendCall, FaultInjector};
pub use host::CountingHost;
pub use patterns::{TestPattern, generate_pattern, max_channel_diff, strided};

use oxcmm_core::{CmmEngine, Instance, Link, LinkParams, Pixmap, PixmapMut, Profile, RenderingParams};

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Convert a tightly packed 8-bit buffer through `src -> dst` (optionally
/// proofed) and release everything again.
pub fn convert_rgb8(
    engine: &CmmEngine,
    instance: &Instance,
    rendering: &RenderingParams,
    src: &Profile<'_>,
    prf: Option<&Profile<'_>>,
    dst: &Profile<'_>,
    pixels: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let mut link = Link::new();
    engine.new_link(instance, &mut link, rendering, &LinkParams::new(1), src, prf, dst)?;

    let width = pixels.len() / 3;
    let mut out = vec![0u8; width * 3];
    let result = Pixmap::new(width, 1, width * 3, 3, false, pixels).and_then(|s| {
        let mut d = PixmapMut::new(width, 1, width * 3, 3, false, &mut out)?;
        engine.transform_pixmap(instance, &link, &mut d, &s)
    });
    engine.drop_link(instance, &mut link);
    result?;
    Ok(out)
}
