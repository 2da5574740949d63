//! Transform link construction
//!
//! A [`Link`] is a compiled, directional conversion between a source and a
//! destination profile, optionally simulating a third proofing profile.
//! Which backend calls are made depends on how the proofing profile relates
//! to the endpoints:
//!
//! | proof             | backend calls                                     | intent        |
//! |-------------------|---------------------------------------------------|---------------|
//! | none              | `src -> dst`                                      | requested     |
//! | same as source    | `src -> dst`                                      | relative      |
//! | same as dest      | `src -> proof`                                    | requested     |
//! | distinct          | `src -> proof` as device link, then chained       | see below     |
//!
//! The distinct case never uses the backend's native three-profile proofing
//! path, which renders a known class of real-world documents wrongly.
//! Instead `src -> proof` is built at the requested intent, turned into a
//! device-link profile, and `[device link, proof, dst]` is chained at
//! relative colorimetric intent.

use crate::backend::{CmmHandle, LinkBackend, ProfileGuard, TransformGuard};
use crate::error::LinkStage;
use crate::format::PixelFormat;
use crate::params::{CmmFlags, LinkParams, RenderingIntent, RenderingParams};
use crate::profile::Profile;
use crate::{CmmError, Result};
use std::ptr;

/// Encoding version of the synthesized device-link profile
pub const DEVICE_LINK_VERSION: f64 = 3.4;

/// Compiled color conversion
///
/// Holds no reference to the profiles it was built from. Release it through
/// the instance that built it.
#[derive(Debug, Default)]
pub struct Link {
    handle: Option<CmmHandle>,
    owner: u64,
    depth: u8,
    alpha: bool,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend transform, if built
    pub fn handle(&self) -> Option<&CmmHandle> {
        self.handle.as_ref()
    }

    /// Id of the instance that built this link, 0 if empty
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Bytes per channel
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    pub fn is_built(&self) -> bool {
        self.handle.is_some()
    }

    /// Store a freshly built transform. For engine implementations.
    pub fn attach(&mut self, owner: u64, handle: CmmHandle, depth: u8, alpha: bool) {
        debug_assert!(self.handle.is_none(), "link already built");
        self.handle = Some(handle);
        self.owner = owner;
        self.depth = depth;
        self.alpha = alpha;
    }

    /// Take the transform out, leaving the link empty. For engine
    /// implementations.
    pub fn detach(&mut self) -> Option<CmmHandle> {
        self.owner = 0;
        self.handle.take()
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            tracing::warn!(?handle, "link dropped while built; backend handle leaked");
        }
    }
}

/// How the proofing profile relates to the endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTopology {
    /// No proofing profile
    Direct,
    /// Proofing profile is the source profile
    ProofIsSource,
    /// Proofing profile is the destination profile
    ProofIsDestination,
    /// Proofing profile is a distinct third space
    Proof,
}

impl LinkTopology {
    /// Classify by profile identity, not content.
    pub fn of(src: &Profile<'_>, prf: Option<&Profile<'_>>, dst: &Profile<'_>) -> Self {
        match prf {
            None => Self::Direct,
            Some(p) if ptr::eq(p, src) => Self::ProofIsSource,
            Some(p) if ptr::eq(p, dst) => Self::ProofIsDestination,
            Some(_) => Self::Proof,
        }
    }
}

fn open_handle<'p, B: LinkBackend + ?Sized>(backend: &B, profile: &'p Profile<'_>) -> Result<&'p CmmHandle> {
    let handle = profile.handle().ok_or(CmmError::InvalidProfile)?;
    if profile.owner() != backend.instance_id() {
        return Err(CmmError::ForeignHandle);
    }
    Ok(handle)
}

/// Pixel format matching a profile's device space.
fn device_format<B: LinkBackend + ?Sized>(backend: &B, profile: &CmmHandle, bytes: u8, extra: u32) -> PixelFormat {
    let space = backend.pixel_space(profile).max(0) as u32;
    let channels = backend.channels_of(profile);
    PixelFormat::new(space, channels, bytes as u32, extra)
}

/// Build `link` from `src` to `dst`, optionally proofed through `prf`.
///
/// Argument errors (depth, invalid or foreign profiles) leave `link`
/// untouched. Otherwise a handle already held by `link` is released first,
/// and on a backend failure `link` is left empty with every intermediate
/// object created by this call released.
pub fn build_link<B: LinkBackend + ?Sized>(
    backend: &B,
    link: &mut Link,
    rendering: &RenderingParams,
    params: &LinkParams,
    src: &Profile<'_>,
    prf: Option<&Profile<'_>>,
    dst: &Profile<'_>,
) -> Result<()> {
    let depth = params.bytes_per_channel;
    if !matches!(depth, 1 | 2) {
        return Err(CmmError::UnsupportedDepth(depth));
    }
    let src_handle = open_handle(backend, src)?;
    let dst_handle = open_handle(backend, dst)?;
    let prf_handle = prf.map(|p| open_handle(backend, p)).transpose()?;
    if link.is_built() && link.owner() != backend.instance_id() {
        return Err(CmmError::ForeignHandle);
    }

    release_link(backend, link);
    // Forget refusals from earlier, unrelated calls.
    backend.take_alloc_failure();

    let extra = params.alpha as u32;
    let src_format = device_format(backend, src_handle, depth, extra);
    let dst_format = device_format(backend, dst_handle, depth, extra);
    let flags = params.transform_flags(rendering);
    let topology = LinkTopology::of(src, prf, dst);

    tracing::debug!(?topology, ?src_format, ?dst_format, ?flags, intent = ?rendering.intent, "building link");

    let direct = |output: &CmmHandle, intent: RenderingIntent| {
        backend
            .create_transform(src_handle, src_format, output, dst_format, intent, flags)
            .ok_or_else(|| CmmError::link(LinkStage::Direct, backend.take_alloc_failure()))
    };

    let handle = match (topology, prf_handle) {
        (LinkTopology::Proof, Some(prf_handle)) => proof_chain(
            backend,
            rendering.intent,
            flags,
            depth,
            (src_handle, src_format),
            prf_handle,
            (dst_handle, dst_format),
        )?,
        (LinkTopology::ProofIsSource, _) => direct(dst_handle, RenderingIntent::RelativeColorimetric)?,
        (LinkTopology::ProofIsDestination, Some(prf_handle)) => direct(prf_handle, rendering.intent)?,
        _ => direct(dst_handle, rendering.intent)?,
    };

    tracing::debug!(?handle, "link built");
    link.attach(backend.instance_id(), handle, depth, params.alpha);
    Ok(())
}

/// `src -> proof` as a device link, chained with `proof -> dst`.
fn proof_chain<B: LinkBackend + ?Sized>(
    backend: &B,
    intent: RenderingIntent,
    flags: CmmFlags,
    depth: u8,
    (src, src_format): (&CmmHandle, PixelFormat),
    prf: &CmmHandle,
    (dst, dst_format): (&CmmHandle, PixelFormat),
) -> Result<CmmHandle> {
    // The intermediate carries color only. lcms2 refuses COPY_ALPHA between
    // formats whose extra channel counts differ, and the proof side has none.
    // Alpha is copied by the chained transform.
    let color_format = src_format.without_extra();
    let color_flags = flags.without(CmmFlags::COPY_ALPHA);
    let prf_format = device_format(backend, prf, depth, 0);
    let intermediate = backend
        .create_transform(src, color_format, prf, prf_format, intent, color_flags)
        .ok_or_else(|| CmmError::link(LinkStage::ProofIntermediate, backend.take_alloc_failure()))?;
    let intermediate = TransformGuard::new(backend, intermediate);

    let device_link = backend.transform_to_device_link(intermediate.handle(), DEVICE_LINK_VERSION, color_flags);
    drop(intermediate);
    let device_link = device_link
        .ok_or_else(|| CmmError::link(LinkStage::DeviceLink, backend.take_alloc_failure()))?;
    let device_link = ProfileGuard::new(backend, device_link);

    let chained = backend.create_multiprofile_transform(
        &[device_link.handle(), prf, dst],
        src_format,
        dst_format,
        RenderingIntent::RelativeColorimetric,
        flags,
    );
    drop(device_link);
    chained.ok_or_else(|| CmmError::link(LinkStage::ProofChain, backend.take_alloc_failure()))
}

/// Delete a link's transform through `backend`, if it has one.
pub fn release_link<B: LinkBackend + ?Sized>(backend: &B, link: &mut Link) {
    if link.handle.is_some() && link.owner != backend.instance_id() {
        tracing::warn!(owner = link.owner, "not releasing link built by another instance");
        return;
    }
    if let Some(handle) = link.detach() {
        tracing::debug!(?handle, "deleting link");
        backend.delete_transform(handle);
    }
}
