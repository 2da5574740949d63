//! # oxcmm - pluggable color management engine
//!
//! A fixed contract that lets an image or document pipeline run ICC-based
//! color conversions without hard-coding a transform backend, plus a
//! Little CMS 2 implementation of it.
//!
//! ## Model
//!
//! - An [`Instance`] is created once per host context and routes every
//!   backend allocation and diagnostic through the host's [`HostContext`].
//! - [`Profile`]s are opened from ICC bytes.
//! - A [`Link`] is built from a source, an optional proofing and a
//!   destination profile (see [`build_link`] for the topology rules).
//! - Links are applied to strided pixel buffers or to single colors.
//!
//! Every `new_*` call is paired with exactly one `drop_*` call through the
//! same instance. Instances are not `Send`; parallel workers each create
//! their own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oxcmm_core::{CmmRegistry, Link, LinkParams, Pixmap, PixmapMut, Profile, RenderingParams, SystemHost};
//!
//! # fn main() -> oxcmm_core::Result<()> {
//! # let icc: Vec<u8> = Vec::new();
//! let engine = CmmRegistry::with_default_engines().get("lcms2")?;
//! let instance = engine.new_instance(SystemHost::shared())?;
//!
//! let mut profile = Profile::new(&icc);
//! engine.new_profile(&instance, &mut profile)?;
//!
//! let mut link = Link::new();
//! let params = LinkParams::new(1);
//! engine.new_link(&instance, &mut link, &RenderingParams::new(), &params, &profile, None, &profile)?;
//!
//! let src = [255u8, 128, 64];
//! let mut dst = [0u8; 3];
//! let s = Pixmap::new(1, 1, 3, 3, false, &src)?;
//! let mut d = PixmapMut::new(1, 1, 3, 3, false, &mut dst)?;
//! engine.transform_pixmap(&instance, &link, &mut d, &s)?;
//!
//! engine.drop_link(&instance, &mut link);
//! engine.drop_profile(&instance, &mut profile);
//! engine.drop_instance(Some(instance));
//! # Ok(())
//! # }
//! ```

pub mod alloc;
pub mod backend;
pub mod engine;
pub mod error;
pub mod format;
pub mod host;
pub mod instance;
pub mod lcms;
pub mod link;
pub mod params;
pub mod pixmap;
pub mod profile;
pub mod transform;

#[cfg(test)]
mod mock;

pub use backend::{CmmHandle, LinkBackend, ProfileGuard, RowTransform, TransformGuard};
pub use engine::{CmmEngine, CmmRegistry};
pub use error::{CmmError, LinkStage, Result};
pub use format::PixelFormat;
pub use host::{HostContext, SystemHost};
pub use instance::{Instance, InstanceState};
pub use lcms::{LCMS_ENGINE, LcmsBackend};
pub use link::{DEVICE_LINK_VERSION, Link, LinkTopology, build_link, release_link};
pub use params::{CmmFlags, LinkParams, RenderingIntent, RenderingParams};
pub use pixmap::{Pixmap, PixmapMut};
pub use profile::{Profile, release_profile};
pub use transform::{ColorSample, MAX_COLORS, transform_color_with, transform_pixmap_with};

/// Version of oxcmm
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
