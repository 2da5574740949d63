//! Engine descriptor and registry
//!
//! A [`CmmEngine`] is a static table of the operations a color management
//! backend provides. Hosts register the engines they ship with a
//! [`CmmRegistry`] at startup and pick one by name.

use crate::host::HostContext;
use crate::instance::Instance;
use crate::link::Link;
use crate::params::{CmmFlags, LinkParams, RenderingParams};
use crate::pixmap::{Pixmap, PixmapMut};
use crate::profile::Profile;
use crate::transform::ColorSample;
use crate::{CmmError, Result};
use std::fmt;
use std::sync::Arc;

pub type NewInstanceFn = fn(Arc<dyn HostContext>) -> Result<Instance>;
pub type DropInstanceFn = fn(Option<Instance>);
pub type TransformPixmapFn = fn(&Instance, &Link, &mut PixmapMut<'_>, &Pixmap<'_>) -> Result<()>;
pub type TransformColorFn = fn(&Instance, &Link, &mut ColorSample, &ColorSample) -> Result<()>;
pub type NewLinkFn = fn(
    &Instance,
    &mut Link,
    &RenderingParams,
    &LinkParams,
    &Profile<'_>,
    Option<&Profile<'_>>,
    &Profile<'_>,
) -> Result<()>;
pub type DropLinkFn = fn(&Instance, &mut Link);
pub type NewProfileFn = fn(&Instance, &mut Profile<'_>) -> Result<()>;
pub type DropProfileFn = fn(&Instance, &mut Profile<'_>);

/// Operation table of one color management backend
pub struct CmmEngine {
    /// Registry name
    pub name: &'static str,
    pub new_instance: NewInstanceFn,
    pub drop_instance: DropInstanceFn,
    pub transform_pixmap: TransformPixmapFn,
    pub transform_color: TransformColorFn,
    pub new_link: NewLinkFn,
    pub drop_link: DropLinkFn,
    pub new_profile: NewProfileFn,
    pub drop_profile: DropProfileFn,
    /// Flag hosts add to link flags to disable the backend's automatic
    /// white-on-white correction
    pub avoid_white_fix_flag: CmmFlags,
}

impl CmmEngine {
    /// Create an engine context bound to `host`.
    pub fn new_instance(&self, host: Arc<dyn HostContext>) -> Result<Instance> {
        (self.new_instance)(host)
    }

    /// Release an engine context. `None` is a no-op.
    pub fn drop_instance(&self, instance: Option<Instance>) {
        (self.drop_instance)(instance)
    }

    /// Open `profile` from its bytes.
    ///
    /// On failure the profile is left invalid with a channel count of 0.
    pub fn new_profile(&self, instance: &Instance, profile: &mut Profile<'_>) -> Result<()> {
        (self.new_profile)(instance, profile)
    }

    /// Close `profile`. Idempotent.
    pub fn drop_profile(&self, instance: &Instance, profile: &mut Profile<'_>) {
        (self.drop_profile)(instance, profile)
    }

    /// Build `link`, see [`build_link`](crate::build_link).
    #[allow(clippy::too_many_arguments)]
    pub fn new_link(
        &self,
        instance: &Instance,
        link: &mut Link,
        rendering: &RenderingParams,
        params: &LinkParams,
        src: &Profile<'_>,
        prf: Option<&Profile<'_>>,
        dst: &Profile<'_>,
    ) -> Result<()> {
        (self.new_link)(instance, link, rendering, params, src, prf, dst)
    }

    /// Release `link`. Idempotent.
    pub fn drop_link(&self, instance: &Instance, link: &mut Link) {
        (self.drop_link)(instance, link)
    }

    /// Transform every row of `src` into `dst`.
    pub fn transform_pixmap(
        &self,
        instance: &Instance,
        link: &Link,
        dst: &mut PixmapMut<'_>,
        src: &Pixmap<'_>,
    ) -> Result<()> {
        (self.transform_pixmap)(instance, link, dst, src)
    }

    /// Transform one 16-bit color.
    pub fn transform_color(
        &self,
        instance: &Instance,
        link: &Link,
        dst: &mut ColorSample,
        src: &ColorSample,
    ) -> Result<()> {
        (self.transform_color)(instance, link, dst, src)
    }
}

impl fmt::Debug for CmmEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmmEngine")
            .field("name", &self.name)
            .field("avoid_white_fix_flag", &self.avoid_white_fix_flag)
            .finish_non_exhaustive()
    }
}

/// Engines available to a host, in registration order
#[derive(Debug, Default, Clone)]
pub struct CmmRegistry {
    engines: Vec<&'static CmmEngine>,
}

impl CmmRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every engine built into this crate
    pub fn with_default_engines() -> Self {
        Self {
            engines: vec![&crate::lcms::LCMS_ENGINE],
        }
    }

    pub fn register(&mut self, engine: &'static CmmEngine) -> Result<()> {
        if self.engines.iter().any(|e| e.name == engine.name) {
            return Err(CmmError::DuplicateEngine(engine.name));
        }
        tracing::debug!(engine = engine.name, "registered cmm engine");
        self.engines.push(engine);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&'static CmmEngine> {
        self.engines
            .iter()
            .copied()
            .find(|e| e.name == name)
            .ok_or_else(|| CmmError::UnknownEngine(name.to_owned()))
    }

    /// First registered engine
    pub fn default_engine(&self) -> Option<&'static CmmEngine> {
        self.engines.first().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.engines.iter().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
