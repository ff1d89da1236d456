// surfbridge/src/platform/egl/config.rs
//
//! The configs a display exposes to its clients.

use crate::egl;
use crate::egl::types::EGLint;

use bitflags::bitflags;
use std::collections::btree_map::{self, BTreeMap};

bitflags! {
    /// `EGL_SURFACE_TYPE` bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SurfaceTypeFlags: EGLint {
        const PBUFFER = egl::PBUFFER_BIT as EGLint;
        const PIXMAP  = egl::PIXMAP_BIT as EGLint;
        const WINDOW  = egl::WINDOW_BIT as EGLint;
    }
}

bitflags! {
    /// `EGL_RENDERABLE_TYPE` bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RenderableTypeFlags: EGLint {
        const OPENGL_ES  = egl::OPENGL_ES_BIT as EGLint;
        const OPENVG     = egl::OPENVG_BIT as EGLint;
        const OPENGL_ES2 = egl::OPENGL_ES2_BIT as EGLint;
        const OPENGL     = egl::OPENGL_BIT as EGLint;
        const OPENGL_ES3 = egl::OPENGL_ES3_BIT as EGLint;
    }
}

/// The internal ID of a config within a `ConfigSet`.
///
/// This is not the native `EGL_CONFIG_ID`; the display maps between the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigId(pub EGLint);

/// A framebuffer configuration, as exposed to clients.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// The GL sized internal format of the color buffer, e.g. `RGBA8`.
    pub render_target_format: u32,
    /// The GL sized internal format of the depth/stencil buffer, or `ZERO` if there is none.
    pub depth_stencil_format: u32,
    pub buffer_size: EGLint,
    pub red_size: EGLint,
    pub green_size: EGLint,
    pub blue_size: EGLint,
    pub luminance_size: EGLint,
    pub alpha_size: EGLint,
    pub alpha_mask_size: EGLint,
    pub bind_to_texture_rgb: EGLint,
    pub bind_to_texture_rgba: EGLint,
    pub color_buffer_type: EGLint,
    pub config_caveat: EGLint,
    /// The native `EGL_CONFIG_ID`.
    pub config_id: EGLint,
    pub conformant: EGLint,
    pub depth_size: EGLint,
    pub level: EGLint,
    pub match_native_pixmap: EGLint,
    pub max_pbuffer_width: EGLint,
    pub max_pbuffer_height: EGLint,
    pub max_pbuffer_pixels: EGLint,
    pub max_swap_interval: EGLint,
    pub min_swap_interval: EGLint,
    pub native_renderable: EGLint,
    pub native_visual_id: EGLint,
    pub native_visual_type: EGLint,
    pub renderable_type: RenderableTypeFlags,
    pub sample_buffers: EGLint,
    pub samples: EGLint,
    pub stencil_size: EGLint,
    pub surface_type: SurfaceTypeFlags,
    pub transparent_type: EGLint,
    pub transparent_red_value: EGLint,
    pub transparent_green_value: EGLint,
    pub transparent_blue_value: EGLint,
    pub optimal_orientation: EGLint,
    pub color_component_type: EGLint,
}

/// An ordered set of configs keyed by internal ID.
///
/// IDs are handed out sequentially, starting at 1.
#[derive(Clone, Debug, Default)]
pub struct ConfigSet {
    configs: BTreeMap<ConfigId, Config>,
}

impl ConfigSet {
    #[inline]
    pub fn new() -> ConfigSet {
        ConfigSet::default()
    }

    /// Adds a config and returns the internal ID assigned to it.
    pub fn add(&mut self, config: Config) -> ConfigId {
        let id = ConfigId(self.configs.len() as EGLint + 1);
        self.configs.insert(id, config);
        id
    }

    #[inline]
    pub fn get(&self, id: ConfigId) -> Option<&Config> {
        self.configs.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Iter<ConfigId, Config> {
        self.configs.iter()
    }
}

impl<'a> IntoIterator for &'a ConfigSet {
    type Item = (&'a ConfigId, &'a Config);
    type IntoIter = btree_map::Iter<'a, ConfigId, Config>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}
