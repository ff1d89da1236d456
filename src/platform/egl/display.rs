// surfbridge/src/platform/egl/display.rs
//
//! The display: native EGL initialization, configs, and context virtualization.

use super::config::{Config, ConfigId, ConfigSet, RenderableTypeFlags, SurfaceTypeFlags};
use super::context::{Context, Renderer, WorkerContext};
use super::error::ToWindowingApiError;
use super::extensions::{DisplayCaps, DisplayExtensions};
use super::ffi::{NativeClientBuffer, NativeConfig, NativeContext, NativeDisplayType};
use super::ffi::{NativeSurface, NativeWindow};
use super::ffi::{EGL_COLOR_COMPONENT_TYPE_EXT, EGL_COLOR_COMPONENT_TYPE_FIXED_EXT};
use super::ffi::{EGL_EXTERNAL_SURFACE_ANGLE, EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV};
use super::ffi::{EGL_LINUX_DMA_BUF_EXT, EGL_NO_CONFIG_KHR, GL_TRUE};
use super::functions::EglFunctions;
use super::loader::{self, LibEgl};
use super::surface::{Surface, SurfaceType};
use crate::egl;
use crate::egl::types::{EGLenum, EGLint};
use crate::formats::FormatInfo;
use crate::{ContextAttributes, Error, GLVersion, WindowingApiError};

use euclid::default::Size2D;
use log::{debug, error, info};
use std::collections::HashMap;
use std::env;
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Set to `0` or `1` to override whether contexts are virtualized.
pub const VIRTUALIZED_CONTEXTS_ENV_VAR: &str = "SURFBRIDGE_VIRTUALIZED_CONTEXTS";

const DEFAULT_VIRTUALIZED_CONTEXTS: bool = true;

// Tried in order when no maximum version is requested.
const ES_VERSIONS_FROM_2_0: [GLVersion; 4] = [
    GLVersion::new(3, 2),
    GLVersion::new(3, 1),
    GLVersion::new(3, 0),
    GLVersion::new(2, 0),
];

/// The client API the display renders with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformType {
    /// Desktop OpenGL through EGL.
    OpenGL,
    /// OpenGL ES.
    OpenGLES,
    /// No platform type. There are no renderable types for it, so initialization fails.
    Unspecified,
}

/// Attributes to initialize a display with.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayAttributes {
    pub platform_type: PlatformType,
    /// The OpenGL ES version to create contexts with. If `None`, the highest available version
    /// is used.
    pub max_version: Option<GLVersion>,
    /// Whether every client context shares one native context.
    pub virtualized_contexts: bool,
    /// Where to load the EGL library from. If `None`, the platform default is used.
    pub egl_library: Option<PathBuf>,
    pub native_display: NativeDisplayType,
}

impl Default for DisplayAttributes {
    fn default() -> DisplayAttributes {
        DisplayAttributes {
            platform_type: PlatformType::OpenGLES,
            max_version: None,
            virtualized_contexts: DEFAULT_VIRTUALIZED_CONTEXTS,
            egl_library: None,
            native_display: NativeDisplayType::NONE,
        }
    }
}

impl DisplayAttributes {
    #[inline]
    pub fn new() -> DisplayAttributes {
        DisplayAttributes::default()
    }

    /// The default attributes, with `SURFBRIDGE_VIRTUALIZED_CONTEXTS` applied.
    pub fn from_env() -> DisplayAttributes {
        let mut attributes = DisplayAttributes::default();
        match env::var(VIRTUALIZED_CONTEXTS_ENV_VAR).as_deref() {
            Ok("0") => attributes.virtualized_contexts = false,
            Ok("1") => attributes.virtualized_contexts = true,
            Ok(value) => debug!("ignoring {}={:?}", VIRTUALIZED_CONTEXTS_ENV_VAR, value),
            Err(_) => {}
        }
        attributes
    }

    #[inline]
    pub fn with_platform_type(mut self, platform_type: PlatformType) -> DisplayAttributes {
        self.platform_type = platform_type;
        self
    }

    #[inline]
    pub fn with_max_version(mut self, max_version: GLVersion) -> DisplayAttributes {
        self.max_version = Some(max_version);
        self
    }

    #[inline]
    pub fn with_virtualized_contexts(mut self, virtualized: bool) -> DisplayAttributes {
        self.virtualized_contexts = virtualized;
        self
    }

    #[inline]
    pub fn with_egl_library<P>(mut self, path: P) -> DisplayAttributes where P: Into<PathBuf> {
        self.egl_library = Some(path.into());
        self
    }

    #[inline]
    pub fn with_native_display(mut self, native_display: NativeDisplayType) -> DisplayAttributes {
        self.native_display = native_display;
        self
    }
}

/// What one thread has bound natively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurrentNativeContext {
    pub surface: NativeSurface,
    pub context: NativeContext,
    /// The thread is driving an embedder-owned context; the display makes no native calls.
    pub is_external_context: bool,
    // Something the driver may still have bound was destroyed, so the next bind can't be
    // skipped even if it matches the record.
    needs_rebind: bool,
}

// State that outlives `Display` borrows: renderers and surfaces hold on to it.
pub(crate) struct DisplayShared {
    pub(crate) egl: Arc<dyn EglFunctions>,
    current: Mutex<HashMap<ThreadId, CurrentNativeContext>>,
    terminated: AtomicBool,
}

impl DisplayShared {
    fn current(&self) -> MutexGuard<HashMap<ThreadId, CurrentNativeContext>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Forgets every thread's binding of `context`, then destroys it.
    pub(crate) fn destroy_native_context(&self, context: NativeContext) {
        for current in self.current().values_mut() {
            if current.context == context {
                current.surface = NativeSurface::NONE;
                current.context = NativeContext::NONE;
                current.needs_rebind = true;
            }
        }

        if self.is_terminated() {
            debug!("not destroying context {:x}: display terminated", context.0);
            return;
        }

        debug!("destroying native context {:x}", context.0);
        if !self.egl.destroy_context(context) {
            let err = self.egl.get_error().to_windowing_api_error();
            error!("eglDestroyContext error {:?}", err);
        }
    }

    #[inline]
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    // Keeps a null-surface make-current from rebinding a surface that's gone. The context is
    // forgotten too, so that the next make-current reaches the driver and releases the surface.
    pub(crate) fn forget_native_surface(&self, surface: NativeSurface) {
        for current in self.current().values_mut() {
            if current.surface == surface {
                current.surface = NativeSurface::NONE;
                current.context = NativeContext::NONE;
                current.needs_rebind = true;
            }
        }
    }
}

/// An initialized EGL display.
///
/// A display owns the native EGL connection and, when contexts are virtualized, the single
/// native context that every client context renders with. It also keeps a record of what each
/// thread has bound natively, so that redundant `eglMakeCurrent` calls can be skipped.
///
/// Dropping a display terminates it.
pub struct Display {
    shared: Arc<DisplayShared>,
    attributes: DisplayAttributes,
    config: NativeConfig,
    config_attributes: Vec<EGLint>,
    configs: Mutex<ConfigSet>,
    mock_pbuffer: NativeSurface,
    supports_surfaceless: bool,
    has_ext_create_context_robustness: bool,
    has_nv_robustness_video_memory_purge: bool,
    renderer: Option<Arc<Renderer>>,
    terminated: bool,
}

impl Display {
    /// Loads the system EGL library and initializes a display with it.
    pub fn initialize(attributes: DisplayAttributes) -> Result<Display, Error> {
        let path = match attributes.egl_library {
            Some(ref path) => path.clone(),
            None => loader::default_library_path(),
        };
        let egl = LibEgl::open(&path, attributes.native_display)?;
        Display::with_functions(attributes, Arc::new(egl))
    }

    /// Initializes a display on top of an already-initialized native display.
    ///
    /// The display takes over the native display and terminates it when it is terminated.
    pub fn with_functions(attributes: DisplayAttributes, egl: Arc<dyn EglFunctions>)
                          -> Result<Display, Error> {
        let egl_version = egl.version();
        if egl_version < GLVersion::new(1, 4) {
            egl.terminate();
            return Err(Error::UnsupportedEGLVersion(egl_version));
        }

        let mut display = Display {
            shared: Arc::new(DisplayShared {
                egl: egl.clone(),
                current: Mutex::new(HashMap::new()),
                terminated: AtomicBool::new(false),
            }),
            config: EGL_NO_CONFIG_KHR,
            config_attributes: vec![],
            configs: Mutex::new(ConfigSet::new()),
            mock_pbuffer: NativeSurface::NONE,
            supports_surfaceless: false,
            has_ext_create_context_robustness: egl
                .has_extension("EGL_EXT_create_context_robustness"),
            has_nv_robustness_video_memory_purge: egl
                .has_extension("EGL_NV_robustness_video_memory_purge"),
            renderer: None,
            terminated: false,
            attributes,
        };

        // From here on, dropping `display` on error cleans up whatever was created.
        let renderable_types = display.renderable_types();
        if renderable_types.is_empty() {
            return Err(Error::NoRenderableTypes);
        }

        let base_config_attributes = [
            (egl::COLOR_BUFFER_TYPE as EGLint, egl::RGB_BUFFER as EGLint),
            (egl::SURFACE_TYPE as EGLint, (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint),
        ];
        // RGBA8888 with D24S8: depth and stencil sizes must match for contexts to be
        // compatible with surfaces.
        let format_config_attributes = [
            (egl::RED_SIZE as EGLint, 8),
            (egl::GREEN_SIZE as EGLint, 8),
            (egl::BLUE_SIZE as EGLint, 8),
            (egl::ALPHA_SIZE as EGLint, 8),
            (egl::DEPTH_SIZE as EGLint, 24),
            (egl::STENCIL_SIZE as EGLint, 8),
        ];

        let mut config_with_format = EGL_NO_CONFIG_KHR;
        let (mut base_list, mut format_list) = (vec![], vec![]);
        for &renderable_type in &renderable_types {
            let renderable = (egl::RENDERABLE_TYPE as EGLint, renderable_type.bits());
            base_list = attribute_list(base_config_attributes.iter().chain(Some(&renderable)));
            format_list = attribute_list(base_config_attributes.iter()
                                                               .chain(&format_config_attributes)
                                                               .chain(Some(&renderable)));

            let mut configs = [EGL_NO_CONFIG_KHR];
            if let Some(count) = egl.choose_config(&format_list, &mut configs) {
                if count > 0 {
                    config_with_format = configs[0];
                    break;
                }
            }
        }

        if config_with_format == EGL_NO_CONFIG_KHR {
            let err = egl.get_error().to_windowing_api_error();
            return Err(Error::PixelFormatSelectionFailed(err));
        }

        // The mock pbuffer stands in for a surface when the driver can't go surfaceless.
        display.supports_surfaceless = egl.has_extension("EGL_KHR_surfaceless_context");
        if !display.supports_surfaceless {
            let mock_pbuffer_attributes = [
                egl::WIDTH as EGLint, 1,
                egl::HEIGHT as EGLint, 1,
                egl::NONE as EGLint,
            ];
            display.mock_pbuffer = egl.create_pbuffer_surface(config_with_format,
                                                              &mock_pbuffer_attributes);
            if display.mock_pbuffer.is_none() {
                let err = egl.get_error().to_windowing_api_error();
                return Err(Error::DisplayInitializationFailed(err));
            }
        }

        // The mock pbuffer always has a real config, but contexts go config-less if they can.
        if egl.has_extension("EGL_KHR_no_config_context") {
            display.config_attributes = base_list;
            display.config = EGL_NO_CONFIG_KHR;
        } else {
            display.config_attributes = format_list;
            display.config = config_with_format;
        }

        let renderer = display.create_renderer(NativeContext::NONE, true, false)?;
        let max_version = renderer.max_supported_es_version();
        display.renderer = Some(renderer);
        if max_version < GLVersion::new(2, 0) {
            return Err(Error::UnsupportedGLVersion(max_version));
        }

        info!("surfbridge EGL display initialized: {}", display.renderer_description());
        Ok(display)
    }

    fn renderable_types(&self) -> Vec<RenderableTypeFlags> {
        match self.attributes.platform_type {
            PlatformType::OpenGL => vec![RenderableTypeFlags::OPENGL],
            PlatformType::OpenGLES => {
                let mut renderable_types = vec![];
                if self.supports_create_context() {
                    renderable_types.push(RenderableTypeFlags::OPENGL_ES3);
                }
                renderable_types.push(RenderableTypeFlags::OPENGL_ES2);
                renderable_types
            }
            PlatformType::Unspecified => vec![],
        }
    }

    // EGL 1.5 folded `EGL_KHR_create_context` into core.
    fn supports_create_context(&self) -> bool {
        self.egl().version() >= GLVersion::new(1, 5) ||
            self.egl().has_extension("EGL_KHR_create_context")
    }

    #[inline]
    fn egl(&self) -> &dyn EglFunctions {
        &*self.shared.egl
    }

    /// The native EGL function table this display runs on.
    #[inline]
    pub fn functions(&self) -> &Arc<dyn EglFunctions> {
        &self.shared.egl
    }

    fn renderer(&self) -> Result<&Arc<Renderer>, Error> {
        match self.renderer {
            Some(ref renderer) if !self.terminated => Ok(renderer),
            _ => Err(Error::DisplayTerminated),
        }
    }

    #[inline]
    pub fn attributes(&self) -> &DisplayAttributes {
        &self.attributes
    }

    #[inline]
    pub fn is_virtualized(&self) -> bool {
        self.attributes.virtualized_contexts
    }

    /// Whether the native driver supports `EGL_KHR_surfaceless_context`.
    #[inline]
    pub fn supports_surfaceless(&self) -> bool {
        self.supports_surfaceless
    }

    /// The 1x1 pbuffer bound in place of a surface, or `NONE` if the driver is surfaceless.
    #[inline]
    pub fn mock_pbuffer(&self) -> NativeSurface {
        self.mock_pbuffer
    }

    /// The config contexts are created with; `NONE` with `EGL_KHR_no_config_context`.
    #[inline]
    pub fn native_config(&self) -> NativeConfig {
        self.config
    }

    /// The shared renderer that virtualized contexts use.
    pub fn shared_renderer(&self) -> Result<&Arc<Renderer>, Error> {
        self.renderer()
    }

    /// A human-readable summary of the native implementation.
    pub fn renderer_description(&self) -> String {
        let es_version = self.renderer.as_ref().map(|renderer| renderer.max_supported_es_version());
        format!("EGL {}, OpenGL ES {}, {} contexts",
                self.egl().version(),
                es_version.map_or("unknown".to_owned(), |version| version.to_string()),
                if self.is_virtualized() { "virtualized" } else { "native" })
    }

    /// Creates a native context shared with `share_context`.
    ///
    /// Returns the context and the exact attribute list that succeeded.
    pub fn initialize_context(&self, share_context: NativeContext)
                              -> Result<(NativeContext, Vec<EGLint>), Error> {
        let egl = self.egl();
        let requested = self.attributes.max_version;

        let mut candidates = vec![];
        if self.supports_create_context() {
            let versions = match requested {
                Some(version) => vec![version],
                None => ES_VERSIONS_FROM_2_0.to_vec(),
            };
            for version in versions {
                candidates.push(vec![
                    (egl::CONTEXT_MAJOR_VERSION as EGLint, version.major as EGLint),
                    (egl::CONTEXT_MINOR_VERSION as EGLint, version.minor as EGLint),
                ]);
            }
        } else {
            if let Some(version) = requested {
                if version != GLVersion::new(2, 0) {
                    return Err(Error::BadAttribute("unsupported requested context version"));
                }
            }
            candidates.push(vec![(egl::CONTEXT_CLIENT_VERSION as EGLint, 2)]);
        }

        for candidate in candidates {
            // Some devices expose the robustness extensions but fail to create robust
            // contexts, so fall back to a plain context.
            if self.has_ext_create_context_robustness {
                let mut robust = candidate.clone();
                robust.push((egl::CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY as EGLint,
                             egl::LOSE_CONTEXT_ON_RESET as EGLint));
                if self.has_nv_robustness_video_memory_purge {
                    robust.push((EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV, GL_TRUE));
                }

                let attributes = attribute_list(&robust);
                let context = egl.create_context(self.config, share_context, &attributes);
                if !context.is_none() {
                    return Ok((context, attributes));
                }

                info!("EGL_EXT_create_context_robustness available but robust context creation \
                       failed.");
            }

            let attributes = attribute_list(&candidate);
            let context = egl.create_context(self.config, share_context, &attributes);
            if !context.is_none() {
                return Ok((context, attributes));
            }
        }

        let err = egl.get_error().to_windowing_api_error();
        Err(Error::ContextCreationFailed(err))
    }

    fn create_renderer(&self,
                       share_context: NativeContext,
                       make_new_context_current: bool,
                       is_external_context: bool)
                       -> Result<Arc<Renderer>, Error> {
        let egl = self.egl();

        let (context, attributes) = if is_external_context {
            debug_assert!(share_context.is_none() && !make_new_context_current);
            // The embedder's context is current, so there's nothing to bind.
            let context = egl.get_current_context();
            if context.is_none() {
                return Err(Error::NoCurrentContext);
            }
            let attributes = attribute_list(&[
                (egl::CONTEXT_MAJOR_VERSION as EGLint, 2),
                (egl::CONTEXT_MINOR_VERSION as EGLint, 0),
            ]);
            (context, attributes)
        } else {
            let (context, attributes) = self.initialize_context(share_context)?;
            if !egl.make_current(self.mock_pbuffer, context) {
                let err = egl.get_error().to_windowing_api_error();
                egl.destroy_context(context);
                return Err(Error::DisplayInitializationFailed(err));
            }
            (context, attributes)
        };

        let renderer = Arc::new(Renderer::new(self.shared.clone(),
                                              context,
                                              attributes,
                                              is_external_context));

        let restore_result = {
            let mut current_contexts = self.shared.current();
            let current = current_contexts.entry(thread::current().id()).or_default();
            if make_new_context_current {
                current.surface = self.mock_pbuffer;
                current.context = context;
                Ok(())
            } else if !is_external_context && !egl.make_current(current.surface, current.context) {
                Err(Error::DisplayInitializationFailed(egl.get_error().to_windowing_api_error()))
            } else {
                Ok(())
            }
        };

        // The lock must be released before a failed renderer is dropped.
        restore_result.map(|()| renderer)
    }

    /// Tears the display down. Errors are logged, not returned.
    ///
    /// Terminating twice is harmless. Contexts and surfaces that outlive the display become
    /// inert.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        let egl = self.shared.egl.clone();
        if !egl.make_current(NativeSurface::NONE, NativeContext::NONE) {
            error!("eglMakeCurrent error {:?}", egl.get_error().to_windowing_api_error());
        }

        if !self.mock_pbuffer.is_none() {
            let success = egl.destroy_surface(self.mock_pbuffer);
            self.mock_pbuffer = NativeSurface::NONE;
            if !success {
                error!("eglDestroySurface error {:?}", egl.get_error().to_windowing_api_error());
            }
        }

        self.renderer = None;
        self.shared.current().clear();
        self.shared.terminated.store(true, Ordering::Release);

        if !egl.terminate() {
            error!("eglTerminate error {:?}", egl.get_error().to_windowing_api_error());
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn check_alive(&self) -> Result<(), Error> {
        if self.terminated {
            Err(Error::DisplayTerminated)
        } else {
            Ok(())
        }
    }

    /// Enumerates the configs this display exposes.
    ///
    /// Configs whose color or depth/stencil layout has no matching sized format are skipped.
    /// Generating configs replaces the set surfaces are created from.
    pub fn generate_configs(&self) -> Result<ConfigSet, Error> {
        self.check_alive()?;
        let egl = self.egl();

        let config_count = match egl.choose_config(&self.config_attributes, &mut []) {
            Some(config_count) => config_count,
            None => {
                let err = egl.get_error().to_windowing_api_error();
                return Err(Error::PixelFormatSelectionFailed(err));
            }
        };

        let mut native_configs = vec![NativeConfig::NONE; config_count];
        let config_count = match egl.choose_config(&self.config_attributes, &mut native_configs) {
            Some(config_count) => config_count,
            None => {
                let err = egl.get_error().to_windowing_api_error();
                return Err(Error::PixelFormatSelectionFailed(err));
            }
        };
        native_configs.truncate(config_count);

        let mut config_set = ConfigSet::new();
        for native_config in native_configs {
            let mut config = self.read_config(native_config)?;

            // Pixmaps aren't supported.
            config.surface_type.remove(SurfaceTypeFlags::PIXMAP);

            if config.color_buffer_type != egl::RGB_BUFFER as EGLint ||
                    config.color_component_type != EGL_COLOR_COMPONENT_TYPE_FIXED_EXT {
                continue;
            }
            config.render_target_format = match FormatInfo::color_format_for_sizes(
                    config.red_size, config.green_size, config.blue_size, config.alpha_size) {
                Some(format) => format,
                None => {
                    error!("RGBA({},{},{},{}) not handled",
                           config.red_size,
                           config.green_size,
                           config.blue_size,
                           config.alpha_size);
                    continue;
                }
            };
            config.depth_stencil_format =
                match FormatInfo::depth_stencil_format_for_sizes(config.depth_size,
                                                                 config.stencil_size) {
                    Some(format) => format,
                    None => continue,
                };

            config.match_native_pixmap = egl::NONE as EGLint;
            config.optimal_orientation = 0;

            config_set.add(config);
        }

        *lock(&self.configs) = config_set.clone();
        Ok(config_set)
    }

    fn read_config(&self, native_config: NativeConfig) -> Result<Config, Error> {
        let egl = self.egl();
        let attrib = |attribute: EGLenum| -> Result<EGLint, Error> {
            egl.get_config_attrib(native_config, attribute as EGLint).ok_or_else(|| {
                Error::PixelFormatSelectionFailed(egl.get_error().to_windowing_api_error())
            })
        };

        let color_component_type = if egl.has_extension("EGL_EXT_pixel_format_float") {
            attrib(EGL_COLOR_COMPONENT_TYPE_EXT as EGLenum)?
        } else {
            EGL_COLOR_COMPONENT_TYPE_FIXED_EXT
        };

        Ok(Config {
            render_target_format: glow::NONE,
            depth_stencil_format: glow::NONE,
            buffer_size: attrib(egl::BUFFER_SIZE)?,
            red_size: attrib(egl::RED_SIZE)?,
            green_size: attrib(egl::GREEN_SIZE)?,
            blue_size: attrib(egl::BLUE_SIZE)?,
            luminance_size: attrib(egl::LUMINANCE_SIZE)?,
            alpha_size: attrib(egl::ALPHA_SIZE)?,
            alpha_mask_size: attrib(egl::ALPHA_MASK_SIZE)?,
            bind_to_texture_rgb: attrib(egl::BIND_TO_TEXTURE_RGB)?,
            bind_to_texture_rgba: attrib(egl::BIND_TO_TEXTURE_RGBA)?,
            color_buffer_type: attrib(egl::COLOR_BUFFER_TYPE)?,
            config_caveat: attrib(egl::CONFIG_CAVEAT)?,
            config_id: attrib(egl::CONFIG_ID)?,
            conformant: attrib(egl::CONFORMANT)?,
            depth_size: attrib(egl::DEPTH_SIZE)?,
            level: attrib(egl::LEVEL)?,
            match_native_pixmap: egl::NONE as EGLint,
            max_pbuffer_width: attrib(egl::MAX_PBUFFER_WIDTH)?,
            max_pbuffer_height: attrib(egl::MAX_PBUFFER_HEIGHT)?,
            max_pbuffer_pixels: attrib(egl::MAX_PBUFFER_PIXELS)?,
            max_swap_interval: attrib(egl::MAX_SWAP_INTERVAL)?,
            min_swap_interval: attrib(egl::MIN_SWAP_INTERVAL)?,
            native_renderable: attrib(egl::NATIVE_RENDERABLE)?,
            native_visual_id: attrib(egl::NATIVE_VISUAL_ID)?,
            native_visual_type: attrib(egl::NATIVE_VISUAL_TYPE)?,
            renderable_type: RenderableTypeFlags::from_bits_retain(attrib(egl::RENDERABLE_TYPE)?),
            sample_buffers: attrib(egl::SAMPLE_BUFFERS)?,
            samples: attrib(egl::SAMPLES)?,
            stencil_size: attrib(egl::STENCIL_SIZE)?,
            surface_type: SurfaceTypeFlags::from_bits_retain(attrib(egl::SURFACE_TYPE)?),
            transparent_type: attrib(egl::TRANSPARENT_TYPE)?,
            transparent_red_value: attrib(egl::TRANSPARENT_RED_VALUE)?,
            transparent_green_value: attrib(egl::TRANSPARENT_GREEN_VALUE)?,
            transparent_blue_value: attrib(egl::TRANSPARENT_BLUE_VALUE)?,
            optimal_orientation: 0,
            color_component_type,
        })
    }

    // Finds the native config again from the `EGL_CONFIG_ID` recorded for an internal ID.
    fn native_config_for(&self, config_id: ConfigId) -> Result<(NativeConfig, Config), Error> {
        self.check_alive()?;
        let config = lock(&self.configs).get(config_id).cloned().ok_or(Error::BadConfig)?;

        let attributes = attribute_list(&[(egl::CONFIG_ID as EGLint, config.config_id)]);
        let mut native_configs = [NativeConfig::NONE];
        match self.egl().choose_config(&attributes, &mut native_configs) {
            Some(1) => Ok((native_configs[0], config)),
            Some(_) => Err(Error::NoPixelFormatFound),
            None => {
                let err = self.egl().get_error().to_windowing_api_error();
                Err(Error::PixelFormatSelectionFailed(err))
            }
        }
    }

    /// Creates a surface that renders to a native window.
    ///
    /// `attributes` is an `EGL_NONE`-terminated list, or empty.
    pub fn create_window_surface(&self,
                                 config_id: ConfigId,
                                 window: NativeWindow,
                                 attributes: &[EGLint])
                                 -> Result<Surface, Error> {
        let (native_config, config) = self.native_config_for(config_id)?;
        let native_surface = self.egl().create_window_surface(native_config, window, attributes);
        if native_surface.is_none() {
            let err = self.egl().get_error().to_windowing_api_error();
            return Err(Error::SurfaceCreationFailed(err));
        }
        Ok(Surface::new(self.shared.clone(),
                        SurfaceType::Window,
                        native_surface,
                        native_config,
                        Some(config)))
    }

    /// Creates an offscreen pbuffer surface.
    ///
    /// `attributes` is an `EGL_NONE`-terminated list (`EGL_WIDTH`, `EGL_HEIGHT`, ...), or empty.
    pub fn create_pbuffer_surface(&self, config_id: ConfigId, attributes: &[EGLint])
                                  -> Result<Surface, Error> {
        let (native_config, config) = self.native_config_for(config_id)?;
        let native_surface = self.egl().create_pbuffer_surface(native_config, attributes);
        if native_surface.is_none() {
            let err = self.egl().get_error().to_windowing_api_error();
            return Err(Error::SurfaceCreationFailed(err));
        }
        Ok(Surface::new(self.shared.clone(),
                        SurfaceType::Pbuffer,
                        native_surface,
                        native_config,
                        Some(config)))
    }

    /// Wraps a client buffer in a surface.
    ///
    /// Only `EGL_EXTERNAL_SURFACE_ANGLE` is supported: the embedder owns the drawable, and the
    /// surface just records its size (`EGL_WIDTH`/`EGL_HEIGHT` from `attributes`, default 0).
    pub fn create_pbuffer_from_client_buffer(&self,
                                             buffer_type: EGLenum,
                                             client_buffer: NativeClientBuffer,
                                             attributes: &[EGLint])
                                             -> Result<Surface, Error> {
        self.check_alive()?;
        self.validate_client_buffer(buffer_type, client_buffer)?;
        let width = attribute_value(attributes, egl::WIDTH as EGLint).unwrap_or(0);
        let height = attribute_value(attributes, egl::HEIGHT as EGLint).unwrap_or(0);
        Ok(Surface::new_external(self.shared.clone(), Size2D::new(width, height)))
    }

    pub fn create_pixmap_surface(&self, _: ConfigId, _: usize, _: &[EGLint])
                                 -> Result<Surface, Error> {
        Err(Error::Unimplemented)
    }

    /// Creates a client context.
    ///
    /// With virtualized contexts, the new context shares the display's native context, and
    /// `share_context` is implied. Otherwise a new native context is created, sharing with
    /// `share_context` if given. An external context wraps the native context the embedder has
    /// made current on this thread and can't have a share context.
    pub fn create_context(&self,
                          share_context: Option<&Context>,
                          attributes: &ContextAttributes)
                          -> Result<Context, Error> {
        let is_external = attributes.is_external();

        let renderer = if self.is_virtualized() && !is_external {
            self.renderer()?.clone()
        } else {
            self.check_alive()?;
            let native_share_context = match share_context {
                Some(_) if is_external => return Err(Error::IncompatibleSharedContext),
                Some(share_context) => share_context.native_context(),
                None => NativeContext::NONE,
            };

            match self.create_renderer(native_share_context, false, is_external) {
                Ok(renderer) => renderer,
                Err(err) => {
                    error!("Failed to create a shared renderer: {}", err);
                    return Err(err);
                }
            }
        };

        Ok(Context::new(renderer, attributes))
    }

    /// Binds `draw` and `context` on the calling thread.
    ///
    /// With virtualized contexts, the native context never changes; binding a null surface
    /// keeps the previous surface bound (or the mock pbuffer, if nothing was and the driver
    /// can't go surfaceless). `eglMakeCurrent` is skipped when the binding wouldn't change.
    ///
    /// The read surface is always the draw surface natively.
    pub fn make_current(&self,
                        draw: Option<&Surface>,
                        _read: Option<&Surface>,
                        context: Option<&Context>)
                        -> Result<(), Error> {
        self.check_alive()?;

        let mut new_surface = draw.map_or(NativeSurface::NONE, |surface| surface.native_surface());
        let mut new_context = context.map_or(NativeContext::NONE, |context| {
            context.native_context()
        });

        let mut current_contexts = self.shared.current();
        let current = current_contexts.entry(thread::current().id()).or_default();

        if current.is_external_context || context.map_or(false, |context| context.is_external()) {
            // External contexts only draw to external surfaces, which the embedder binds.
            let draw_is_external = draw.map_or(false, |surface| surface.is_external());
            if !current.is_external_context {
                if !draw_is_external {
                    return Err(Error::IncompatibleSurface);
                }
                current.context = new_context;
                current.is_external_context = true;
            } else if context.is_some() {
                if new_context != current.context {
                    return Err(Error::MakeCurrentFailed(WindowingApiError::BadContext));
                }
                if !draw_is_external {
                    return Err(Error::IncompatibleSurface);
                }
            } else {
                current.context = NativeContext::NONE;
                current.is_external_context = false;
            }
            return Ok(());
        }

        if self.is_virtualized() && !new_context.is_none() {
            debug_assert!(current.context.is_none() ||
                          current.context == self.renderer()?.native_context());
            new_context = self.renderer()?.native_context();

            // Emulate surfaceless by leaving the previous surface bound.
            if new_surface.is_none() {
                new_surface = current.surface;
            }
            if new_surface.is_none() && !self.supports_surfaceless {
                new_surface = self.mock_pbuffer;
            }
        }

        if current.needs_rebind || new_surface != current.surface ||
                new_context != current.context {
            debug!("eglMakeCurrent({:x}, {:x}) on {:?}",
                   new_surface.0,
                   new_context.0,
                   thread::current().id());
            if !self.egl().make_current(new_surface, new_context) {
                let err = self.egl().get_error().to_windowing_api_error();
                return Err(Error::MakeCurrentFailed(err));
            }
            current.surface = new_surface;
            current.context = new_context;
            current.needs_rebind = false;
        }

        Ok(())
    }

    /// Nothing to do: the native context is left bound with its previous surface.
    pub fn make_current_surfaceless(&self, _: &Context) -> Result<(), Error> {
        Ok(())
    }

    /// What the calling thread has bound natively, as far as this display knows.
    pub fn current_native_context(&self) -> CurrentNativeContext {
        self.shared.current().get(&thread::current().id()).copied().unwrap_or_default()
    }

    /// Forgets every thread's binding of `context`, then destroys it natively.
    ///
    /// Renderers call this themselves when they're dropped.
    pub fn destroy_native_context(&self, context: NativeContext) {
        self.shared.destroy_native_context(context)
    }

    pub fn max_supported_es_version(&self) -> Result<GLVersion, Error> {
        Ok(self.renderer()?.max_supported_es_version())
    }

    pub fn generate_extensions(&self) -> DisplayExtensions {
        let egl = self.egl();
        let egl_1_5 = egl.version() >= GLVersion::new(1, 5);
        let has = |name: &str| egl.has_extension(name);

        let mut extensions = DisplayExtensions {
            create_context_robustness: has("EGL_EXT_create_context_robustness"),
            // eglPostSubBufferNV isn't implemented.
            post_sub_buffer: false,
            presentation_time: has("EGL_ANDROID_presentation_time"),
            // Contexts are virtualized, so textures and semaphores can be shared globally.
            display_texture_share_group: true,
            display_semaphore_share_group: true,
            // Falls back to a regular swap.
            swap_buffers_with_damage: true,
            image: has("EGL_KHR_image"),
            image_base: has("EGL_KHR_image_base"),
            gl_texture_2d_image: has("EGL_KHR_gl_texture_2D_image"),
            gl_texture_cubemap_image: has("EGL_KHR_gl_texture_cubemap_image"),
            gl_texture_3d_image: has("EGL_KHR_gl_texture_3D_image"),
            gl_renderbuffer_image: has("EGL_KHR_gl_renderbuffer_image"),
            pixel_format_float: has("EGL_EXT_pixel_format_float"),
            gl_colorspace: has("EGL_KHR_gl_colorspace"),
            image_native_buffer: has("EGL_ANDROID_image_native_buffer"),
            get_frame_timestamps: has("EGL_ANDROID_get_frame_timestamps"),
            fence_sync: egl_1_5 || has("EGL_KHR_fence_sync"),
            wait_sync: egl_1_5 || has("EGL_KHR_wait_sync"),
            get_native_client_buffer_android: has("EGL_ANDROID_get_native_client_buffer"),
            create_native_client_buffer_android: has("EGL_ANDROID_create_native_client_buffer"),
            native_fence_sync_android: has("EGL_ANDROID_native_fence_sync"),
            no_config_context: has("EGL_KHR_no_config_context"),
            surfaceless_context: self.supports_surfaceless || self.is_virtualized(),
            framebuffer_target_android: has("EGL_ANDROID_framebuffer_target"),
            image_dma_buf_import: has("EGL_EXT_image_dma_buf_import"),
            image_dma_buf_import_modifiers: has("EGL_EXT_image_dma_buf_import_modifiers"),
            robustness_video_memory_purge_nv: self.has_nv_robustness_video_memory_purge,
            external_context_and_surface: true,
            ..DisplayExtensions::default()
        };

        if extensions.gl_colorspace {
            extensions.gl_colorspace_display_p3_linear =
                has("EGL_EXT_gl_colorspace_display_p3_linear");
            extensions.gl_colorspace_display_p3 = has("EGL_EXT_gl_colorspace_display_p3");
            extensions.gl_colorspace_scrgb = has("EGL_EXT_gl_colorspace_scrgb");
            extensions.gl_colorspace_scrgb_linear = has("EGL_EXT_gl_colorspace_scrgb_linear");
            extensions.gl_colorspace_display_p3_passthrough =
                has("EGL_EXT_gl_colorspace_display_p3_passthrough");
            extensions.image_gl_colorspace = has("EGL_EXT_image_gl_colorspace");
        }

        extensions
    }

    pub fn generate_caps(&self) -> DisplayCaps {
        DisplayCaps { texture_npot: true }
    }

    /// Checks a client buffer for `create_pbuffer_from_client_buffer()`.
    pub fn validate_client_buffer(&self,
                                  buffer_type: EGLenum,
                                  client_buffer: NativeClientBuffer)
                                  -> Result<(), Error> {
        match buffer_type {
            EGL_EXTERNAL_SURFACE_ANGLE if client_buffer.is_none() => Ok(()),
            EGL_EXTERNAL_SURFACE_ANGLE => Err(Error::InvalidClientBuffer),
            _ => Err(Error::UnsupportedClientBuffer(buffer_type)),
        }
    }

    /// Checks an image target. Only DMA-buf imports are accepted.
    pub fn validate_image_client_buffer(&self, target: EGLenum) -> Result<(), Error> {
        match target {
            EGL_LINUX_DMA_BUF_EXT => Ok(()),
            _ => Err(Error::UnsupportedClientBuffer(target)),
        }
    }

    /// Creates a context for background work, shared with `share_context`.
    ///
    /// `attributes` is an `EGL_NONE`-terminated list, or empty.
    pub fn create_worker_context(&self, share_context: &Context, attributes: &[EGLint])
                                 -> Result<WorkerContext, Error> {
        self.check_alive()?;
        let context = self.egl().create_context(self.config,
                                                share_context.native_context(),
                                                attributes);
        if context.is_none() {
            let info_log = "Unable to create the EGL context.".to_owned();
            info!("{}", info_log);
            return Err(Error::WorkerContextCreationFailed(info_log));
        }
        Ok(WorkerContext::new(self.shared.clone(), context, NativeSurface::NONE))
    }

    pub fn test_device_lost(&self) -> bool {
        false
    }

    pub fn restore_lost_device(&self) -> Result<(), Error> {
        Ok(())
    }

    pub fn is_valid_native_window(&self, _: NativeWindow) -> bool {
        true
    }

    pub fn wait_client(&self, _: Option<&Context>) -> Result<(), Error> {
        Ok(())
    }

    pub fn wait_native(&self, _: Option<&Context>, _engine: EGLint) -> Result<(), Error> {
        Ok(())
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl Debug for Display {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Display({})", self.renderer_description())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Flattens `(name, value)` pairs into an `EGL_NONE`-terminated attribute list.
pub(crate) fn attribute_list<'a, I>(pairs: I) -> Vec<EGLint>
                                    where I: IntoIterator<Item = &'a (EGLint, EGLint)> {
    let mut list = vec![];
    for &(name, value) in pairs {
        list.push(name);
        list.push(value);
    }
    list.push(egl::NONE as EGLint);
    list
}

/// Looks `name` up in an `EGL_NONE`-terminated attribute list.
pub(crate) fn attribute_value(attributes: &[EGLint], name: EGLint) -> Option<EGLint> {
    for pair in attributes.chunks(2) {
        match *pair {
            [key, _] if key == egl::NONE as EGLint => break,
            [key, value] if key == name => return Some(value),
            _ => {}
        }
    }
    None
}
