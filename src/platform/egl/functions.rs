// surfbridge/src/platform/egl/functions.rs
//
//! The native EGL entry points the display backend depends on.

use super::ffi::{NativeConfig, NativeContext, NativeSurface, NativeWindow};
use crate::egl::types::EGLint;
use crate::info::GLVersion;

/// An initialized native EGL display together with its function table.
///
/// Every method maps one-to-one onto an EGL entry point, bound to the display this object was
/// initialized for. Attribute lists are `EGL_NONE`-terminated, exactly as EGL expects them.
/// Failures are reported the way EGL reports them (a false return or a null handle); call
/// `get_error()` for the reason.
///
/// `LibEgl` is the implementation backed by the system library.
pub trait EglFunctions: Send + Sync {
    /// The version reported by `eglInitialize`.
    fn version(&self) -> GLVersion;

    /// Whether the display advertises the named extension in `EGL_EXTENSIONS`.
    fn has_extension(&self, name: &str) -> bool;

    /// `eglGetError`.
    fn get_error(&self) -> EGLint;

    /// `eglChooseConfig`. Passing an empty `configs` slice only counts matching configs.
    ///
    /// Returns the number of configs matched (or written), or `None` on failure.
    fn choose_config(&self, attributes: &[EGLint], configs: &mut [NativeConfig])
                     -> Option<usize>;

    /// `eglGetConfigAttrib`.
    fn get_config_attrib(&self, config: NativeConfig, attribute: EGLint) -> Option<EGLint>;

    /// `eglCreateContext`. Returns `NativeContext::NONE` on failure.
    fn create_context(&self,
                      config: NativeConfig,
                      share_context: NativeContext,
                      attributes: &[EGLint])
                      -> NativeContext;

    /// `eglDestroyContext`.
    fn destroy_context(&self, context: NativeContext) -> bool;

    /// `eglMakeCurrent`, with the same surface for drawing and reading.
    fn make_current(&self, surface: NativeSurface, context: NativeContext) -> bool;

    /// `eglGetCurrentContext`.
    fn get_current_context(&self) -> NativeContext;

    /// `eglCreatePbufferSurface`. Returns `NativeSurface::NONE` on failure.
    fn create_pbuffer_surface(&self, config: NativeConfig, attributes: &[EGLint])
                              -> NativeSurface;

    /// `eglCreateWindowSurface`. Returns `NativeSurface::NONE` on failure.
    fn create_window_surface(&self,
                             config: NativeConfig,
                             window: NativeWindow,
                             attributes: &[EGLint])
                             -> NativeSurface;

    /// `eglDestroySurface`.
    fn destroy_surface(&self, surface: NativeSurface) -> bool;

    /// `eglQuerySurface`.
    fn query_surface(&self, surface: NativeSurface, attribute: EGLint) -> Option<EGLint>;

    /// `eglSwapBuffers`.
    fn swap_buffers(&self, surface: NativeSurface) -> bool;

    /// `eglSwapInterval`.
    fn swap_interval(&self, interval: EGLint) -> bool;

    /// `eglTerminate`.
    fn terminate(&self) -> bool;
}
