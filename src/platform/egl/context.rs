// surfbridge/src/platform/egl/context.rs
//
//! Native contexts and the client contexts that sit on top of them.

use super::display::DisplayShared;
use super::ffi::{NativeContext, NativeSurface};
use super::error::ToWindowingApiError;
use super::functions::EglFunctions;
use crate::context::RobustnessVideoMemoryPurgeStatus;
use crate::egl;
use crate::egl::types::EGLint;
use crate::{ContextAttributes, ContextID, Error, GLVersion};

use log::error;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A native context plus what it was created with.
///
/// When contexts are virtualized, every client context shares the display's renderer. The
/// native context is destroyed when the last reference to a non-external renderer goes away.
pub struct Renderer {
    shared: Arc<DisplayShared>,
    context: NativeContext,
    attributes: Vec<EGLint>,
    is_external: bool,
    max_es_version: GLVersion,
}

impl Renderer {
    pub(crate) fn new(shared: Arc<DisplayShared>,
                      context: NativeContext,
                      attributes: Vec<EGLint>,
                      is_external: bool)
                      -> Renderer {
        let max_es_version = es_version_from_attributes(&attributes);
        Renderer { shared, context, attributes, is_external, max_es_version }
    }

    #[inline]
    pub fn native_context(&self) -> NativeContext {
        self.context
    }

    /// The `EGL_NONE`-terminated attribute list the native context was created with.
    #[inline]
    pub fn attributes(&self) -> &[EGLint] {
        &self.attributes
    }

    /// Whether this renderer wraps a context owned by the embedder.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// The highest OpenGL ES version the native context provides.
    #[inline]
    pub fn max_supported_es_version(&self) -> GLVersion {
        self.max_es_version
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if !self.is_external {
            self.shared.destroy_native_context(self.context);
        }
    }
}

impl Debug for Renderer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Renderer({:x}, ES {})", self.context.0, self.max_es_version)
    }
}

// `EGL_CONTEXT_CLIENT_VERSION` and `EGL_CONTEXT_MAJOR_VERSION` are the same token.
fn es_version_from_attributes(attributes: &[EGLint]) -> GLVersion {
    let (mut major, mut minor) = (0, 0);
    for pair in attributes.chunks(2) {
        match pair {
            [name, _] if *name == egl::NONE as EGLint => break,
            [name, value] if *name == egl::CONTEXT_MAJOR_VERSION as EGLint => major = *value,
            [name, value] if *name == egl::CONTEXT_MINOR_VERSION as EGLint => minor = *value,
            _ => {}
        }
    }
    GLVersion::new(major.max(0) as u8, minor.max(0) as u8)
}

/// A client context.
///
/// Client contexts are cheap: all of the native state lives in the shared `Renderer`.
pub struct Context {
    id: ContextID,
    renderer: Arc<Renderer>,
    robustness_video_memory_purge: RobustnessVideoMemoryPurgeStatus,
    is_external: bool,
}

impl Context {
    pub(crate) fn new(renderer: Arc<Renderer>, attributes: &ContextAttributes) -> Context {
        Context {
            id: ContextID::next(),
            renderer,
            robustness_video_memory_purge: attributes.flags.into(),
            is_external: attributes.is_external(),
        }
    }

    #[inline]
    pub fn id(&self) -> ContextID {
        self.id
    }

    #[inline]
    pub fn native_context(&self) -> NativeContext {
        self.renderer.native_context()
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    #[inline]
    pub fn robustness_video_memory_purge(&self) -> RobustnessVideoMemoryPurgeStatus {
        self.robustness_video_memory_purge
    }

    #[inline]
    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Context({:?}, {:?})", self.id, self.renderer)
    }
}

/// A context for background work, such as parallel shader compilation.
///
/// Worker contexts share objects with a client context but are bound directly, outside of the
/// display's per-thread bookkeeping.
pub struct WorkerContext {
    shared: Arc<DisplayShared>,
    context: NativeContext,
    pbuffer: NativeSurface,
}

impl WorkerContext {
    pub(crate) fn new(shared: Arc<DisplayShared>, context: NativeContext, pbuffer: NativeSurface)
                      -> WorkerContext {
        WorkerContext { shared, context, pbuffer }
    }

    #[inline]
    fn egl(&self) -> &dyn EglFunctions {
        &*self.shared.egl
    }

    #[inline]
    pub fn native_context(&self) -> NativeContext {
        self.context
    }

    /// Binds this worker context to the calling thread.
    pub fn make_current(&self) -> Result<(), Error> {
        if self.shared.is_terminated() {
            return Err(Error::DisplayTerminated);
        }
        if !self.egl().make_current(self.pbuffer, self.context) {
            let err = self.egl().get_error().to_windowing_api_error();
            error!("Unable to make the EGL context current.");
            return Err(Error::MakeCurrentFailed(err));
        }
        Ok(())
    }

    /// Unbinds whatever is current on the calling thread.
    pub fn unmake_current(&self) {
        self.egl().make_current(NativeSurface::NONE, NativeContext::NONE);
    }
}

impl Drop for WorkerContext {
    fn drop(&mut self) {
        if self.shared.is_terminated() {
            return;
        }
        if !self.egl().destroy_context(self.context) {
            let err = self.egl().get_error().to_windowing_api_error();
            error!("eglDestroyContext error {:?}", err);
        }
    }
}

impl Debug for WorkerContext {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "WorkerContext({:x})", self.context.0)
    }
}
