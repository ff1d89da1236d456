// surfbridge/src/platform/egl/surface.rs
//
//! Window, pbuffer, and external surfaces.

use super::config::Config;
use super::display::DisplayShared;
use super::error::ToWindowingApiError;
use super::ffi::{NativeConfig, NativeSurface, NativeWindow};
use crate::attachment::{DirtyChannel, FramebufferAttachmentObject, ImageIndex, RenderTarget};
use crate::attachment::SubjectMessage;
use crate::context::ContextID;
use crate::egl;
use crate::egl::types::EGLint;
use crate::formats::FormatInfo;
use crate::Error;

use euclid::default::Size2D;
use log::warn;
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(raw_window_handle)]
use rwh_06::{HasWindowHandle, RawWindowHandle};

/// What kind of drawable a surface is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceType {
    /// Backed by a native window; can be presented with `swap_buffers()`.
    Window,
    /// An offscreen pbuffer.
    Pbuffer,
    /// A drawable owned by the embedder, used with external contexts. There is no native
    /// surface behind it.
    External,
}

/// A drawable surface.
///
/// The native surface is destroyed when the `Surface` is dropped. A surface is also the image
/// behind a default framebuffer, so it can be bound to a `FramebufferAttachment`.
pub struct Surface {
    shared: Arc<DisplayShared>,
    ty: SurfaceType,
    native_surface: NativeSurface,
    native_config: NativeConfig,
    config: Option<Config>,
    external_size: Size2D<i32>,
    attach_count: AtomicUsize,
    dirty_channel: DirtyChannel,
}

impl Surface {
    pub(crate) fn new(shared: Arc<DisplayShared>,
                      ty: SurfaceType,
                      native_surface: NativeSurface,
                      native_config: NativeConfig,
                      config: Option<Config>)
                      -> Surface {
        Surface {
            shared,
            ty,
            native_surface,
            native_config,
            config,
            external_size: Size2D::zero(),
            attach_count: AtomicUsize::new(0),
            dirty_channel: DirtyChannel::new(),
        }
    }

    pub(crate) fn new_external(shared: Arc<DisplayShared>, size: Size2D<i32>) -> Surface {
        let mut surface = Surface::new(shared,
                                       SurfaceType::External,
                                       NativeSurface::NONE,
                                       NativeConfig::NONE,
                                       None);
        surface.external_size = size;
        surface
    }

    #[inline]
    pub fn surface_type(&self) -> SurfaceType {
        self.ty
    }

    /// The native surface, or `NativeSurface::NONE` for external surfaces.
    #[inline]
    pub fn native_surface(&self) -> NativeSurface {
        self.native_surface
    }

    #[inline]
    pub fn native_config(&self) -> NativeConfig {
        self.native_config
    }

    /// The config this surface was created with. External surfaces have none.
    #[inline]
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.ty == SurfaceType::External
    }

    pub fn width(&self) -> EGLint {
        self.query_or(egl::WIDTH as EGLint, self.external_size.width)
    }

    pub fn height(&self) -> EGLint {
        self.query_or(egl::HEIGHT as EGLint, self.external_size.height)
    }

    #[inline]
    pub fn size(&self) -> Size2D<i32> {
        Size2D::new(self.width(), self.height())
    }

    /// `EGL_BUFFER_PRESERVED` or `EGL_BUFFER_DESTROYED`.
    pub fn swap_behavior(&self) -> EGLint {
        self.query_or(egl::SWAP_BEHAVIOR as EGLint, egl::BUFFER_DESTROYED as EGLint)
    }

    fn query_or(&self, attribute: EGLint, default: EGLint) -> EGLint {
        if self.native_surface.is_none() {
            return default;
        }
        self.shared.egl.query_surface(self.native_surface, attribute).unwrap_or(default)
    }

    /// Presents a window surface.
    pub fn swap_buffers(&self) -> Result<(), Error> {
        if self.ty != SurfaceType::Window {
            return Err(Error::NoWidgetAttached);
        }
        if !self.shared.egl.swap_buffers(self.native_surface) {
            let err = self.shared.egl.get_error().to_windowing_api_error();
            return Err(Error::PresentFailed(err));
        }
        self.dirty_channel.signal(SubjectMessage::ContentsChanged);
        Ok(())
    }

    /// Sets the swap interval of the surface current on this thread.
    pub fn set_swap_interval(&self, interval: EGLint) -> Result<(), Error> {
        if !self.shared.egl.swap_interval(interval) {
            let err = self.shared.egl.get_error().to_windowing_api_error();
            return Err(Error::PresentFailed(err));
        }
        Ok(())
    }

    /// How many framebuffer attachments currently refer to this surface.
    #[inline]
    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::Acquire)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if self.native_surface.is_none() || self.shared.is_terminated() {
            return;
        }
        self.shared.forget_native_surface(self.native_surface);
        if !self.shared.egl.destroy_surface(self.native_surface) {
            let err = self.shared.egl.get_error().to_windowing_api_error();
            warn!("eglDestroySurface failed: {:?}", err);
        }
    }
}

impl Debug for Surface {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Surface({:?}, {:x})", self.ty, self.native_surface.0)
    }
}

impl FramebufferAttachmentObject for Surface {
    // Default framebuffers have no client-visible name.
    fn id(&self) -> u32 {
        0
    }

    fn on_attach(&self, _: ContextID) {
        self.attach_count.fetch_add(1, Ordering::AcqRel);
    }

    fn on_detach(&self, _: ContextID) {
        let previous = self.attach_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0);
    }

    fn attachment_size(&self, _: &ImageIndex) -> Size2D<i32> {
        self.size()
    }

    fn attachment_format(&self, binding: u32, _: &ImageIndex) -> FormatInfo {
        let config = match self.config {
            Some(ref config) => config,
            None => return FormatInfo::NONE,
        };
        match binding {
            glow::DEPTH | glow::STENCIL | glow::DEPTH_STENCIL_ATTACHMENT |
            glow::DEPTH_ATTACHMENT | glow::STENCIL_ATTACHMENT => {
                FormatInfo::from_internal_format(config.depth_stencil_format)
            }
            _ => FormatInfo::from_internal_format(config.render_target_format),
        }
    }

    fn attachment_samples(&self, _: &ImageIndex) -> i32 {
        self.config.as_ref().map_or(0, |config| config.samples)
    }

    fn attachment_render_target(&self, _: ContextID, binding: u32, image_index: &ImageIndex)
                                -> Result<RenderTarget, Error> {
        if self.native_surface.is_none() {
            return Err(Error::IncompatibleSurface);
        }
        Ok(RenderTarget {
            native_object: self.native_surface.0,
            binding,
            image_index: *image_index,
        })
    }

    fn dirty_channel(&self) -> &DirtyChannel {
        &self.dirty_channel
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(raw_window_handle)]
impl NativeWindow {
    /// Extracts the native window from a `raw-window-handle` window handle.
    ///
    /// Only window systems EGL can draw to are accepted.
    pub fn from_raw_window_handle(handle: RawWindowHandle) -> Result<NativeWindow, Error> {
        match handle {
            RawWindowHandle::Xlib(handle) => Ok(NativeWindow(handle.window as usize)),
            RawWindowHandle::Xcb(handle) => Ok(NativeWindow(handle.window.get() as usize)),
            RawWindowHandle::AndroidNdk(handle) => {
                Ok(NativeWindow(handle.a_native_window.as_ptr() as usize))
            }
            RawWindowHandle::Win32(handle) => Ok(NativeWindow(handle.hwnd.get() as usize)),
            _ => Err(Error::IncompatibleNativeWidget),
        }
    }

    /// Like `from_raw_window_handle()`, for anything that has a window handle.
    pub fn from_window<W: HasWindowHandle>(window: &W) -> Result<NativeWindow, Error> {
        let handle = window.window_handle().map_err(|_| Error::IncompatibleNativeWidget)?;
        NativeWindow::from_raw_window_handle(handle.as_raw())
    }
}
