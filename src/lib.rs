// surfbridge/src/lib.rs
//
//! A GLES-style display backend running on top of the native EGL API.
//!
//! The crate has two halves. The `platform::egl` backend turns a cross-platform display
//! configuration into native EGL calls: it enumerates configs, creates contexts and surfaces,
//! and makes them current. By default, one native context is virtualized across every client
//! context, and a per-thread record of the native binding suppresses redundant
//! `eglMakeCurrent` calls. The `attachment` module tracks which texture, renderbuffer, or
//! surface image is bound to a framebuffer attachment point.

pub mod platform;
pub use crate::platform::egl::config::{Config, ConfigId, ConfigSet};
pub use crate::platform::egl::context::{Context, Renderer, WorkerContext};
pub use crate::platform::egl::display::{CurrentNativeContext, Display, DisplayAttributes};
pub use crate::platform::egl::display::PlatformType;
pub use crate::platform::egl::extensions::{DisplayCaps, DisplayExtensions};
pub use crate::platform::egl::functions::EglFunctions;
pub use crate::platform::egl::loader::LibEgl;
pub use crate::platform::egl::ffi::{
    NativeClientBuffer, NativeConfig, NativeContext, NativeDisplayType, NativeSurface,
    NativeWindow,
};
pub use crate::platform::egl::surface::{Surface, SurfaceType};

pub mod error;
pub use crate::error::{Error, ErrorCategory, WindowingApiError};

mod context;
pub use crate::context::{ContextAttributeFlags, ContextAttributes, ContextID};
pub use crate::context::RobustnessVideoMemoryPurgeStatus;

mod info;
pub use crate::info::GLVersion;

pub mod attachment;
pub use crate::attachment::{
    AttachmentTarget, AttachmentType, DirtyChannel, DirtyReceiver, FramebufferAttachment,
    FramebufferAttachmentObject, ImageIndex, MultiviewLayout, RenderTarget, SubjectMessage,
};

pub mod formats;
pub use crate::formats::FormatInfo;

#[allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]
#[allow(dead_code, clippy::all)]
mod egl {
    use std::os::raw::{c_long, c_void};
    pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
    pub type khronos_uint64_t = u64;
    pub type khronos_ssize_t = c_long;
    pub type EGLint = i32;
    pub type EGLNativeDisplayType = *const c_void;
    pub type EGLNativePixmapType = *const c_void;
    pub type EGLNativeWindowType = *const c_void;
    pub type NativeDisplayType = EGLNativeDisplayType;
    pub type NativePixmapType = EGLNativePixmapType;
    pub type NativeWindowType = EGLNativeWindowType;
    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
}
