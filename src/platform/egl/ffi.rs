// surfbridge/src/platform/egl/ffi.rs
//
//! Native handle types, plus the extension tokens that aren't part of core EGL 1.5.

use crate::egl::types::{EGLenum, EGLint};

use std::os::raw::c_void;

macro_rules! native_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub usize);

        impl $name {
            /// The null handle.
            pub const NONE: $name = $name(0);

            #[inline]
            pub fn is_none(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub(crate) fn from_ptr(ptr: *const c_void) -> $name {
                $name(ptr as usize)
            }

            #[inline]
            pub(crate) fn as_ptr(self) -> *const c_void {
                self.0 as *const c_void
            }
        }
    };
}

native_handle! {
    /// An `EGLConfig`. `NONE` is `EGL_NO_CONFIG_KHR`.
    NativeConfig
}

native_handle! {
    /// An `EGLContext`. `NONE` is `EGL_NO_CONTEXT`.
    NativeContext
}

native_handle! {
    /// An `EGLSurface`. `NONE` is `EGL_NO_SURFACE`.
    NativeSurface
}

native_handle! {
    /// An `EGLNativeWindowType`: an `ANativeWindow*`, an X11 `Window`, an `HWND`, etc.
    NativeWindow
}

native_handle! {
    /// An `EGLNativeDisplayType`. `NONE` is `EGL_DEFAULT_DISPLAY`.
    NativeDisplayType
}

native_handle! {
    /// An `EGLClientBuffer`.
    NativeClientBuffer
}

pub const GL_TRUE: EGLint = 1;

pub const EGL_NO_CONFIG_KHR: NativeConfig = NativeConfig::NONE;

pub const EGL_LINUX_DMA_BUF_EXT: EGLenum = 0x3270;
pub const EGL_COLOR_COMPONENT_TYPE_EXT: EGLint = 0x3339;
pub const EGL_COLOR_COMPONENT_TYPE_FIXED_EXT: EGLint = 0x333a;
pub const EGL_COLOR_COMPONENT_TYPE_FLOAT_EXT: EGLint = 0x333b;
pub const EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV: EGLint = 0x334c;
pub const EGL_EXTERNAL_SURFACE_ANGLE: EGLenum = 0x348f;
