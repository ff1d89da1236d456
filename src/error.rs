// surfbridge/src/error.rs
//
//! Various errors that methods can produce.

use crate::info::GLVersion;

use std::fmt::{self, Display, Formatter};

/// Various errors that methods can produce.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The method failed for a miscellaneous reason.
    Failed,
    /// The backend supports this method in theory, but the functionality isn't implemented.
    Unimplemented,
    /// The display was used after `terminate()`.
    DisplayTerminated,
    /// The system EGL library couldn't be located.
    NoGLLibraryFound,
    /// Looking up a mandatory EGL function address failed.
    GLFunctionNotFound(&'static str),
    /// `eglGetDisplay` or `eglInitialize` failed.
    DisplayInitializationFailed(WindowingApiError),
    /// The native EGL implementation is older than the required version.
    UnsupportedEGLVersion(GLVersion),
    /// None of the renderable types for the requested platform can be used.
    NoRenderableTypes,
    /// The best context that could be created does not support OpenGL ES 2.0.
    UnsupportedGLVersion(GLVersion),
    /// A requested attribute or attribute value is not supported.
    BadAttribute(&'static str),
    /// Choosing an EGL config failed.
    PixelFormatSelectionFailed(WindowingApiError),
    /// The system couldn't choose an EGL config.
    NoPixelFormatFound,
    /// The internal config ID doesn't name a config exposed by this display.
    BadConfig,
    /// The system couldn't create an EGL context.
    ContextCreationFailed(WindowingApiError),
    /// A worker context couldn't be created; carries the info log.
    WorkerContextCreationFailed(String),
    /// The system couldn't make the context current or not current.
    MakeCurrentFailed(WindowingApiError),
    /// An external context was requested, but no native context is current.
    NoCurrentContext,
    /// External contexts can't share with another context.
    IncompatibleSharedContext,
    /// The system couldn't create a surface.
    SurfaceCreationFailed(WindowingApiError),
    /// The surface is not usable for this operation or with this context.
    IncompatibleSurface,
    /// The system couldn't present a widget surface.
    PresentFailed(WindowingApiError),
    /// The surface has no window attachment.
    NoWidgetAttached,
    /// The native widget type is not supported by EGL.
    IncompatibleNativeWidget,
    /// The client buffer type or image target is not supported.
    UnsupportedClientBuffer(u32),
    /// The client buffer doesn't satisfy the requirements of its type.
    InvalidClientBuffer,
    /// The attachment has no resource bound.
    NotAttached,
}

/// The coarse categories every [`Error`] falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The display or a required native object couldn't be brought up.
    NotInitialized,
    /// The caller asked for something the native implementation doesn't support.
    BadAttribute,
    /// A native call failed; see [`Error::native_error`] for the underlying code.
    Failed,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match *self {
            Error::DisplayTerminated
            | Error::NoGLLibraryFound
            | Error::GLFunctionNotFound(_)
            | Error::DisplayInitializationFailed(_)
            | Error::UnsupportedEGLVersion(_)
            | Error::NoRenderableTypes
            | Error::UnsupportedGLVersion(_)
            | Error::PixelFormatSelectionFailed(_)
            | Error::NoPixelFormatFound => ErrorCategory::NotInitialized,
            Error::BadAttribute(_)
            | Error::BadConfig
            | Error::IncompatibleSharedContext
            | Error::IncompatibleSurface
            | Error::IncompatibleNativeWidget
            | Error::UnsupportedClientBuffer(_)
            | Error::InvalidClientBuffer => ErrorCategory::BadAttribute,
            Error::Failed
            | Error::Unimplemented
            | Error::ContextCreationFailed(_)
            | Error::WorkerContextCreationFailed(_)
            | Error::MakeCurrentFailed(_)
            | Error::NoCurrentContext
            | Error::SurfaceCreationFailed(_)
            | Error::PresentFailed(_)
            | Error::NoWidgetAttached
            | Error::NotAttached => ErrorCategory::Failed,
        }
    }

    /// Returns the native error attached to this error, if there is one.
    pub fn native_error(&self) -> Option<WindowingApiError> {
        match *self {
            Error::DisplayInitializationFailed(err)
            | Error::PixelFormatSelectionFailed(err)
            | Error::ContextCreationFailed(err)
            | Error::MakeCurrentFailed(err)
            | Error::SurfaceCreationFailed(err)
            | Error::PresentFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Error::Failed => f.write_str("operation failed"),
            Error::Unimplemented => f.write_str("not implemented"),
            Error::DisplayTerminated => f.write_str("the display has been terminated"),
            Error::NoGLLibraryFound => f.write_str("the EGL library could not be loaded"),
            Error::GLFunctionNotFound(name) => write!(f, "EGL function {} not found", name),
            Error::DisplayInitializationFailed(err) => {
                write!(f, "EGL display initialization failed with {:?}", err)
            }
            Error::UnsupportedEGLVersion(version) => {
                write!(f, "EGL >= 1.4 is required, but {} is available", version)
            }
            Error::NoRenderableTypes => f.write_str("no available renderable types"),
            Error::UnsupportedGLVersion(version) => write!(
                f,
                "OpenGL ES 2.0 is not supportable (maximum version {})",
                version
            ),
            Error::BadAttribute(what) => write!(f, "bad attribute: {}", what),
            Error::PixelFormatSelectionFailed(err) => {
                write!(f, "eglChooseConfig failed with {:?}", err)
            }
            Error::NoPixelFormatFound => f.write_str("no matching EGL config"),
            Error::BadConfig => f.write_str("unknown config"),
            Error::ContextCreationFailed(err) => {
                write!(f, "eglCreateContext failed with {:?}", err)
            }
            Error::WorkerContextCreationFailed(ref log) => f.write_str(log),
            Error::MakeCurrentFailed(err) => write!(f, "eglMakeCurrent failed with {:?}", err),
            Error::NoCurrentContext => f.write_str("no native context is current"),
            Error::IncompatibleSharedContext => {
                f.write_str("external contexts cannot share with another context")
            }
            Error::SurfaceCreationFailed(err) => {
                write!(f, "EGL surface creation failed with {:?}", err)
            }
            Error::IncompatibleSurface => f.write_str("incompatible surface"),
            Error::PresentFailed(err) => write!(f, "eglSwapBuffers failed with {:?}", err),
            Error::NoWidgetAttached => f.write_str("the surface has no window attached"),
            Error::IncompatibleNativeWidget => f.write_str("unsupported native window type"),
            Error::UnsupportedClientBuffer(target) => {
                write!(f, "unsupported client buffer type {:#x}", target)
            }
            Error::InvalidClientBuffer => f.write_str("invalid client buffer"),
            Error::NotAttached => f.write_str("the attachment has no resource"),
        }
    }
}

impl std::error::Error for Error {}

/// Abstraction of the errors that EGL returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowingApiError {
    /// Miscellaneous error.
    Failed,
    /// EGL is not initialized, or could not be initialized, for the specified EGL display
    /// connection.
    NotInitialized,
    /// EGL cannot access a requested resource (for example a context is bound in another
    /// thread).
    BadAccess,
    /// EGL failed to allocate resources for the requested operation.
    BadAlloc,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    BadAttribute,
    /// An EGLConfig argument does not name a valid EGL frame buffer configuration.
    BadConfig,
    /// An EGLContext argument does not name a valid EGL rendering context.
    BadContext,
    /// The current surface of the calling thread is a window, pixel buffer or pixmap that is
    /// no longer valid.
    BadCurrentSurface,
    /// An EGLDisplay argument does not name a valid EGL display connection.
    BadDisplay,
    /// An EGLSurface argument does not name a valid surface (window, pixel buffer or pixmap)
    /// configured for GL rendering.
    BadSurface,
    /// Arguments are inconsistent (for example, a valid context requires buffers not supplied
    /// by a valid surface).
    BadMatch,
    /// One or more argument values are invalid.
    BadParameter,
    /// A NativePixmapType argument does not refer to a valid native pixmap.
    BadNativePixmap,
    /// A NativeWindowType argument does not refer to a valid native window.
    BadNativeWindow,
    /// A power management event has occurred. The application must destroy all contexts and
    /// reinitialise OpenGL ES state and objects to continue rendering.
    ContextLost,
    /// An error code this crate doesn't know about.
    Unknown(i32),
}
