// surfbridge/src/platform/egl/loader.rs
//
//! Loading the system EGL library at runtime.

use super::error::ToWindowingApiError;
use super::ffi::{NativeConfig, NativeContext, NativeDisplayType, NativeSurface, NativeWindow};
use super::functions::EglFunctions;
use crate::egl::types::{EGLConfig, EGLDisplay, EGLint};
use crate::egl::{self, Egl};
use crate::info::GLVersion;
use crate::Error;

use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::ptr;

#[cfg(not(windows_platform))]
use libc::{dlopen, dlsym, RTLD_LAZY, RTLD_LOCAL};
#[cfg(windows_platform)]
use winapi::shared::minwindef::HMODULE;
#[cfg(windows_platform)]
use winapi::um::libloaderapi;

/// Returns where the EGL library lives on this platform.
pub fn default_library_path() -> PathBuf {
    if cfg!(all(target_os = "android", target_pointer_width = "64")) {
        PathBuf::from("/system/lib64/libEGL.so")
    } else if cfg!(target_os = "android") {
        PathBuf::from("/system/lib/libEGL.so")
    } else if cfg!(target_os = "windows") {
        PathBuf::from("libEGL.dll")
    } else {
        PathBuf::from("libEGL.so.1")
    }
}

// The library is never unloaded: drivers register exit handlers that run after `main()`.
struct Library {
    #[cfg(not(windows_platform))]
    handle: *mut c_void,
    #[cfg(windows_platform)]
    handle: HMODULE,
}

impl Library {
    #[cfg(not(windows_platform))]
    fn open(path: &Path) -> Option<Library> {
        use std::os::unix::ffi::OsStrExt;

        let path = CString::new(path.as_os_str().as_bytes()).ok()?;
        unsafe {
            let handle = dlopen(path.as_ptr(), RTLD_LAZY | RTLD_LOCAL);
            if handle.is_null() {
                None
            } else {
                Some(Library { handle })
            }
        }
    }

    #[cfg(windows_platform)]
    fn open(path: &Path) -> Option<Library> {
        let path = CString::new(path.to_str()?).ok()?;
        unsafe {
            let handle = libloaderapi::LoadLibraryA(path.as_ptr());
            if handle.is_null() {
                None
            } else {
                Some(Library { handle })
            }
        }
    }

    #[cfg(not(windows_platform))]
    fn symbol(&self, symbol_name: &str) -> *const c_void {
        let symbol_name = match CString::new(symbol_name) {
            Ok(symbol_name) => symbol_name,
            Err(_) => return ptr::null(),
        };
        unsafe { dlsym(self.handle, symbol_name.as_ptr()) as *const c_void }
    }

    #[cfg(windows_platform)]
    fn symbol(&self, symbol_name: &str) -> *const c_void {
        let symbol_name = match CString::new(symbol_name) {
            Ok(symbol_name) => symbol_name,
            Err(_) => return ptr::null(),
        };
        unsafe { libloaderapi::GetProcAddress(self.handle, symbol_name.as_ptr()) as *const c_void }
    }
}

/// The system EGL library, initialized for one native display.
///
/// Opening a `LibEgl` performs `eglGetDisplay()`, `eglInitialize()` and binds the OpenGL ES
/// API. Terminating the display is left to the owner (normally a `Display`), which calls
/// `terminate()` once every object created from it is gone.
pub struct LibEgl {
    #[allow(dead_code)]
    library: Library,
    egl: Egl,
    egl_display: EGLDisplay,
    version: GLVersion,
    extensions: HashSet<String>,
}

// EGL entry points are thread-safe, and the display handle is valid on every thread.
unsafe impl Send for LibEgl {}
unsafe impl Sync for LibEgl {}

impl LibEgl {
    /// Loads the EGL library at `path` and initializes `native_display` with it.
    pub fn open(path: &Path, native_display: NativeDisplayType) -> Result<LibEgl, Error> {
        let library = Library::open(path).ok_or(Error::NoGLLibraryFound)?;
        let egl = Egl::load_with(|symbol_name| library.symbol(symbol_name));

        if let Some(name) = missing_entry_point(&egl) {
            return Err(Error::GLFunctionNotFound(name));
        }

        unsafe {
            let egl_display = egl.GetDisplay(native_display.as_ptr());
            if egl_display == egl::NO_DISPLAY {
                let err = egl.GetError().to_windowing_api_error();
                return Err(Error::DisplayInitializationFailed(err));
            }

            let (mut major_version, mut minor_version) = (0, 0);
            if egl.Initialize(egl_display, &mut major_version, &mut minor_version) == egl::FALSE {
                let err = egl.GetError().to_windowing_api_error();
                return Err(Error::DisplayInitializationFailed(err));
            }

            let extensions = query_extensions(&egl, egl_display);

            if egl.BindAPI(egl::OPENGL_ES_API) == egl::FALSE {
                let err = egl.GetError().to_windowing_api_error();
                egl.Terminate(egl_display);
                return Err(Error::DisplayInitializationFailed(err));
            }

            Ok(LibEgl {
                library,
                egl,
                egl_display,
                version: GLVersion::new(major_version as u8, minor_version as u8),
                extensions,
            })
        }
    }

    /// Loads the EGL library from its default location.
    #[inline]
    pub fn open_default(native_display: NativeDisplayType) -> Result<LibEgl, Error> {
        LibEgl::open(&default_library_path(), native_display)
    }

    /// The set of extension strings the display advertises.
    #[inline]
    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }
}

unsafe fn query_extensions(egl: &Egl, egl_display: EGLDisplay) -> HashSet<String> {
    let extensions = egl.QueryString(egl_display, egl::EXTENSIONS as EGLint);
    if extensions.is_null() {
        return HashSet::new();
    }
    CStr::from_ptr(extensions)
        .to_string_lossy()
        .split_whitespace()
        .map(|extension| extension.to_owned())
        .collect()
}

fn attrib_ptr(attributes: &[EGLint]) -> *const EGLint {
    if attributes.is_empty() {
        ptr::null()
    } else {
        attributes.as_ptr()
    }
}

// Every entry point `LibEgl` calls. Missing ones are reported up front rather than panicking
// on first use.
pub(crate) fn missing_entry_point(egl: &Egl) -> Option<&'static str> {
    let entry_points = [
        ("eglGetDisplay", egl.GetDisplay.is_loaded()),
        ("eglInitialize", egl.Initialize.is_loaded()),
        ("eglTerminate", egl.Terminate.is_loaded()),
        ("eglGetError", egl.GetError.is_loaded()),
        ("eglQueryString", egl.QueryString.is_loaded()),
        ("eglBindAPI", egl.BindAPI.is_loaded()),
        ("eglChooseConfig", egl.ChooseConfig.is_loaded()),
        ("eglGetConfigAttrib", egl.GetConfigAttrib.is_loaded()),
        ("eglCreateContext", egl.CreateContext.is_loaded()),
        ("eglDestroyContext", egl.DestroyContext.is_loaded()),
        ("eglMakeCurrent", egl.MakeCurrent.is_loaded()),
        ("eglGetCurrentContext", egl.GetCurrentContext.is_loaded()),
        ("eglCreatePbufferSurface", egl.CreatePbufferSurface.is_loaded()),
        ("eglCreateWindowSurface", egl.CreateWindowSurface.is_loaded()),
        ("eglDestroySurface", egl.DestroySurface.is_loaded()),
        ("eglQuerySurface", egl.QuerySurface.is_loaded()),
        ("eglSwapBuffers", egl.SwapBuffers.is_loaded()),
        ("eglSwapInterval", egl.SwapInterval.is_loaded()),
    ];
    entry_points.iter().find(|&&(_, loaded)| !loaded).map(|&(name, _)| name)
}

impl EglFunctions for LibEgl {
    #[inline]
    fn version(&self) -> GLVersion {
        self.version
    }

    #[inline]
    fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    fn get_error(&self) -> EGLint {
        unsafe { self.egl.GetError() }
    }

    fn choose_config(&self, attributes: &[EGLint], configs: &mut [NativeConfig])
                     -> Option<usize> {
        let mut egl_configs: Vec<EGLConfig> = vec![ptr::null(); configs.len()];
        let egl_configs_ptr = if egl_configs.is_empty() {
            ptr::null_mut()
        } else {
            egl_configs.as_mut_ptr()
        };

        let mut config_count = 0;
        unsafe {
            let result = self.egl.ChooseConfig(self.egl_display,
                                               attrib_ptr(attributes),
                                               egl_configs_ptr,
                                               egl_configs.len() as EGLint,
                                               &mut config_count);
            if result == egl::FALSE {
                return None;
            }
        }

        let config_count = config_count.max(0) as usize;
        for (config, &egl_config) in configs.iter_mut().zip(egl_configs.iter()).take(config_count) {
            *config = NativeConfig::from_ptr(egl_config);
        }
        Some(config_count)
    }

    fn get_config_attrib(&self, config: NativeConfig, attribute: EGLint) -> Option<EGLint> {
        let mut value = 0;
        unsafe {
            let result = self.egl.GetConfigAttrib(self.egl_display,
                                                  config.as_ptr(),
                                                  attribute,
                                                  &mut value);
            if result == egl::FALSE {
                None
            } else {
                Some(value)
            }
        }
    }

    fn create_context(&self,
                      config: NativeConfig,
                      share_context: NativeContext,
                      attributes: &[EGLint])
                      -> NativeContext {
        unsafe {
            NativeContext::from_ptr(self.egl.CreateContext(self.egl_display,
                                                           config.as_ptr(),
                                                           share_context.as_ptr(),
                                                           attrib_ptr(attributes)))
        }
    }

    fn destroy_context(&self, context: NativeContext) -> bool {
        unsafe { self.egl.DestroyContext(self.egl_display, context.as_ptr()) != egl::FALSE }
    }

    fn make_current(&self, surface: NativeSurface, context: NativeContext) -> bool {
        unsafe {
            self.egl.MakeCurrent(self.egl_display,
                                 surface.as_ptr(),
                                 surface.as_ptr(),
                                 context.as_ptr()) != egl::FALSE
        }
    }

    fn get_current_context(&self) -> NativeContext {
        unsafe { NativeContext::from_ptr(self.egl.GetCurrentContext()) }
    }

    fn create_pbuffer_surface(&self, config: NativeConfig, attributes: &[EGLint])
                              -> NativeSurface {
        unsafe {
            NativeSurface::from_ptr(self.egl.CreatePbufferSurface(self.egl_display,
                                                                  config.as_ptr(),
                                                                  attrib_ptr(attributes)))
        }
    }

    fn create_window_surface(&self,
                             config: NativeConfig,
                             window: NativeWindow,
                             attributes: &[EGLint])
                             -> NativeSurface {
        unsafe {
            NativeSurface::from_ptr(self.egl.CreateWindowSurface(self.egl_display,
                                                                 config.as_ptr(),
                                                                 window.as_ptr(),
                                                                 attrib_ptr(attributes)))
        }
    }

    fn destroy_surface(&self, surface: NativeSurface) -> bool {
        unsafe { self.egl.DestroySurface(self.egl_display, surface.as_ptr()) != egl::FALSE }
    }

    fn query_surface(&self, surface: NativeSurface, attribute: EGLint) -> Option<EGLint> {
        let mut value = 0;
        unsafe {
            let result = self.egl.QuerySurface(self.egl_display,
                                               surface.as_ptr(),
                                               attribute,
                                               &mut value);
            if result == egl::FALSE {
                None
            } else {
                Some(value)
            }
        }
    }

    fn swap_buffers(&self, surface: NativeSurface) -> bool {
        unsafe { self.egl.SwapBuffers(self.egl_display, surface.as_ptr()) != egl::FALSE }
    }

    fn swap_interval(&self, interval: EGLint) -> bool {
        unsafe { self.egl.SwapInterval(self.egl_display, interval) != egl::FALSE }
    }

    fn terminate(&self) -> bool {
        unsafe { self.egl.Terminate(self.egl_display) != egl::FALSE }
    }
}
