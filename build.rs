// surfbridge/build.rs
//
//! The `surfbridge` build script.

use cfg_aliases::cfg_aliases;
use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::PathBuf;

fn main() {
    // Setup aliases for #[cfg] checks
    cfg_aliases! {
        // Platforms
        windows_platform: { target_os = "windows" },
        android_platform: { target_os = "android" },
        free_unix: { all(unix, not(target_os = "android")) },

        // Features:
        raw_window_handle: { any(android_platform, feature = "sm-raw-window-handle-06") },
    }

    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    // Generate the EGL function table. Every backend goes through `libEGL`, so this is
    // unconditional.
    let mut file = File::create(dest.join("egl_bindings.rs")).unwrap();
    let registry = Registry::new(Api::Egl, (1, 5), Profile::Core, Fallbacks::All, []);
    registry.write_bindings(StructGenerator, &mut file).unwrap();
}
