// surfbridge/src/platform/egl/mod.rs
//
//! The EGL display backend.
//!
//! `Display` owns the native EGL function table and hands out `Context`s and `Surface`s. The
//! native API is reached through the `EglFunctions` trait, which `LibEgl` implements by
//! loading the system EGL library at runtime.

pub mod config;
pub mod context;
pub mod display;
pub(crate) mod error;
pub mod extensions;
pub mod ffi;
pub mod functions;
pub mod loader;
pub mod surface;
