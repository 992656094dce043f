//! camrig Plugin - FFI Layer
//!
//! This crate provides the C ABI boundary between the host-side loader and
//! the Rust core. It compiles to a cdylib (.so/.dll).

pub mod ffi;

pub use camrig_core::shutdown;
