//! camrig Engine - Host Validation and Global Storage
//!
//! This crate handles:
//! - Validating what the loader hands over (module range, callback table)
//! - Storing it in a thread-safe global static
//! - Providing access to host state throughout the framework
//!
//! # Architecture
//!
//! The host is described once during plugin load via [`loader::load_host`]
//! and stored in [`globals::HostGlobals`]. Access is provided via the
//! [`try_host()`] function.
//!
//! # Thread Safety
//!
//! The module range and callbacks are valid for the plugin's lifetime. The
//! camera manager slot is the only state written after load.

pub mod error;
pub mod globals;
pub mod loader;

pub use error::HostError;
pub use globals::{init_host, is_host_initialized, try_host, HostGlobals};
pub use loader::{load_host, HostModule};
