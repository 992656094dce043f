//! camrig SDK - Host Camera Type Definitions
//!
//! This crate contains the raw type definitions shared between the host-side
//! loader and the Rust core. It has no dependencies and compiles quickly,
//! allowing parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`types`] - Opaque host objects, `Vector3` and entry point signatures
//! - [`layout`] - Field offsets inside the host camera objects
//! - [`callbacks`] - Function table the loader hands over at load time
//! - [`names`] - Gamedata keys for every signature the core resolves

pub mod callbacks;
pub mod layout;
pub mod names;
pub mod types;

pub use callbacks::*;
pub use layout::{CameraLayout, CameraManagerLayout};
pub use names::GAMEDATA_KEYS;
pub use types::*;
