//! Camera override
//!
//! - [`engine`](CameraOverrideEngine) - what each intercepted entry point returns
//! - [`host`](CameraHost) - seams to the host world and camera memory
//! - [`native`] - detours, host-memory implementations, attach/detach

mod engine;
mod host;
pub mod native;

pub use engine::{side_offset, CameraOverrideEngine, CameraView, OverrideConstants, OverrideContext};
pub use host::{CameraControl, CameraHost, CameraSeed, ObjectRef};
