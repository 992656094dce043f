//! Host camera type definitions
//!
//! The host objects are opaque: their fields are reached through the offsets
//! in [`crate::layout`], never through Rust struct fields.

/// Host-side `Bool` (one byte, non-zero is true)
pub type HostBool = u8;

/// Three floats, laid out exactly like the host's vector type
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Opaque type for the host camera (world camera, idle camera, ...)
/// The first member is the vtable pointer.
#[repr(C)]
pub struct GameCamera {
    _opaque: [u8; 0],
}

/// Opaque type for the host camera manager
/// Holds pointers to every camera the host knows about.
#[repr(C)]
pub struct CameraManager {
    _opaque: [u8; 0],
}

/// Opaque type for a host game object (players, NPCs, ...)
#[repr(C)]
pub struct GameObject {
    _opaque: [u8; 0],
}

/// Opaque type for the host framework singleton
#[repr(C)]
pub struct Framework {
    _opaque: [u8; 0],
}

/// Per-frame input the loader samples for the free camera.
///
/// Move axes are in [-1, 1]: `move_x` strafes right, `move_y` rises,
/// `move_z` moves forward. Look deltas are radians accumulated this frame.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub move_x: f32,
    pub move_y: f32,
    pub move_z: f32,
    pub look_x: f32,
    pub look_y: f32,
    /// Multiplier on top of the configured speed (sprint / crawl keys)
    pub speed_multiplier: f32,
}

// Camera vtable entries

/// `GameCamera::SetCameraLookAt(camera, lookAt, cameraPosition, unused)`
pub type SetCameraLookAtFn =
    unsafe extern "C" fn(*mut GameCamera, *mut Vector3, *mut Vector3, *mut Vector3);

/// `GameCamera::GetCameraPosition(camera, target, outPosition, swapPerson)`
pub type GetCameraPositionFn =
    unsafe extern "C" fn(*mut GameCamera, *mut GameObject, *mut Vector3, HostBool);

/// `GameCamera::GetCameraTarget(camera)`
pub type GetCameraTargetFn = unsafe extern "C" fn(*mut GameCamera) -> *mut GameObject;

/// `GameCamera::CanChangePerspective(camera)`
pub type CanChangePerspectiveFn = unsafe extern "C" fn(*mut GameCamera) -> HostBool;

/// `GameCamera::GetZoomDelta(camera)`
pub type GetZoomDeltaFn = unsafe extern "C" fn(*mut GameCamera) -> f32;

// Non-virtual camera functions

/// `GameCamera::GetCameraAutoRotateMode(camera, framework)`
pub type GetCameraAutoRotateModeFn = unsafe extern "C" fn(*mut GameCamera, *mut Framework) -> u8;

/// `GameCamera::GetCameraMaxMaintainDistance(camera)`
pub type GetCameraMaxMaintainDistanceFn = unsafe extern "C" fn(*mut GameCamera) -> f32;

/// `GameCamera::UpdateLookAtHeightOffset(camera, object, zero)`
pub type UpdateLookAtHeightOffsetFn =
    unsafe extern "C" fn(*mut GameCamera, *mut GameObject, HostBool) -> HostBool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector3_layout() {
        assert_eq!(std::mem::size_of::<Vector3>(), 12);
        assert!(Vector3::ZERO.is_zero());
        assert!(!Vector3::new(0.0, 1.0, 0.0).is_zero());
    }

    #[test]
    fn test_frame_input_layout() {
        assert_eq!(std::mem::size_of::<FrameInput>(), 24);
    }
}
