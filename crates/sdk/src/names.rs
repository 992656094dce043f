//! Gamedata keys
//!
//! These strings must match the keys in `gamedata/camrig.json`.

/// `CameraManager` singleton (static)
pub const CAMERA_MANAGER: &str = "CameraManager";

/// `GameCamera` vtable indices
pub const VF_SET_CAMERA_LOOK_AT: &str = "GameCamera::SetCameraLookAt";
pub const VF_GET_CAMERA_POSITION: &str = "GameCamera::GetCameraPosition";
pub const VF_GET_CAMERA_TARGET: &str = "GameCamera::GetCameraTarget";
pub const VF_CAN_CHANGE_PERSPECTIVE: &str = "GameCamera::CanChangePerspective";
pub const VF_GET_ZOOM_DELTA: &str = "GameCamera::GetZoomDelta";

/// Non-virtual camera functions
pub const GET_CAMERA_AUTO_ROTATE_MODE: &str = "GameCamera::GetCameraAutoRotateMode";
pub const GET_CAMERA_MAX_MAINTAIN_DISTANCE: &str = "GameCamera::GetCameraMaxMaintainDistance";
pub const UPDATE_LOOK_AT_HEIGHT_OFFSET: &str = "GameCamera::UpdateLookAtHeightOffset";

/// Static float multiplied into every FoV step
pub const FOV_DELTA: &str = "FoVDelta";

/// Static i32 reference count; non-zero suspends player movement
pub const FORCE_DISABLE_MOVEMENT: &str = "ForceDisableMovement";

/// Call site of the camera-vs-world collision test
pub const CAMERA_COLLISION: &str = "CameraCollision";

/// Legacy-control maintain-distance computation site
pub const LEGACY_MAINTAIN_DISTANCE: &str = "LegacyMaintainDistance";

/// Collected gamedata keys for iteration
pub const GAMEDATA_KEYS: &[&str] = &[
    CAMERA_MANAGER,
    VF_SET_CAMERA_LOOK_AT,
    VF_GET_CAMERA_POSITION,
    VF_GET_CAMERA_TARGET,
    VF_CAN_CHANGE_PERSPECTIVE,
    VF_GET_ZOOM_DELTA,
    GET_CAMERA_AUTO_ROTATE_MODE,
    GET_CAMERA_MAX_MAINTAIN_DISTANCE,
    UPDATE_LOOK_AT_HEIGHT_OFFSET,
    FOV_DELTA,
    FORCE_DISABLE_MOVEMENT,
    CAMERA_COLLISION,
    LEGACY_MAINTAIN_DISTANCE,
];
