//! Host seams used by the override engine and the runtime
//!
//! [`CameraHost`] answers queries about the world (targets, conditions,
//! skeleton); [`CameraControl`] writes to the live camera and the raw memory
//! sites. Both are implemented over raw host memory in `native` and by fakes
//! in tests.

use glam::{Vec2, Vec3};

use crate::conditions::{ConditionSets, HostConditions};
use crate::presets::Preset;

/// Address of a host object, compared by identity only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub usize);

impl ObjectRef {
    pub fn from_ptr<T>(ptr: *mut T) -> Option<Self> {
        (!ptr.is_null()).then_some(Self(ptr as usize))
    }

    pub fn as_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

/// Read-only world queries
pub trait CameraHost: Send + Sync {
    fn local_player(&self) -> Option<ObjectRef>;
    fn focus_target(&self) -> Option<ObjectRef>;
    fn soft_target(&self) -> Option<ObjectRef>;
    fn hard_target(&self) -> Option<ObjectRef>;
    fn conditions(&self) -> HostConditions;

    /// World-space position of a skeleton bone; None when unavailable
    fn bone_position(&self, object: ObjectRef, bone: i32) -> Option<Vec3>;

    fn condition_sets(&self) -> &dyn ConditionSets;
}

/// Camera values sampled when the free camera is switched on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSeed {
    pub position: Vec3,
    /// Horizontal and vertical rotation in radians
    pub rotation: Vec2,
}

/// Writes to the live camera and the raw memory sites
pub trait CameraControl: Send + Sync {
    /// Read the live camera into a preset (Default capture)
    fn snapshot(&self) -> Option<Preset>;

    /// Write a preset's bounds into the live camera
    fn apply_preset(&mut self, preset: &Preset, logging_in: bool);

    fn set_zoom(&mut self, zoom: f32) -> bool;
    fn set_fov(&mut self, fov: f32) -> bool;

    /// Current scene position and rotation
    fn seed(&self) -> Option<CameraSeed>;

    /// Add `delta` to the host's movement-disable reference count
    fn adjust_movement_lock(&mut self, delta: i32);

    /// Apply or remove the collision patch; returns whether it was applied before
    fn set_collision_disabled(&mut self, disabled: bool) -> bool;

    fn collision_disabled(&self) -> bool;
}
