//! Field offsets inside host camera objects
//!
//! Defaults match the host version the bundled gamedata was written for.
//! Every offset can be overridden from the gamedata `offsets` section.

/// Offsets of the fields the core reads or writes on a `GameCamera`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraLayout {
    /// Scene camera position (three floats)
    pub scene_position: usize,
    /// Scene camera look-at point (three floats)
    pub scene_look_at: usize,
    pub current_zoom: usize,
    pub min_zoom: usize,
    pub max_zoom: usize,
    pub current_fov: usize,
    pub min_fov: usize,
    pub max_fov: usize,
    pub current_h_rotation: usize,
    pub current_v_rotation: usize,
    pub min_v_rotation: usize,
    pub max_v_rotation: usize,
    pub tilt: usize,
    /// Camera mode (i32): 0 is first person, 1 is the standard orbit
    pub mode: usize,
    pub look_at_height_offset: usize,
}

impl Default for CameraLayout {
    fn default() -> Self {
        Self {
            scene_position: 0x60,
            scene_look_at: 0x90,
            current_zoom: 0x114,
            min_zoom: 0x118,
            max_zoom: 0x11C,
            current_fov: 0x120,
            min_fov: 0x124,
            max_fov: 0x128,
            current_h_rotation: 0x130,
            current_v_rotation: 0x134,
            min_v_rotation: 0x148,
            max_v_rotation: 0x14C,
            tilt: 0x160,
            mode: 0x170,
            look_at_height_offset: 0x218,
        }
    }
}

/// Offsets of the camera pointers held by the `CameraManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraManagerLayout {
    pub world_camera: usize,
}

impl Default for CameraManagerLayout {
    fn default() -> Self {
        Self { world_camera: 0x0 }
    }
}
