//! Hook callback bodies
//!
//! Each method decides what one intercepted entry point returns. Free camera
//! wins over everything; then the active preset; with no active preset the
//! original behaviour is left untouched. Calls through to the original are
//! passed in as closures so the decisions stay independent of the hook
//! mechanism.

use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use super::host::{CameraHost, ObjectRef};
use crate::conditions::HostConditions;
use crate::config::DeathCamMode;
use crate::freecam::FreeCamPose;
use crate::presets::Preset;

/// Host-version specific constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideConstants {
    /// Max-maintain-distance results below this are replaced by max zoom
    pub maintain_distance_threshold: f32,
    /// Subtracted from the horizontal rotation before projecting the side offset
    pub side_offset_phase: f32,
    /// Auto-rotate mode reported while the camera is externally driven
    pub locked_auto_rotate_mode: u8,
    /// Camera mode in which the side offset applies
    pub standard_orbit_mode: i32,
    pub first_person_mode: i32,
    /// Skeleton bone followed when view bobbing
    pub anchor_bone: i32,
}

impl Default for OverrideConstants {
    fn default() -> Self {
        Self {
            maintain_distance_threshold: 10.0,
            side_offset_phase: FRAC_PI_2,
            locked_auto_rotate_mode: 4,
            standard_orbit_mode: 1,
            first_person_mode: 0,
            anchor_bone: 26,
        }
    }
}

/// State consulted on each intercepted call
#[derive(Clone, Copy)]
pub struct OverrideContext<'a> {
    pub preset: Option<&'a Preset>,
    /// Present while the free camera is enabled
    pub free_cam: Option<FreeCamPose>,
    pub death_cam_mode: DeathCamMode,
    pub host: &'a dyn CameraHost,
}

impl OverrideContext<'_> {
    fn free_cam_enabled(&self) -> bool {
        self.free_cam.is_some()
    }
}

/// Fields of the camera being queried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub mode: i32,
    pub h_rotation: f32,
    pub max_zoom: f32,
}

/// Lateral world offset for a side offset at horizontal rotation `rotation`
pub fn side_offset(offset: f32, rotation: f32, phase: f32) -> Vec3 {
    let a = rotation - phase;
    Vec3::new(-offset * a.sin(), 0.0, -offset * a.cos())
}

#[derive(Debug, Default)]
pub struct CameraOverrideEngine {
    constants: OverrideConstants,
    spectate_enabled: bool,
    /// Set by the target query, read by the auto-rotate query
    spectating: AtomicBool,
}

impl CameraOverrideEngine {
    pub fn new(constants: OverrideConstants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    pub fn constants(&self) -> &OverrideConstants {
        &self.constants
    }

    pub fn spectate_enabled(&self) -> bool {
        self.spectate_enabled
    }

    pub fn set_spectate_enabled(&mut self, enabled: bool) {
        self.spectate_enabled = enabled;
        if !enabled {
            self.spectating.store(false, Ordering::Relaxed);
        }
    }

    pub fn is_spectating(&self) -> bool {
        self.spectating.load(Ordering::Relaxed)
    }

    /// Camera position query
    ///
    /// `target` runs the target query, which also refreshes the spectating
    /// flag; `original` computes the host's own position.
    pub fn camera_position(
        &self,
        ctx: &OverrideContext<'_>,
        view: &CameraView,
        target: impl FnOnce() -> Option<ObjectRef>,
        original: impl FnOnce() -> Vec3,
    ) -> Vec3 {
        if let Some(pose) = ctx.free_cam {
            return pose.position;
        }

        let target = target();
        let Some(preset) = ctx.preset else {
            return original();
        };

        let first_person = view.mode == self.constants.first_person_mode;
        let anchor = if preset.view_bobbing(first_person, ctx.host.conditions()) {
            target.and_then(|t| ctx.host.bone_position(t, self.constants.anchor_bone))
        } else {
            None
        };

        let mut position = anchor.unwrap_or_else(original);
        position.y += preset.height_offset;

        if preset.side_offset != 0.0 && view.mode == self.constants.standard_orbit_mode {
            position += side_offset(
                preset.side_offset,
                view.h_rotation,
                self.constants.side_offset_phase,
            );
        }

        position
    }

    /// Camera target query
    pub fn camera_target(
        &self,
        ctx: &OverrideContext<'_>,
        original: impl FnOnce() -> Option<ObjectRef>,
    ) -> Option<ObjectRef> {
        if self.spectate_enabled {
            if let Some(target) = ctx
                .host
                .focus_target()
                .or_else(|| ctx.host.soft_target())
            {
                self.spectating.store(true, Ordering::Relaxed);
                return Some(target);
            }
        }

        if ctx.death_cam_mode == DeathCamMode::Watch
            && ctx.host.conditions().contains(HostConditions::UNCONSCIOUS)
        {
            if let Some(target) = ctx.host.hard_target() {
                self.spectating.store(true, Ordering::Relaxed);
                return Some(target);
            }
        }

        self.spectating.store(false, Ordering::Relaxed);
        original()
    }

    /// Look-at setter; returns the pose to write over the host's arguments
    /// while the free camera owns the view
    pub fn set_look_at(&self, ctx: &OverrideContext<'_>) -> Option<FreeCamPose> {
        ctx.free_cam
    }

    pub fn zoom_delta(&self, ctx: &OverrideContext<'_>, original: impl FnOnce() -> f32) -> f32 {
        match ctx.preset {
            Some(preset) => preset.zoom_delta,
            None => original(),
        }
    }

    pub fn can_change_perspective(&self, ctx: &OverrideContext<'_>) -> bool {
        !ctx.free_cam_enabled()
    }

    pub fn auto_rotate_mode(&self, ctx: &OverrideContext<'_>, original: impl FnOnce() -> u8) -> u8 {
        if ctx.free_cam_enabled() || self.is_spectating() {
            self.constants.locked_auto_rotate_mode
        } else {
            original()
        }
    }

    /// Max-maintain-distance query; degenerate small results become max zoom
    pub fn max_maintain_distance(
        &self,
        ctx: &OverrideContext<'_>,
        view: &CameraView,
        original: impl FnOnce() -> f32,
    ) -> f32 {
        let distance = original();
        if distance < self.constants.maintain_distance_threshold {
            ctx.preset.map(|p| p.max_zoom).unwrap_or(view.max_zoom)
        } else {
            distance
        }
    }

    /// Look-at height update; the original runs first, then a real update for
    /// the local player is overwritten with the preset's offset
    pub fn update_look_at_height_offset(
        &self,
        ctx: &OverrideContext<'_>,
        object: Option<ObjectRef>,
        zero: bool,
        original: impl FnOnce() -> bool,
        write: impl FnOnce(f32),
    ) -> bool {
        let updated = original();

        if let Some(preset) = ctx.preset {
            if updated && !zero && object.is_some() && object == ctx.host.local_player() {
                write(preset.look_at_height_offset);
            }
        }

        updated
    }
}
