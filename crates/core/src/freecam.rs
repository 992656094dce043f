//! Free camera
//!
//! A detached camera driven by per-frame input. While enabled its position
//! and look direction replace the host camera's in every hook, without
//! touching the preset resolver.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use camrig_sdk::FrameInput;

use crate::camera::CameraSeed;

/// Keeps the view direction away from straight up/down
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Default movement speed in world units per second
pub const DEFAULT_SPEED: f32 = 10.0;

/// View direction for a yaw/pitch pair
///
/// Yaw and pitch use the host's horizontal/vertical camera rotation: the
/// camera looks opposite its orbit offset, so yaw 0 faces -Z and a negative
/// pitch looks down.
pub fn forward(rotation: Vec2) -> Vec3 {
    let (yaw, pitch) = (rotation.x, rotation.y);
    Vec3::new(
        -yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeCamState {
    pub position: Vec3,
    /// Yaw and pitch in radians
    pub rotation: Vec2,
    /// Collision patch state to restore when disabling
    restore_collision: bool,
}

/// Where the free camera sits and the point it looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeCamPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Debug)]
pub struct FreeCamController {
    state: Option<FreeCamState>,
    speed: f32,
}

impl Default for FreeCamController {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

impl FreeCamController {
    pub fn new(speed: f32) -> Self {
        Self { state: None, speed }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&FreeCamState> {
        self.state.as_ref()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.state.map(|s| s.position)
    }

    pub fn look_at(&self) -> Option<Vec3> {
        self.state.map(|s| s.position + forward(s.rotation))
    }

    pub fn pose(&self) -> Option<FreeCamPose> {
        self.state.map(|s| FreeCamPose {
            position: s.position,
            look_at: s.position + forward(s.rotation),
        })
    }

    /// Start from `seed` so the switch is visually continuous.
    /// Returns false when already enabled.
    pub fn enable(&mut self, seed: CameraSeed, collision_disabled: bool) -> bool {
        if self.state.is_some() {
            return false;
        }

        self.state = Some(FreeCamState {
            position: seed.position,
            rotation: Vec2::new(seed.rotation.x, seed.rotation.y.clamp(-PITCH_LIMIT, PITCH_LIMIT)),
            restore_collision: collision_disabled,
        });
        tracing::info!("Free camera enabled at {:?}", seed.position);
        true
    }

    /// Returns the collision state recorded on enable, None when not enabled
    pub fn disable(&mut self) -> Option<bool> {
        let state = self.state.take()?;
        tracing::info!("Free camera disabled");
        Some(state.restore_collision)
    }

    /// Change the collision state restored on disable (collision toggled while enabled)
    pub fn set_restore_collision(&mut self, disabled: bool) {
        if let Some(state) = &mut self.state {
            state.restore_collision = disabled;
        }
    }

    /// Integrate one frame of input; movement is scaled by `dt` seconds
    pub fn update(&mut self, input: &FrameInput, dt: f32) {
        let speed = self.speed;
        let Some(state) = &mut self.state else {
            return;
        };

        state.rotation.x += input.look_x;
        state.rotation.y = (state.rotation.y + input.look_y).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let forward = forward(state.rotation);
        let right = Vec3::new(forward.x, 0.0, forward.z)
            .normalize_or_zero()
            .cross(Vec3::Y);

        let direction = right * input.move_x + Vec3::Y * input.move_y + forward * input.move_z;
        let multiplier = if input.speed_multiplier > 0.0 {
            input.speed_multiplier
        } else {
            1.0
        };

        if dt.is_finite() && dt > 0.0 {
            state.position += direction * speed * multiplier * dt;
        }
    }
}
