//! Camera presets
//!
//! A preset is a named bundle of camera tuning values. Presets are authored in
//! the config file; the store keeps them in priority order and the resolver
//! decides which one governs the camera on each frame.

mod resolver;
mod store;

use serde::{Deserialize, Serialize};

use crate::conditions::HostConditions;

pub use resolver::{Bootstrap, PresetResolver, ResolverState, Transition};
pub use store::PresetStore;

/// When the camera follows the head bone instead of the model origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewBobMode {
    #[default]
    Disabled,
    /// Only while the camera is in first person
    FirstPerson,
    /// Only while the local player is out of combat
    OutOfCombat,
    Always,
}

/// Camera tuning values
///
/// Bounded pairs are not validated; `min > max` is passed through to the host
/// as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub name: String,

    /// Apply start zoom/FoV when this preset activates during login
    pub use_start_on_login: bool,

    pub use_start_zoom: bool,
    pub start_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_delta: f32,

    pub use_start_fov: bool,
    pub start_fov: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    pub fov_delta: f32,

    pub min_v_rotation: f32,
    pub max_v_rotation: f32,

    pub height_offset: f32,
    pub side_offset: f32,
    pub tilt: f32,
    pub look_at_height_offset: f32,
    pub view_bob_mode: ViewBobMode,

    /// Index into the external condition sets; negative means never auto-selected
    pub condition_set: i32,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "New Preset".to_string(),
            use_start_on_login: false,
            use_start_zoom: false,
            start_zoom: 6.0,
            min_zoom: 1.5,
            max_zoom: 20.0,
            zoom_delta: 0.75,
            use_start_fov: false,
            start_fov: 0.78,
            min_fov: 0.69,
            max_fov: 0.78,
            fov_delta: 0.087_266_47,
            min_v_rotation: -1.483_53,
            max_v_rotation: 0.785_398,
            height_offset: 0.0,
            side_offset: 0.0,
            tilt: 0.0,
            look_at_height_offset: 0.0,
            view_bob_mode: ViewBobMode::Disabled,
            condition_set: -1,
        }
    }
}

impl Preset {
    /// Preset with default values and the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether this preset can be picked by automatic matching at all
    pub fn is_conditioned(&self) -> bool {
        self.condition_set >= 0
    }

    /// Whether the camera should follow the head bone right now
    pub fn view_bobbing(&self, first_person: bool, conditions: HostConditions) -> bool {
        match self.view_bob_mode {
            ViewBobMode::Disabled => false,
            ViewBobMode::FirstPerson => first_person,
            ViewBobMode::OutOfCombat => !conditions.contains(HostConditions::IN_COMBAT),
            ViewBobMode::Always => true,
        }
    }
}
