//! Loader callback table
//!
//! The host-side loader owns everything the core cannot reach through
//! intercepted entry points: targeting, condition flags, skeleton queries,
//! chat output and the optional condition-set provider.

use std::ffi::c_char;

use crate::types::{GameObject, Vector3};

/// Condition flag: the local player is in combat
pub const CONDITION_IN_COMBAT: u64 = 1 << 0;

/// Condition flag: the local player is unconscious (dead, knocked out)
pub const CONDITION_UNCONSCIOUS: u64 = 1 << 1;

/// Condition flag: a between-areas loading transition is in progress
pub const CONDITION_BETWEEN_AREAS: u64 = 1 << 2;

/// Condition flag: the local player is watching a cutscene
pub const CONDITION_WATCHING_CUTSCENE: u64 = 1 << 3;

/// Returns an object pointer, or null when there is none
pub type ObjectQueryFn = unsafe extern "C" fn() -> *mut GameObject;

/// Callback table passed to `camrig_load`.
///
/// Required entries: `local_player`, `focus_target`, `soft_target`,
/// `hard_target`, `condition_flags`, `print_echo`, `print_error`.
/// Every other entry may be null; the matching feature is disabled.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct HostCallbacks {
    pub local_player: Option<ObjectQueryFn>,
    pub focus_target: Option<ObjectQueryFn>,
    pub soft_target: Option<ObjectQueryFn>,
    pub hard_target: Option<ObjectQueryFn>,

    /// Bitmask of `CONDITION_*` flags
    pub condition_flags: Option<unsafe extern "C" fn() -> u64>,

    /// World-space position of a skeleton bone of `object`.
    /// Returns false when the object has no skeleton loaded.
    pub bone_position:
        Option<unsafe extern "C" fn(object: *mut GameObject, bone: i32, out: *mut Vector3) -> bool>,

    /// Print a NUL-terminated UTF-8 message to the user
    pub print_echo: Option<unsafe extern "C" fn(message: *const c_char)>,
    pub print_error: Option<unsafe extern "C" fn(message: *const c_char)>,

    /// Condition-set provider (another plugin, presence detected per call)
    pub condition_sets_available: Option<unsafe extern "C" fn() -> bool>,
    pub evaluate_condition_set: Option<unsafe extern "C" fn(index: i32) -> bool>,
    pub condition_set_count: Option<unsafe extern "C" fn() -> i32>,
    pub condition_set_name: Option<unsafe extern "C" fn(index: i32) -> *const c_char>,
}

impl HostCallbacks {
    /// Names of required entries that are missing
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.local_player.is_none() {
            missing.push("local_player");
        }
        if self.focus_target.is_none() {
            missing.push("focus_target");
        }
        if self.soft_target.is_none() {
            missing.push("soft_target");
        }
        if self.hard_target.is_none() {
            missing.push("hard_target");
        }
        if self.condition_flags.is_none() {
            missing.push("condition_flags");
        }
        if self.print_echo.is_none() {
            missing.push("print_echo");
        }
        if self.print_error.is_none() {
            missing.push("print_error");
        }
        missing
    }
}
