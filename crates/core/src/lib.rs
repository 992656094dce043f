//! camrig - Core Logic
//!
//! Camera presets selected by host conditions, a free-flying camera, and the
//! interception layer that feeds both into the host camera.
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and engine crates for convenience:
//! - [`sdk`] - Host camera types, layouts and gamedata keys
//! - [`engine`] - Host globals and loader validation

use std::path::Path;

use tracing::info;

pub use camrig_engine as engine;
pub use camrig_sdk as sdk;

pub mod camera;
pub mod commands;
pub mod conditions;
pub mod config;
pub mod freecam;
pub mod gamedata;
pub mod hooks;
pub mod presets;
pub mod runtime;

pub use camera::native::{attach, detach, AttachError};
pub use camera::{CameraControl, CameraHost, CameraOverrideEngine, ObjectRef, OverrideContext};
pub use commands::{CommandInfo, CommandReply, Subcommand};
pub use conditions::{ConditionSets, HostConditions};
pub use config::{CamrigConfig, ConfigError, ConfigResult, DeathCamMode, PluginConfig};
pub use freecam::{FreeCamController, FreeCamPose};
pub use gamedata::{Gamedata, GamedataError, SignatureResolver};
pub use hooks::{HookError, HookKey, InterceptionLayer, PatchKey};
pub use presets::{Preset, PresetResolver, PresetStore, ViewBobMode};
pub use runtime::{install_runtime, is_runtime_installed, with_runtime, with_runtime_mut, Camrig};

/// Attach to the host camera and install the runtime
///
/// # Safety
/// Must run on the host main thread at a point where no camera entry point
/// is executing; `host` must describe the mapped host module.
pub unsafe fn init(
    host: &'static engine::HostGlobals,
    config: CamrigConfig,
    config_path: &Path,
    gamedata_path: &Path,
    logged_in: bool,
) -> Result<(), String> {
    let gamedata = Gamedata::load_from_file(gamedata_path)
        .map_err(|e| format!("Failed to load gamedata from {}: {}", gamedata_path.display(), e))?;

    let camrig = attach(host, &gamedata, config)
        .map_err(|e| format!("Failed to attach: {}", e))?
        .with_config_path(config_path.to_path_buf());

    if install_runtime(camrig).is_some() {
        tracing::warn!("Replaced an existing runtime");
    }
    if logged_in {
        with_runtime_mut(Camrig::login);
    }

    info!("camrig initialized");
    Ok(())
}

/// Restore the camera and remove every hook
///
/// Called from the FFI layer when the loader unloads the plugin.
pub fn shutdown() {
    info!("camrig shutting down...");
    detach();
    if let Some(host) = engine::try_host() {
        host.clear_camera_manager();
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_gamedata_keys_exported() {
        assert!(crate::sdk::GAMEDATA_KEYS.contains(&crate::sdk::names::CAMERA_COLLISION));
    }
}
