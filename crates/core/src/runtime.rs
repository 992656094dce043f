//! Plugin runtime
//!
//! [`Camrig`] owns everything that lives for one attach: config, presets,
//! resolver, override engine and free camera, plus the host seams. One
//! instance sits in a process-wide slot; detours read it, frame ticks and
//! commands write it.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use camrig_sdk::FrameInput;

use crate::camera::{CameraControl, CameraHost, CameraOverrideEngine, OverrideContext};
use crate::commands::{CommandInfo, CommandReply, Subcommand, HELP};
use crate::conditions::HostConditions;
use crate::config::{CamrigConfig, ConfigError, ConfigResult, DeathCamMode, PluginConfig};
use crate::freecam::FreeCamController;
use crate::presets::{Bootstrap, Preset, PresetResolver, PresetStore, Transition};

/// Process-wide runtime slot
static RUNTIME: RwLock<Option<Camrig>> = RwLock::new(None);

/// Put a runtime into the slot, returning the previous one
pub fn install_runtime(camrig: Camrig) -> Option<Camrig> {
    RUNTIME.write().replace(camrig)
}

/// Take the runtime out of the slot
pub fn take_runtime() -> Option<Camrig> {
    RUNTIME.write().take()
}

pub fn is_runtime_installed() -> bool {
    RUNTIME.read_recursive().is_some()
}

/// Run `f` against the runtime from a detour
///
/// Never blocks: returns None when there is no runtime or when a writer holds
/// the slot, so callers fall back to original behaviour.
pub fn with_runtime<R>(f: impl FnOnce(&Camrig) -> R) -> Option<R> {
    let guard = RUNTIME.try_read_recursive()?;
    guard.as_ref().map(f)
}

/// Run `f` with exclusive access (frame tick, commands, attach/detach)
pub fn with_runtime_mut<R>(f: impl FnOnce(&mut Camrig) -> R) -> Option<R> {
    RUNTIME.write().as_mut().map(f)
}

pub struct Camrig {
    config: CamrigConfig,
    /// Where `save_config` writes; None keeps the config in memory
    config_path: Option<PathBuf>,
    store: PresetStore,
    resolver: PresetResolver,
    engine: CameraOverrideEngine,
    free_cam: FreeCamController,
    host: Box<dyn CameraHost>,
    control: Box<dyn CameraControl>,
    /// Unconscious on the previous tick
    was_unconscious: bool,
    /// Free camera was switched on by the death cam
    death_cam_active: bool,
}

impl Camrig {
    pub fn new(
        config: CamrigConfig,
        mut engine: CameraOverrideEngine,
        host: Box<dyn CameraHost>,
        control: Box<dyn CameraControl>,
    ) -> Self {
        let store = PresetStore::new(config.presets.clone());
        tracing::info!("Loaded {} presets", store.presets().len());
        engine.set_spectate_enabled(config.enable_spectating);

        Self {
            config,
            config_path: None,
            store,
            resolver: PresetResolver::new(),
            engine,
            free_cam: FreeCamController::default(),
            host,
            control,
            was_unconscious: false,
            death_cam_active: false,
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn config(&self) -> &CamrigConfig {
        &self.config
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    pub fn resolver(&self) -> &PresetResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &CameraOverrideEngine {
        &self.engine
    }

    pub fn free_cam(&self) -> &FreeCamController {
        &self.free_cam
    }

    pub fn host(&self) -> &dyn CameraHost {
        self.host.as_ref()
    }

    /// Preset currently governing the camera
    pub fn active_preset(&self) -> Option<&Arc<Preset>> {
        self.resolver.active()
    }

    /// State the detours consult
    pub fn context(&self) -> OverrideContext<'_> {
        OverrideContext {
            preset: self.resolver.active().map(|p| p.as_ref()),
            free_cam: self.free_cam.pose(),
            death_cam_mode: self.config.death_cam_mode,
            host: self.host.as_ref(),
        }
    }

    /// Session started (login, or attach while logged in)
    pub fn login(&mut self) {
        tracing::info!("Session started");
        self.resolver.begin_session();
    }

    /// Session ended; host values are restored so the next capture is clean
    pub fn logout(&mut self) {
        tracing::info!("Session ended");
        self.disable_free_cam();
        self.restore_default();
        self.resolver.end_session();
        self.was_unconscious = false;
    }

    /// Restore the host camera before hooks are removed
    pub fn detach(&mut self) {
        self.disable_free_cam();
        self.restore_default();
    }

    fn restore_default(&mut self) {
        if let Some(default) = self.store.default_preset() {
            self.control.apply_preset(default, false);
        }
    }

    /// Per-frame update: death cam, free camera integration, preset resolution
    pub fn tick(&mut self, input: &FrameInput, dt: f32) {
        let conditions = self.host.conditions();

        self.update_death_cam(conditions);
        self.free_cam.update(input, dt);

        if conditions.contains(HostConditions::BETWEEN_AREAS) {
            return;
        }

        let snapshot = if self.resolver.bootstrap() == Bootstrap::AwaitingStable {
            // No camera yet; try again next frame
            let Some(snapshot) = self.control.snapshot() else {
                return;
            };
            Some(snapshot)
        } else {
            None
        };

        let transition = self.resolver.tick(
            &mut self.store,
            self.host.condition_sets(),
            false,
            || snapshot.unwrap_or_else(|| Preset::named("Default")),
        );

        if let Some(transition) = transition {
            self.apply(&transition);
        }
    }

    fn apply(&mut self, transition: &Transition) {
        tracing::debug!(
            "Applying preset '{}'{}",
            transition.activated.name,
            if transition.logging_in { " (login)" } else { "" }
        );
        self.control
            .apply_preset(&transition.activated, transition.logging_in);
    }

    fn update_death_cam(&mut self, conditions: HostConditions) {
        let unconscious = conditions.contains(HostConditions::UNCONSCIOUS);
        let rising = unconscious && !self.was_unconscious;
        let falling = !unconscious && self.was_unconscious;
        self.was_unconscious = unconscious;

        if self.config.death_cam_mode != DeathCamMode::FreeCam {
            return;
        }

        if rising && !self.free_cam.is_enabled() && self.enable_free_cam() {
            self.death_cam_active = true;
        } else if falling && self.death_cam_active {
            self.disable_free_cam();
        }
    }

    /// Pin a preset by name, or clear the pin with `None`
    pub fn set_override_by_name(&mut self, name: Option<&str>) -> Result<(), String> {
        let preset = match name {
            Some(name) => Some(
                self.store
                    .find_by_name(name)
                    .ok_or_else(|| format!("Failed to find preset \"{}\"", name))?,
            ),
            None => None,
        };

        let transition =
            self.resolver
                .set_override(preset, &self.store, self.host.condition_sets());
        if let Some(transition) = transition {
            self.apply(&transition);
        }
        Ok(())
    }

    /// Replace the preset list; a pinned preset is re-pinned by name
    pub fn set_presets(&mut self, presets: Vec<Preset>) {
        let pinned = self.resolver.override_preset().map(|p| p.name.clone());
        self.store.set_presets(presets);

        let repinned = pinned.and_then(|name| self.store.find_by_name(&name));
        let transition =
            self.resolver
                .set_override(repinned, &self.store, self.host.condition_sets());
        if let Some(transition) = transition {
            self.apply(&transition);
        }
    }

    pub fn enable_free_cam(&mut self) -> bool {
        if self.free_cam.is_enabled() {
            return true;
        }

        let Some(seed) = self.control.seed() else {
            tracing::warn!("Free camera unavailable: no camera");
            return false;
        };

        let collision_disabled = self.control.collision_disabled();
        self.free_cam.enable(seed, collision_disabled);
        self.control.adjust_movement_lock(1);
        self.control.set_collision_disabled(true);
        true
    }

    pub fn disable_free_cam(&mut self) {
        self.death_cam_active = false;
        if let Some(restore) = self.free_cam.disable() {
            self.control.adjust_movement_lock(-1);
            self.control.set_collision_disabled(restore);
        }
    }

    pub fn toggle_free_cam(&mut self) -> bool {
        if self.free_cam.is_enabled() {
            self.disable_free_cam();
            false
        } else {
            self.enable_free_cam()
        }
    }

    /// Flip the persisted collision toggle
    pub fn toggle_no_clip(&mut self) -> bool {
        let disabled = !self.config.enable_camera_no_clippy;
        self.config.enable_camera_no_clippy = disabled;

        // The free camera forces collision off; change what it restores instead
        if self.free_cam.is_enabled() {
            self.free_cam.set_restore_collision(disabled);
        } else {
            self.control.set_collision_disabled(disabled);
        }

        self.save_config();
        disabled
    }

    /// Re-read the config file and apply its toggles and presets
    pub fn reload_config(&mut self) -> ConfigResult<()> {
        let path = self
            .config_path
            .clone()
            .ok_or(ConfigError::NoConfigDirectory)?;
        let mut config = self.config.clone();
        config.reload_from(&path)?;

        if self.free_cam.is_enabled() {
            self.free_cam
                .set_restore_collision(config.enable_camera_no_clippy);
        } else {
            self.control
                .set_collision_disabled(config.enable_camera_no_clippy);
        }
        self.engine.set_spectate_enabled(config.enable_spectating);

        let presets = config.presets.clone();
        self.config = config;
        self.set_presets(presets);
        tracing::info!("Reloaded config from {:?}", path);
        Ok(())
    }

    /// Write the config back to disk; failures are logged only
    pub fn save_config(&mut self) {
        self.config.presets = self.store.to_vec();

        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    /// Run a chat command
    pub fn execute(&mut self, argument: &str) -> CommandReply {
        let info = CommandInfo::parse(argument);
        let command = match Subcommand::parse(&info) {
            Ok(Some(command)) => command,
            Ok(None) => return CommandReply::NotHandled,
            Err(reply) => return reply,
        };

        tracing::debug!("Command: {:?}", command);

        match command {
            Subcommand::Preset(None) => {
                // Clearing cannot fail
                let _ = self.set_override_by_name(None);
                CommandReply::Echo("Removed preset override.".to_string())
            }
            Subcommand::Preset(Some(name)) => match self.set_override_by_name(Some(&name)) {
                Ok(()) => CommandReply::Echo(format!("Preset set to \"{}\"", name)),
                Err(e) => CommandReply::Error(e),
            },
            Subcommand::Zoom(zoom) => {
                if self.control.set_zoom(zoom) {
                    CommandReply::Handled
                } else {
                    CommandReply::Error("Camera unavailable.".to_string())
                }
            }
            Subcommand::Fov(fov) => {
                if self.control.set_fov(fov) {
                    CommandReply::Handled
                } else {
                    CommandReply::Error("Camera unavailable.".to_string())
                }
            }
            Subcommand::Spectate => {
                let enabled = !self.engine.spectate_enabled();
                self.engine.set_spectate_enabled(enabled);
                self.config.enable_spectating = enabled;
                self.save_config();
                CommandReply::Echo(format!(
                    "Spectating is now {}!",
                    if enabled { "enabled" } else { "disabled" }
                ))
            }
            Subcommand::NoClip => {
                let disabled = self.toggle_no_clip();
                CommandReply::Echo(format!(
                    "Camera collision is now {}!",
                    if disabled { "disabled" } else { "enabled" }
                ))
            }
            Subcommand::FreeCam => {
                let was_enabled = self.free_cam.is_enabled();
                if self.toggle_free_cam() || was_enabled {
                    CommandReply::Handled
                } else {
                    CommandReply::Error("Camera unavailable.".to_string())
                }
            }
            Subcommand::Help => CommandReply::Echo(HELP.to_string()),
        }
    }
}
