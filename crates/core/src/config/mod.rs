//! Configuration
//!
//! Trait-based TOML configuration:
//! - Type-safe config structs via serde
//! - Auto-generation of default configs
//! - Manual reload capability
//!
//! The camrig config holds the preset list and the persisted toggles; it is
//! stored at `<base>/configs/plugins/camrig/camrig.toml`.

mod loader;

use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::presets::Preset;

pub use loader::{camrig_base_dir, configs_dir, gamedata_path, plugin_config_path, set_base_dir};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine the base directory
    #[error("Config directory not available - could not resolve plugin base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Trait for configuration types stored as TOML.
///
/// The default location for `PLUGIN_NAME` comes from [`plugin_config_path`].
pub trait PluginConfig: Default + Serialize + DeserializeOwned + Send + Sync {
    /// Determines the file location: `configs/plugins/{PLUGIN_NAME}/{PLUGIN_NAME}.toml`
    const PLUGIN_NAME: &'static str;

    /// Load config from `path`, creating a default file if missing
    fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded config for {} from {:?}", Self::PLUGIN_NAME, path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!(
                "Created default config for {} at {:?}",
                Self::PLUGIN_NAME,
                path
            );
            Ok(default)
        }
    }

    /// Save config to `path`, creating parent directories
    fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config for {} to {:?}", Self::PLUGIN_NAME, path);
        Ok(())
    }

    /// Reload config from `path`, replacing self; self is untouched on error
    fn reload_from(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded config for {} from {:?}", Self::PLUGIN_NAME, path);
        Ok(())
    }
}

/// What the camera does while the local player is unconscious
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCamMode {
    #[default]
    Disabled,
    /// Follow the hard target
    Watch,
    /// Switch to the free camera
    FreeCam,
}

/// Persisted camrig settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamrigConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Disable camera collision with world geometry
    pub enable_camera_no_clippy: bool,

    pub death_cam_mode: DeathCamMode,

    /// Follow the focus or soft target instead of the local player
    pub enable_spectating: bool,

    /// Presets in priority order
    pub presets: Vec<Preset>,
}

impl Default for CamrigConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            enable_camera_no_clippy: false,
            death_cam_mode: DeathCamMode::Disabled,
            enable_spectating: false,
            presets: Vec::new(),
        }
    }
}

impl PluginConfig for CamrigConfig {
    const PLUGIN_NAME: &'static str = "camrig";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("camrig-config-test-{}-{}", std::process::id(), name))
            .join("camrig.toml")
    }

    #[test]
    fn test_config_default() {
        let config = CamrigConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert!(config.presets.is_empty());
        assert_eq!(config.death_cam_mode, DeathCamMode::Disabled);
        assert!(!config.enable_spectating);
    }

    #[test]
    fn test_config_serialize() {
        let config = CamrigConfig {
            presets: vec![Preset::named("Combat")],
            enable_camera_no_clippy: true,
            death_cam_mode: DeathCamMode::FreeCam,
            enable_spectating: true,
            ..CamrigConfig::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("enable_camera_no_clippy = true"));
        assert!(toml_str.contains("enable_spectating = true"));
        assert!(toml_str.contains("death_cam_mode = \"free_cam\""));
        assert!(toml_str.contains("[[presets]]"));

        let parsed: CamrigConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_creates_default_then_reads_back() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let created = CamrigConfig::load_from(&path).unwrap();
        assert_eq!(created, CamrigConfig::default());
        assert!(path.exists());

        let mut config = created;
        config.death_cam_mode = DeathCamMode::Watch;
        config.save_to(&path).unwrap();

        let loaded = CamrigConfig::load_from(&path).unwrap();
        assert_eq!(loaded.death_cam_mode, DeathCamMode::Watch);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: CamrigConfig = toml::from_str("enable_camera_no_clippy = true").unwrap();
        assert!(parsed.enable_camera_no_clippy);
        assert!(!parsed.enable_spectating);
        assert_eq!(parsed.version, 1);
    }

    #[test]
    fn test_reload_replaces_and_keeps_on_error() {
        let path = temp_path("reload");
        let mut config = CamrigConfig::load_from(&path).unwrap();

        let edited = CamrigConfig {
            enable_spectating: true,
            presets: vec![Preset::named("Photo")],
            ..CamrigConfig::default()
        };
        edited.save_to(&path).unwrap();
        config.reload_from(&path).unwrap();
        assert_eq!(config, edited);

        std::fs::write(&path, "presets = 5").unwrap();
        assert!(config.reload_from(&path).is_err());
        assert_eq!(config, edited);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "presets = 5").unwrap();

        assert!(matches!(
            CamrigConfig::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
