//! Config path resolution
//!
//! The base directory is, in order: the path set by the loader through
//! [`set_base_dir`], the `CAMRIG_HOME` environment variable, or a `camrig`
//! directory next to the host executable.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::{ConfigError, ConfigResult};

static BASE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Environment override for the base directory
const HOME_VAR: &str = "CAMRIG_HOME";

/// Set the base directory once; later calls are ignored
pub fn set_base_dir(path: impl Into<PathBuf>) {
    let path = path.into();
    if BASE_DIR.set(path.clone()).is_err() {
        tracing::debug!("Base directory already set, ignoring {:?}", path);
    }
}

/// Returns the camrig base directory
pub fn camrig_base_dir() -> ConfigResult<PathBuf> {
    if let Some(base) = BASE_DIR.get() {
        return Ok(base.clone());
    }

    if let Some(home) = std::env::var_os(HOME_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;
    exe.parent()
        .map(|p| p.join("camrig"))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `<base>/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(camrig_base_dir()?.join("configs"))
}

/// Returns the path for a plugin's config file.
///
/// Path: `<base>/configs/plugins/{plugin_name}/{plugin_name}.toml`
pub fn plugin_config_path(plugin_name: &str) -> ConfigResult<PathBuf> {
    Ok(plugin_config_path_in(&camrig_base_dir()?, plugin_name))
}

/// Returns the gamedata file path.
///
/// Path: `<base>/gamedata/camrig.json`
pub fn gamedata_path() -> ConfigResult<PathBuf> {
    Ok(gamedata_path_in(&camrig_base_dir()?))
}

fn plugin_config_path_in(base: &Path, plugin_name: &str) -> PathBuf {
    base.join("configs")
        .join("plugins")
        .join(plugin_name)
        .join(format!("{}.toml", plugin_name))
}

fn gamedata_path_in(base: &Path) -> PathBuf {
    base.join("gamedata").join("camrig.json")
}
