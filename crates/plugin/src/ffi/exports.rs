//! C-compatible exports called by the host-side loader

use std::ffi::{c_char, CStr};

use tracing::instrument;
use tracing_subscriber::EnvFilter;

use camrig_core::config::{gamedata_path, plugin_config_path, set_base_dir};
use camrig_core::{with_runtime_mut, CamrigConfig, CommandReply, PluginConfig};
use camrig_engine::{init_host, load_host, try_host};
use camrig_sdk::{CameraManager, FrameInput, HostCallbacks};

// Plugin metadata - static strings with null terminators for C compatibility
static AUTHOR: &[u8] = b"dollan\0";
static NAME: &[u8] = b"camrig\0";
static DESCRIPTION: &[u8] = b"Camera presets, free camera and camera collision control\0";
static URL: &[u8] = b"https://github.com/dollannn/camrig\0";
static LICENSE: &[u8] = b"MIT\0";
static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
static LOG_TAG: &[u8] = b"CAMRIG\0";

fn init_tracing(debug: bool) {
    let default = if debug {
        "camrig=debug,camrig_core=debug,camrig_engine=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Override the directory holding `configs/` and `gamedata/`
///
/// Only effective before the first `camrig_load`.
///
/// # Safety
/// - `path` must be a valid null-terminated UTF-8 string or null
#[no_mangle]
pub unsafe extern "C" fn camrig_set_base_dir(path: *const c_char) {
    if path.is_null() {
        return;
    }
    let path = CStr::from_ptr(path).to_string_lossy().into_owned();
    set_base_dir(path);
}

/// Called when the loader loads the plugin
///
/// # Safety
/// - `module_base..module_base + module_size` must be the mapped host module
/// - `callbacks` must point to a valid `HostCallbacks` that outlives the plugin
/// - `camera_manager` must be the host camera manager or null
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn camrig_load(
    module_base: usize,
    module_size: usize,
    callbacks: *const HostCallbacks,
    camera_manager: *mut CameraManager,
    logged_in: bool,
    error: *mut c_char,
    maxlen: usize,
) -> bool {
    let paths = plugin_config_path(CamrigConfig::PLUGIN_NAME)
        .and_then(|config| Ok((config, gamedata_path()?)));
    let (config_path, gamedata_path) = match paths {
        Ok(paths) => paths,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Failed to locate plugin files: {}", e);
            write_error(error, maxlen, &format!("Config error: {}", e));
            return false;
        }
    };

    let config = match CamrigConfig::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Failed to load config: {}", e);
            write_error(error, maxlen, &format!("Config error: {}", e));
            return false;
        }
    };
    init_tracing(config.debug);

    tracing::info!("camrig loading...");

    let globals = match load_host(module_base, module_size, callbacks) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("Invalid host description: {}", e);
            write_error(error, maxlen, &format!("Host error: {}", e));
            return false;
        }
    };

    if let Err(e) = init_host(globals) {
        tracing::error!("Failed to init host: {}", e);
        write_error(error, maxlen, e);
        return false;
    }

    let Some(host) = try_host() else {
        write_error(error, maxlen, "Host not initialized");
        return false;
    };
    host.set_camera_manager(camera_manager);

    if let Err(e) = camrig_core::init(host, config, &config_path, &gamedata_path, logged_in) {
        tracing::error!("{}", e);
        write_error(error, maxlen, &e);
        camrig_core::shutdown();
        return false;
    }

    tracing::info!("camrig loaded successfully!");
    tracing::info!("Main thread ID: {:?}", std::thread::current().id());

    true
}

/// Called when the loader unloads the plugin
///
/// # Safety
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn camrig_unload(error: *mut c_char, maxlen: usize) -> bool {
    tracing::info!("camrig unloading...");

    match std::panic::catch_unwind(crate::shutdown) {
        Ok(()) => true,
        Err(_) => {
            write_error(error, maxlen, "Panic during shutdown");
            false
        }
    }
}

/// Called by the loader once per frame on the main thread
///
/// # Safety
/// - `input` must be a valid `FrameInput` or null (no input this frame)
#[no_mangle]
pub unsafe extern "C" fn camrig_frame(dt: f32, input: *const FrameInput) {
    let input = input.as_ref().copied().unwrap_or_default();
    with_runtime_mut(|rt| rt.tick(&input, dt));
}

/// Called when the local player logs in
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn camrig_login() {
    with_runtime_mut(|rt| rt.login());
}

/// Called when the local player logs out
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn camrig_logout() {
    with_runtime_mut(|rt| rt.logout());
}

/// Re-read the config file after the loader's settings UI edited it
///
/// Returns false when no runtime is installed or the file could not be read.
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn camrig_reload_config() -> bool {
    match with_runtime_mut(|rt| rt.reload_config()) {
        Some(Ok(())) => true,
        Some(Err(e)) => {
            tracing::error!("Failed to reload config: {}", e);
            false
        }
        None => false,
    }
}

/// Run the chat command with `argument` (everything after the command name)
///
/// Returns false when the command was not handled; the loader then opens its
/// own UI.
///
/// # Safety
/// - `argument` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn camrig_command(argument: *const c_char) -> bool {
    let argument = if argument.is_null() {
        String::new()
    } else {
        CStr::from_ptr(argument).to_string_lossy().into_owned()
    };

    let Some(reply) = with_runtime_mut(|rt| rt.execute(&argument)) else {
        return false;
    };

    let Some(host) = try_host() else {
        return !matches!(reply, CommandReply::NotHandled);
    };

    match reply {
        CommandReply::NotHandled => false,
        CommandReply::Handled => true,
        CommandReply::Echo(message) => {
            host.print_echo(&message);
            true
        }
        CommandReply::Error(message) => {
            host.print_error(&message);
            true
        }
    }
}

// Metadata exports - these return static strings for the loader to display

#[no_mangle]
pub extern "C" fn camrig_get_author() -> *const c_char {
    AUTHOR.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_url() -> *const c_char {
    URL.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_license() -> *const c_char {
    LICENSE.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn camrig_get_log_tag() -> *const c_char {
    LOG_TAG.as_ptr() as *const c_char
}

/// Helper to write an error message to a C buffer
///
/// # Safety
/// - `error` must be a valid pointer or null
/// - `maxlen` must accurately reflect the buffer size
unsafe fn write_error(error: *mut c_char, maxlen: usize, msg: &str) {
    if !error.is_null() && maxlen > 0 {
        let bytes = msg.as_bytes();
        let len = bytes.len().min(maxlen - 1);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), error as *mut u8, len);
        *error.add(len) = 0;
    }
}
