//! Global host state storage
//!
//! The host description is acquired once during plugin load and stored here.
//! Access is thread-safe via OnceLock.

use std::ffi::{CStr, CString};
use std::ptr::NonNull;
use std::sync::OnceLock;

use parking_lot::RwLock;

use camrig_sdk::{CameraManager, GameObject, HostCallbacks, Vector3};

use crate::loader::HostModule;

/// Global host state: module range, loader callbacks, resolved singletons
pub struct HostGlobals {
    /// Main executable module of the host
    pub module: HostModule,

    /// Callback table provided by the loader
    pub callbacks: HostCallbacks,

    /// Camera manager - set later once gamedata resolution succeeded
    camera_manager: RwLock<Option<NonNull<CameraManager>>>,
}

// SAFETY: The module range and callbacks stay valid for the plugin lifetime.
// Access is synchronized via OnceLock for initialization and RwLock for camera_manager.
unsafe impl Send for HostGlobals {}
unsafe impl Sync for HostGlobals {}

/// Global host state storage
static HOST: OnceLock<HostGlobals> = OnceLock::new();

/// Initialize host globals
///
/// Called once during plugin load. Returns error if already initialized.
pub fn init_host(globals: HostGlobals) -> Result<(), &'static str> {
    HOST.set(globals).map_err(|_| "Host already initialized")
}

/// Try to get host globals without panicking
pub fn try_host() -> Option<&'static HostGlobals> {
    HOST.get()
}

/// Check if host is initialized
pub fn is_host_initialized() -> bool {
    HOST.get().is_some()
}

fn object(query: Option<camrig_sdk::ObjectQueryFn>) -> Option<NonNull<GameObject>> {
    query.and_then(|f| NonNull::new(unsafe { f() }))
}

impl HostGlobals {
    /// Create new HostGlobals
    pub fn new(module: HostModule, callbacks: HostCallbacks) -> Self {
        Self {
            module,
            callbacks,
            camera_manager: RwLock::new(None),
        }
    }

    /// Get camera manager pointer (None before gamedata resolution)
    pub fn camera_manager_ptr(&self) -> Option<*mut CameraManager> {
        self.camera_manager.read().map(|nn| nn.as_ptr())
    }

    /// Set camera manager pointer
    pub fn set_camera_manager(&self, ptr: *mut CameraManager) {
        if let Some(nn) = NonNull::new(ptr) {
            *self.camera_manager.write() = Some(nn);
            tracing::info!("CameraManager set: {:p}", ptr);
        }
    }

    /// Clear camera manager pointer
    ///
    /// Called on unload
    pub fn clear_camera_manager(&self) {
        *self.camera_manager.write() = None;
        tracing::debug!("CameraManager cleared");
    }

    pub fn local_player(&self) -> Option<NonNull<GameObject>> {
        object(self.callbacks.local_player)
    }

    pub fn focus_target(&self) -> Option<NonNull<GameObject>> {
        object(self.callbacks.focus_target)
    }

    pub fn soft_target(&self) -> Option<NonNull<GameObject>> {
        object(self.callbacks.soft_target)
    }

    pub fn hard_target(&self) -> Option<NonNull<GameObject>> {
        object(self.callbacks.hard_target)
    }

    /// Current `CONDITION_*` bitmask (0 when the callback is missing)
    pub fn condition_flags(&self) -> u64 {
        self.callbacks
            .condition_flags
            .map(|f| unsafe { f() })
            .unwrap_or(0)
    }

    /// World-space bone position, None when unavailable or exactly zero
    pub fn bone_position(&self, object: NonNull<GameObject>, bone: i32) -> Option<Vector3> {
        let f = self.callbacks.bone_position?;
        let mut out = Vector3::ZERO;
        let ok = unsafe { f(object.as_ptr(), bone, &mut out) };
        (ok && !out.is_zero()).then_some(out)
    }

    /// Whether the loader can evaluate skeleton positions at all
    pub fn has_bone_positions(&self) -> bool {
        self.callbacks.bone_position.is_some()
    }

    pub fn print_echo(&self, message: &str) {
        print_with(self.callbacks.print_echo, message);
    }

    pub fn print_error(&self, message: &str) {
        print_with(self.callbacks.print_error, message);
    }

    /// Whether the condition-set provider is present right now
    pub fn condition_sets_available(&self) -> bool {
        self.callbacks
            .condition_sets_available
            .map(|f| unsafe { f() })
            .unwrap_or(false)
    }

    pub fn evaluate_condition_set(&self, index: i32) -> Option<bool> {
        self.callbacks
            .evaluate_condition_set
            .map(|f| unsafe { f(index) })
    }

    /// Display names of every condition set
    pub fn condition_set_names(&self) -> Vec<String> {
        let (Some(count), Some(name)) = (
            self.callbacks.condition_set_count,
            self.callbacks.condition_set_name,
        ) else {
            return Vec::new();
        };

        let count = unsafe { count() }.max(0);
        (0..count)
            .map(|i| {
                let ptr = unsafe { name(i) };
                if ptr.is_null() {
                    String::new()
                } else {
                    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
                }
            })
            .collect()
    }
}

fn print_with(f: Option<unsafe extern "C" fn(*const std::ffi::c_char)>, message: &str) {
    let Some(f) = f else {
        tracing::info!("{}", message);
        return;
    };

    // Interior NULs would truncate the message on the host side
    let sanitized = message.replace('\0', " ");
    if let Ok(c) = CString::new(sanitized) {
        unsafe { f(c.as_ptr()) };
    }
}
