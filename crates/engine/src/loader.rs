//! Host description loading

use camrig_sdk::HostCallbacks;

use crate::error::HostError;
use crate::globals::HostGlobals;

/// Address range of the host's main executable module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostModule {
    pub base: usize,
    pub size: usize,
}

impl HostModule {
    pub fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    pub fn base_ptr(&self) -> *const u8 {
        self.base as *const u8
    }

    /// Check whether an address lies inside the module
    pub fn contains(&self, address: usize) -> bool {
        address >= self.base && address - self.base < self.size
    }
}

/// Validate the loader's description of the host
///
/// Called during plugin load with what the loader passed across the C ABI.
///
/// # Safety
/// `callbacks` must be null or point to a valid `HostCallbacks`.
#[tracing::instrument(skip_all)]
pub unsafe fn load_host(
    module_base: usize,
    module_size: usize,
    callbacks: *const HostCallbacks,
) -> Result<HostGlobals, HostError> {
    if module_base == 0 || module_size == 0 {
        return Err(HostError::InvalidModule {
            base: module_base,
            size: module_size,
        });
    }
    let module = HostModule::new(module_base, module_size);
    tracing::info!("Host module: {:#x} (+{:#x})", module.base, module.size);

    let callbacks = callbacks.as_ref().ok_or(HostError::NullCallbacks)?;

    // Required callbacks - fail if any are missing
    let missing = callbacks.missing_required();
    if !missing.is_empty() {
        return Err(HostError::MissingCallbacks(missing.join(", ")));
    }

    // Optional callbacks - log but don't fail
    if callbacks.bone_position.is_none() {
        tracing::debug!("bone_position: not available, view bobbing disabled");
    }
    if callbacks.evaluate_condition_set.is_none() {
        tracing::debug!("Condition-set provider: not available");
    }

    Ok(HostGlobals::new(module, *callbacks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camrig_sdk::GameObject;

    unsafe extern "C" fn no_object() -> *mut GameObject {
        std::ptr::null_mut()
    }

    unsafe extern "C" fn no_flags() -> u64 {
        0
    }

    unsafe extern "C" fn print(_: *const std::ffi::c_char) {}

    fn required() -> HostCallbacks {
        HostCallbacks {
            local_player: Some(no_object),
            focus_target: Some(no_object),
            soft_target: Some(no_object),
            hard_target: Some(no_object),
            condition_flags: Some(no_flags),
            print_echo: Some(print),
            print_error: Some(print),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_module() {
        let callbacks = required();
        let result = unsafe { load_host(0, 0x1000, &callbacks) };
        assert!(matches!(result, Err(HostError::InvalidModule { .. })));
    }

    #[test]
    fn test_rejects_missing_callbacks() {
        let callbacks = HostCallbacks::default();
        let result = unsafe { load_host(0x1000, 0x1000, &callbacks) };
        assert!(matches!(result, Err(HostError::MissingCallbacks(_))));

        let result = unsafe { load_host(0x1000, 0x1000, std::ptr::null()) };
        assert!(matches!(result, Err(HostError::NullCallbacks)));
    }

    #[test]
    fn test_optional_callbacks_degrade() {
        let callbacks = required();
        let globals = unsafe { load_host(0x1000, 0x2000, &callbacks) }.unwrap();
        assert!(globals.module.contains(0x2fff));
        assert!(!globals.module.contains(0x3000));
        assert!(!globals.has_bone_positions());
        assert!(!globals.condition_sets_available());
        assert!(globals.condition_set_names().is_empty());
        assert_eq!(globals.condition_flags(), 0);
        assert!(globals.local_player().is_none());
    }
}
