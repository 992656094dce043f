//! VTable hooks via pointer replacement
//!
//! The host camera's virtual functions are hooked by swapping the slot in its
//! vtable. Every object sharing the vtable is redirected.

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};
use std::sync::LazyLock;

use super::inline::HookError;
use super::patch::write_bytes;

new_key_type! {
    /// Handle for a vtable hook
    pub struct VTableHookKey;
}

/// Storage for a vtable hook
struct VTableHookEntry {
    /// Address of the vtable slot
    slot_address: *mut *const (),

    /// Original function pointer
    original: *const (),

    /// Whether currently active
    enabled: bool,

    /// Debug name
    name: String,
}

// SAFETY: Entries are only reached through the registry lock
unsafe impl Send for VTableHookEntry {}
unsafe impl Sync for VTableHookEntry {}

impl Drop for VTableHookEntry {
    fn drop(&mut self) {
        if self.enabled {
            if let Err(e) = unsafe { write_slot(self.slot_address, self.original) } {
                tracing::error!("Failed to restore vtable slot '{}': {}", self.name, e);
            }
        }
    }
}

/// Global vtable hook registry
static VTABLE_HOOKS: LazyLock<RwLock<SlotMap<VTableHookKey, VTableHookEntry>>> =
    LazyLock::new(|| RwLock::new(SlotMap::with_key()));

unsafe fn write_slot(slot: *mut *const (), value: *const ()) -> Result<(), HookError> {
    write_bytes(slot as *mut u8, &(value as usize).to_ne_bytes())
}

/// Hook a virtual table entry by vtable address directly
///
/// # Safety
/// - `vtable` must be a valid vtable pointer
/// - `vtable_index` must be a valid index into the vtable
/// - `new_fn` must have a compatible signature with the original
///
/// # Returns
/// A key to manage the hook, and the original function pointer
pub unsafe fn create_vtable_hook_direct(
    name: &str,
    vtable: *mut *const (),
    vtable_index: usize,
    new_fn: *const (),
) -> Result<(VTableHookKey, *const ()), HookError> {
    if vtable.is_null() {
        return Err(HookError::InvalidAddress(0));
    }

    let slot = vtable.add(vtable_index);
    let original = *slot;

    tracing::debug!(
        "Creating vtable hook '{}': vtable={:x}, slot[{}]={:x}, original={:x}",
        name,
        vtable as usize,
        vtable_index,
        slot as usize,
        original as usize
    );

    write_slot(slot, new_fn)?;

    let entry = VTableHookEntry {
        slot_address: slot,
        original,
        enabled: true,
        name: name.to_string(),
    };

    let key = VTABLE_HOOKS.write().insert(entry);

    tracing::info!("Created vtable hook '{}' at index {}", name, vtable_index);

    Ok((key, original))
}

/// Disable a vtable hook (restore original pointer)
pub fn disable_vtable_hook(key: VTableHookKey) -> Result<(), HookError> {
    let mut hooks = VTABLE_HOOKS.write();
    let entry = hooks.get_mut(key).ok_or(HookError::NotFound)?;

    if !entry.enabled {
        return Ok(());
    }

    unsafe { write_slot(entry.slot_address, entry.original)? };

    entry.enabled = false;
    tracing::info!("Disabled vtable hook '{}'", entry.name);
    Ok(())
}

/// Remove a vtable hook completely
pub fn remove_vtable_hook(key: VTableHookKey) -> Result<(), HookError> {
    disable_vtable_hook(key)?;

    let entry = VTABLE_HOOKS.write().remove(key).ok_or(HookError::NotFound)?;
    tracing::info!("Removed vtable hook '{}'", entry.name);
    Ok(())
}

/// Get the original function pointer for a vtable hook
pub fn get_vtable_original(key: VTableHookKey) -> Option<*const ()> {
    VTABLE_HOOKS.read().get(key).map(|e| e.original)
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn original_fn() -> i32 {
        1
    }

    extern "C" fn replacement_fn() -> i32 {
        2
    }

    #[test]
    fn test_vtable_hook_lifecycle() {
        let mut vtable: Vec<*const ()> = vec![std::ptr::null(), original_fn as *const ()];
        let table = vtable.as_mut_ptr();

        let (key, original) = unsafe {
            create_vtable_hook_direct("test", table, 1, replacement_fn as *const ())
        }
        .unwrap();

        assert_eq!(original, original_fn as *const ());
        assert_eq!(vtable[1], replacement_fn as *const ());
        assert_eq!(get_vtable_original(key), Some(original_fn as *const ()));

        disable_vtable_hook(key).unwrap();
        assert_eq!(vtable[1], original_fn as *const ());
        // Disabling twice is a no-op
        disable_vtable_hook(key).unwrap();

        remove_vtable_hook(key).unwrap();
        assert_eq!(vtable[1], original_fn as *const ());
        assert!(get_vtable_original(key).is_none());
        assert!(matches!(remove_vtable_hook(key), Err(HookError::NotFound)));
    }
}
