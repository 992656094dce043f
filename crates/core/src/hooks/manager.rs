//! Interception layer
//!
//! Resolves hook and patch descriptors against the host, installs them, and
//! keeps the handles needed to call the original implementation, toggle, and
//! finally restore everything on detach.

use slotmap::{new_key_type, SlotMap};

use super::inline::{self, HookError, InlineHookKey};
use super::patch::BytePatch;
use super::vtable::{self, VTableHookKey};
use crate::gamedata::SignatureResolver;

new_key_type! {
    /// Handle for an installed byte patch
    pub struct PatchKey;
}

/// Unified hook key (can be any hook type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKey {
    Inline(InlineHookKey),
    VTable(VTableHookKey),
}

impl From<InlineHookKey> for HookKey {
    fn from(key: InlineHookKey) -> Self {
        HookKey::Inline(key)
    }
}

impl From<VTableHookKey> for HookKey {
    fn from(key: VTableHookKey) -> Self {
        HookKey::VTable(key)
    }
}

/// Where a hook or patch lives in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTarget {
    /// Gamedata signature, resolved by pattern scan
    Signature(&'static str),
    /// Fixed offset from another resolved signature
    Offset { base: &'static str, offset: isize },
    /// Known absolute address
    Address(usize),
    /// Slot of a vtable; the index comes from the gamedata offset `index`
    VTable { table: usize, index: &'static str },
}

/// One intercepted entry point
#[derive(Debug, Clone, Copy)]
pub struct HookDescriptor {
    pub name: &'static str,
    pub target: HookTarget,
    pub detour: *const (),
}

/// One raw byte patch
#[derive(Debug, Clone)]
pub struct PatchDescriptor {
    pub name: &'static str,
    pub target: HookTarget,
    pub bytes: Vec<u8>,
    pub required: bool,
    /// Apply right after installing
    pub enabled: bool,
}

/// A target after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    Address(usize),
    Slot { table: usize, index: usize },
}

fn unresolved(name: &str, source: crate::gamedata::GamedataError) -> HookError {
    HookError::Unresolved {
        name: name.to_string(),
        source,
    }
}

fn resolve(resolver: &dyn SignatureResolver, target: &HookTarget) -> Result<Resolved, HookError> {
    match *target {
        HookTarget::Signature(name) => resolver
            .resolve(name)
            .map(Resolved::Address)
            .map_err(|e| unresolved(name, e)),
        HookTarget::Offset { base, offset } => resolver
            .resolve(base)
            .map(|a| Resolved::Address(a.wrapping_add_signed(offset)))
            .map_err(|e| unresolved(base, e)),
        HookTarget::Address(0) => Err(HookError::InvalidAddress(0)),
        HookTarget::Address(address) => Ok(Resolved::Address(address)),
        HookTarget::VTable { table, index } => {
            if table == 0 {
                return Err(HookError::InvalidAddress(0));
            }
            let index = resolver.offset(index).map_err(|e| unresolved(index, e))?;
            let index = usize::try_from(index)
                .map_err(|_| HookError::DetourCreation(format!("negative vtable index {}", index)))?;
            Ok(Resolved::Slot { table, index })
        }
    }
}

/// Resolve a target to an absolute address (vtable targets yield the slot's
/// current function)
pub fn resolve_address(
    resolver: &dyn SignatureResolver,
    target: &HookTarget,
) -> Result<usize, HookError> {
    match resolve(resolver, target)? {
        Resolved::Address(address) => Ok(address),
        Resolved::Slot { table, index } => {
            Ok(unsafe { *(table as *const usize).add(index) })
        }
    }
}

/// Owns every hook and patch installed for one attach
#[derive(Default)]
pub struct InterceptionLayer {
    hooks: Vec<(&'static str, HookKey)>,
    patches: SlotMap<PatchKey, BytePatch>,
    /// Optional features whose target could not be resolved
    degraded: Vec<&'static str>,
}

impl InterceptionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and install a hook
    ///
    /// # Safety
    /// The descriptor's detour must match the target's signature, and no host
    /// thread may be executing the target while it is being patched.
    pub unsafe fn install(
        &mut self,
        resolver: &dyn SignatureResolver,
        descriptor: &HookDescriptor,
    ) -> Result<HookKey, HookError> {
        let key = match resolve(resolver, &descriptor.target)? {
            Resolved::Address(address) => {
                let (key, _) = inline::create_inline_hook(
                    descriptor.name,
                    address as *const (),
                    descriptor.detour,
                )?;
                HookKey::Inline(key)
            }
            Resolved::Slot { table, index } => {
                let (key, _) = vtable::create_vtable_hook_direct(
                    descriptor.name,
                    table as *mut *const (),
                    index,
                    descriptor.detour,
                )?;
                HookKey::VTable(key)
            }
        };

        self.hooks.push((descriptor.name, key));
        Ok(key)
    }

    /// Remove a hook, restoring the original code or slot
    pub fn uninstall(&mut self, key: HookKey) -> Result<(), HookError> {
        self.hooks.retain(|(_, k)| *k != key);
        match key {
            HookKey::Inline(k) => inline::remove_inline_hook(k),
            HookKey::VTable(k) => vtable::remove_vtable_hook(k),
        }
    }

    /// Pointer that calls the original implementation
    pub fn original(&self, key: HookKey) -> Option<*const ()> {
        match key {
            HookKey::Inline(k) => inline::get_inline_hook_original(k),
            HookKey::VTable(k) => vtable::get_vtable_original(k),
        }
    }

    /// Resolve and record a patch, applying it when the descriptor says so
    ///
    /// Optional patches that fail to resolve are skipped and reported.
    ///
    /// # Safety
    /// The resolved site must be valid for `bytes.len()` bytes.
    pub unsafe fn add_patch(
        &mut self,
        resolver: &dyn SignatureResolver,
        descriptor: PatchDescriptor,
    ) -> Result<Option<PatchKey>, HookError> {
        let address = match resolve_address(resolver, &descriptor.target) {
            Ok(address) => address,
            Err(e) if !descriptor.required => {
                tracing::warn!("Optional patch '{}' disabled: {}", descriptor.name, e);
                self.degraded.push(descriptor.name);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut patch = BytePatch::new(descriptor.name, address, descriptor.bytes);
        if descriptor.enabled {
            patch.apply()?;
        }

        Ok(Some(self.patches.insert(patch)))
    }

    /// Apply or remove a patch; returns whether it was applied before
    pub fn toggle_patch(&mut self, key: PatchKey, enabled: bool) -> Result<bool, HookError> {
        let patch = self.patches.get_mut(key).ok_or(HookError::NotFound)?;
        let before = patch.is_applied();
        unsafe { patch.set(enabled)? };
        Ok(before)
    }

    pub fn is_patch_applied(&self, key: PatchKey) -> bool {
        self.patches
            .get(key)
            .map(BytePatch::is_applied)
            .unwrap_or(false)
    }

    /// Record an optional feature that could not be set up
    pub fn mark_degraded(&mut self, name: &'static str, error: &HookError) {
        tracing::warn!("Optional feature '{}' disabled: {}", name, error);
        self.degraded.push(name);
    }

    /// Names of optional features disabled during resolution
    pub fn degraded(&self) -> &[&'static str] {
        &self.degraded
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Restore every hook and patch, most recent first
    pub fn uninstall_all(&mut self) {
        while let Some((name, key)) = self.hooks.pop() {
            let result = match key {
                HookKey::Inline(k) => inline::remove_inline_hook(k),
                HookKey::VTable(k) => vtable::remove_vtable_hook(k),
            };
            if let Err(e) = result {
                tracing::error!("Failed to remove hook '{}': {}", name, e);
            }
        }

        for (_, mut patch) in self.patches.drain() {
            if let Err(e) = unsafe { patch.remove() } {
                tracing::error!("Failed to remove patch '{}': {}", patch.name(), e);
            }
        }
    }
}

impl Drop for InterceptionLayer {
    fn drop(&mut self) {
        self.uninstall_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamedata::GamedataError;
    use std::collections::HashMap;

    /// Resolver over fixed tables
    #[derive(Default)]
    struct TableResolver {
        addresses: HashMap<&'static str, usize>,
        offsets: HashMap<&'static str, i64>,
    }

    impl SignatureResolver for TableResolver {
        fn resolve(&self, name: &str) -> Result<usize, GamedataError> {
            self.addresses
                .get(name)
                .copied()
                .ok_or_else(|| GamedataError::ScanFailed(name.to_string()))
        }

        fn offset(&self, name: &str) -> Result<i64, GamedataError> {
            self.offsets
                .get(name)
                .copied()
                .ok_or_else(|| GamedataError::OffsetNotFound(name.to_string()))
        }
    }

    extern "C" fn original_fn() -> f32 {
        0.75
    }

    extern "C" fn detour_fn() -> f32 {
        2.0
    }

    #[test]
    fn test_vtable_install_and_call_original() {
        let mut table: Vec<*const ()> = vec![std::ptr::null(), original_fn as *const ()];
        let mut resolver = TableResolver::default();
        resolver.offsets.insert("GetZoomDelta", 1);

        let mut layer = InterceptionLayer::new();
        let descriptor = HookDescriptor {
            name: "GetZoomDelta",
            target: HookTarget::VTable {
                table: table.as_mut_ptr() as usize,
                index: "GetZoomDelta",
            },
            detour: detour_fn as *const (),
        };

        let key = unsafe { layer.install(&resolver, &descriptor) }.unwrap();
        assert_eq!(table[1], detour_fn as *const ());
        assert_eq!(layer.hook_count(), 1);

        let original: extern "C" fn() -> f32 =
            unsafe { std::mem::transmute(layer.original(key).unwrap()) };
        assert_eq!(original(), 0.75);

        layer.uninstall(key).unwrap();
        assert_eq!(table[1], original_fn as *const ());
        assert_eq!(layer.hook_count(), 0);
    }

    #[test]
    fn test_unresolved_hook_is_an_error() {
        let resolver = TableResolver::default();
        let mut layer = InterceptionLayer::new();
        let descriptor = HookDescriptor {
            name: "GetCameraAutoRotateMode",
            target: HookTarget::Signature("GetCameraAutoRotateMode"),
            detour: detour_fn as *const (),
        };

        let result = unsafe { layer.install(&resolver, &descriptor) };
        assert!(matches!(result, Err(HookError::Unresolved { .. })));
        assert_eq!(layer.hook_count(), 0);
        assert!(layer.degraded().is_empty());
    }

    #[test]
    fn test_optional_patch_failure_degrades() {
        let resolver = TableResolver::default();
        let mut layer = InterceptionLayer::new();
        let descriptor = PatchDescriptor {
            name: "LegacyFix",
            target: HookTarget::Signature("LegacyFix"),
            bytes: vec![0x90],
            required: false,
            enabled: true,
        };

        let result = unsafe { layer.add_patch(&resolver, descriptor.clone()) }.unwrap();
        assert!(result.is_none());
        assert_eq!(layer.degraded(), &["LegacyFix"]);

        let required = PatchDescriptor {
            required: true,
            ..descriptor
        };
        let result = unsafe { layer.add_patch(&resolver, required) };
        assert!(matches!(result, Err(HookError::Unresolved { .. })));
    }

    #[test]
    fn test_patch_toggle_and_restore_on_uninstall() {
        let mut memory = vec![0xE8u8, 1, 2, 3, 4, 0x45];
        let mut resolver = TableResolver::default();
        resolver
            .addresses
            .insert("CameraCollision", memory.as_mut_ptr() as usize);

        let mut layer = InterceptionLayer::new();
        let key = unsafe {
            layer.add_patch(
                &resolver,
                PatchDescriptor {
                    name: "CameraCollision",
                    target: HookTarget::Signature("CameraCollision"),
                    bytes: vec![0x30, 0xC0, 0x90, 0x90, 0x90],
                    required: true,
                    enabled: false,
                },
            )
        }
        .unwrap()
        .unwrap();

        assert!(!layer.is_patch_applied(key));
        assert!(!layer.toggle_patch(key, true).unwrap());
        assert!(layer.toggle_patch(key, true).unwrap());
        assert_eq!(memory[..5], [0x30, 0xC0, 0x90, 0x90, 0x90]);

        layer.uninstall_all();
        assert_eq!(memory, vec![0xE8, 1, 2, 3, 4, 0x45]);
        assert!(matches!(layer.toggle_patch(key, true), Err(HookError::NotFound)));
    }

    #[test]
    fn test_offset_target() {
        let mut resolver = TableResolver::default();
        resolver.addresses.insert("Base", 0x1000);

        let target = HookTarget::Offset {
            base: "Base",
            offset: -0x10,
        };
        assert_eq!(resolve_address(&resolver, &target).unwrap(), 0xFF0);
        assert!(resolve_address(&resolver, &HookTarget::Address(0)).is_err());
    }
}
