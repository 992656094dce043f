//! Hook system
//!
//! Provides the interception primitives used against the host camera:
//! - Inline hooks (function detours with a relocated-prologue trampoline)
//! - VTable hooks (virtual function pointer replacement)
//! - Byte patches (toggleable raw code/data substitution)
//!
//! [`InterceptionLayer`] ties them to gamedata resolution and owns them for
//! the lifetime of one attach.

pub mod inline;
pub mod manager;
pub mod patch;
mod trampoline;
pub mod vtable;

pub use inline::{HookError, InlineHookKey};
pub use manager::{
    resolve_address, HookDescriptor, HookKey, HookTarget, InterceptionLayer, PatchDescriptor,
    PatchKey,
};
pub use patch::BytePatch;
pub use vtable::VTableHookKey;
