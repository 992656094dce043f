//! Inline function hooks
//!
//! Pure Rust function detouring for x86_64. The first instructions of the
//! target are decoded and relocated with iced-x86 into a trampoline that
//! jumps back into the target; the target itself is overwritten with a
//! `jmp rel32` into a relay that jumps absolutely to the detour.

use iced_x86::{
    BlockEncoder, BlockEncoderOptions, Decoder, DecoderOptions, FlowControl, Instruction,
    InstructionBlock,
};
use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};
use std::sync::LazyLock;

use super::patch::{read_bytes, write_bytes};
use super::trampoline;
use crate::gamedata::GamedataError;

new_key_type! {
    /// Handle for an inline hook
    pub struct InlineHookKey;
}

/// Error type for hook operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Hook target '{name}' not found: {source}")]
    Unresolved {
        name: String,
        #[source]
        source: GamedataError,
    },

    #[error("Failed to create detour: {0}")]
    DetourCreation(String),

    #[error("Hook not found")]
    NotFound,

    #[error("Memory protection failed: {0}")]
    MemoryProtection(String),

    #[error("Invalid address: {0:x}")]
    InvalidAddress(usize),

    #[error("Instruction relocation failed: {0}")]
    RelocationFailed(String),
}

/// `jmp rel32`
const JMP_REL32_LEN: usize = 5;

/// `jmp [rip+0]` followed by the 64-bit destination
const JMP_ABS_LEN: usize = 14;

/// Longest prologue we are willing to relocate
const MAX_PROLOGUE: usize = 32;

/// Room for the relocated prologue (short branches may grow) plus the jump back
const TRAMPOLINE_SIZE: usize = MAX_PROLOGUE * 3 + JMP_ABS_LEN;

/// Internal storage for an inline hook
struct InlineHookEntry {
    /// Target function address
    target: usize,

    /// Bytes overwritten at the target
    original_bytes: Vec<u8>,

    /// Trampoline (original function) pointer
    trampoline: *const (),

    /// Whether the jump is currently written
    enabled: bool,

    /// Description for debugging
    name: String,
}

// SAFETY: Hook entries are protected by RwLock and only hold addresses
unsafe impl Send for InlineHookEntry {}
unsafe impl Sync for InlineHookEntry {}

impl Drop for InlineHookEntry {
    fn drop(&mut self) {
        if self.enabled {
            // The trampoline page is leaked on purpose: a host thread may still
            // be executing inside it.
            if let Err(e) = unsafe { write_bytes(self.target as *mut u8, &self.original_bytes) } {
                tracing::error!("Failed to restore '{}' at {:x}: {}", self.name, self.target, e);
            }
        }
    }
}

/// Global inline hook registry
static INLINE_HOOKS: LazyLock<RwLock<SlotMap<InlineHookKey, InlineHookEntry>>> =
    LazyLock::new(|| RwLock::new(SlotMap::with_key()));

/// Encode `jmp [rip+0]; dq destination`
fn absolute_jump(destination: usize) -> [u8; JMP_ABS_LEN] {
    let mut bytes = [0u8; JMP_ABS_LEN];
    bytes[..6].copy_from_slice(&[0xFF, 0x25, 0x00, 0x00, 0x00, 0x00]);
    bytes[6..].copy_from_slice(&(destination as u64).to_le_bytes());
    bytes
}

/// Encode `jmp rel32` from `from` to `to`, padded with NOPs to `len`
fn relative_jump(from: usize, to: usize, len: usize) -> Result<Vec<u8>, HookError> {
    let rel = (to as i64) - (from as i64 + JMP_REL32_LEN as i64);
    let rel = i32::try_from(rel)
        .map_err(|_| HookError::DetourCreation(format!("relay {:x} out of rel32 range", to)))?;

    let mut bytes = Vec::with_capacity(len);
    bytes.push(0xE9);
    bytes.extend_from_slice(&rel.to_le_bytes());
    bytes.resize(len, 0x90);
    Ok(bytes)
}

/// Decode whole instructions from `code` until at least a `jmp rel32` fits
///
/// Fails when the function returns or jumps away before enough bytes are
/// covered, since the overwritten jump would then clobber foreign code.
pub fn decode_prologue(code: &[u8], ip: u64) -> Result<Vec<Instruction>, HookError> {
    let mut decoder = Decoder::with_ip(64, code, ip, DecoderOptions::NONE);
    let mut instructions = Vec::new();
    let mut covered = 0usize;

    while covered < JMP_REL32_LEN {
        if !decoder.can_decode() {
            return Err(HookError::RelocationFailed(format!(
                "ran out of bytes after {} of {}",
                covered, JMP_REL32_LEN
            )));
        }

        let instruction = decoder.decode();
        if instruction.is_invalid() {
            return Err(HookError::RelocationFailed(format!(
                "invalid instruction at {:x}",
                instruction.ip()
            )));
        }

        covered += instruction.len();
        let ends_flow = matches!(
            instruction.flow_control(),
            FlowControl::Return | FlowControl::UnconditionalBranch | FlowControl::IndirectBranch
        );
        instructions.push(instruction);

        if ends_flow && covered < JMP_REL32_LEN {
            return Err(HookError::RelocationFailed(
                "function too short to hook".to_string(),
            ));
        }
    }

    Ok(instructions)
}

/// Number of bytes a hook at the start of `code` has to overwrite
pub fn prologue_length(code: &[u8], ip: u64) -> Result<usize, HookError> {
    Ok(decode_prologue(code, ip)?.iter().map(Instruction::len).sum())
}

/// Create an inline hook for a function
///
/// # Safety
/// - `target` must be a valid function pointer
/// - `detour` must be a valid function pointer with a compatible signature
/// - no thread may execute the target's first instructions while it is patched
///
/// # Returns
/// A key to manage the hook, and a pointer to call the original function
pub unsafe fn create_inline_hook(
    name: &str,
    target: *const (),
    detour: *const (),
) -> Result<(InlineHookKey, *const ()), HookError> {
    if target.is_null() {
        return Err(HookError::InvalidAddress(0));
    }

    tracing::debug!(
        "Creating inline hook '{}' at {:x} -> {:x}",
        name,
        target as usize,
        detour as usize
    );

    let target_addr = target as usize;
    let code = std::slice::from_raw_parts(target as *const u8, MAX_PROLOGUE);
    let prologue = decode_prologue(code, target_addr as u64)?;
    let prologue_len: usize = prologue.iter().map(Instruction::len).sum();

    let trampoline = trampoline::alloc_near(target as *const u8, TRAMPOLINE_SIZE)
        .ok_or_else(|| HookError::DetourCreation("trampoline allocation failed".to_string()))?;
    let relay = trampoline::alloc_near(target as *const u8, JMP_ABS_LEN)
        .ok_or_else(|| HookError::DetourCreation("relay allocation failed".to_string()))?;

    // Relocated prologue, then back into the target past the overwritten bytes
    let block = InstructionBlock::new(&prologue, trampoline.as_ptr() as u64);
    let encoded = BlockEncoder::encode(64, block, BlockEncoderOptions::NONE)
        .map_err(|e| HookError::RelocationFailed(e.to_string()))?;

    let mut trampoline_code = encoded.code_buffer;
    trampoline_code.extend_from_slice(&absolute_jump(target_addr + prologue_len));
    if trampoline_code.len() > TRAMPOLINE_SIZE {
        return Err(HookError::RelocationFailed(format!(
            "relocated prologue needs {} bytes",
            trampoline_code.len()
        )));
    }
    write_bytes(trampoline.as_ptr(), &trampoline_code)?;
    write_bytes(relay.as_ptr(), &absolute_jump(detour as usize))?;

    let jump_bytes = relative_jump(target_addr, relay.as_ptr() as usize, prologue_len)?;
    let original_bytes = read_bytes(target as *const u8, prologue_len);
    write_bytes(target as *mut u8, &jump_bytes)?;

    let entry = InlineHookEntry {
        target: target_addr,
        original_bytes,
        trampoline: trampoline.as_ptr() as *const (),
        enabled: true,
        name: name.to_string(),
    };

    let original = entry.trampoline;
    let key = INLINE_HOOKS.write().insert(entry);

    tracing::info!("Created inline hook '{}' at {:x}", name, target_addr);

    Ok((key, original))
}

/// Disable an inline hook (keeps the trampoline but restores original bytes)
pub fn disable_inline_hook(key: InlineHookKey) -> Result<(), HookError> {
    let mut hooks = INLINE_HOOKS.write();
    let entry = hooks.get_mut(key).ok_or(HookError::NotFound)?;

    if !entry.enabled {
        return Ok(());
    }

    unsafe { write_bytes(entry.target as *mut u8, &entry.original_bytes)? };

    entry.enabled = false;
    tracing::info!("Disabled inline hook '{}' at {:x}", entry.name, entry.target);
    Ok(())
}

/// Remove an inline hook completely
pub fn remove_inline_hook(key: InlineHookKey) -> Result<(), HookError> {
    disable_inline_hook(key)?;

    let entry = INLINE_HOOKS.write().remove(key).ok_or(HookError::NotFound)?;
    tracing::info!("Removed inline hook '{}' at {:x}", entry.name, entry.target);
    Ok(())
}

/// Get the original function trampoline for an inline hook
pub fn get_inline_hook_original(key: InlineHookKey) -> Option<*const ()> {
    INLINE_HOOKS.read().get(key).map(|e| e.trampoline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prologue_length_covers_jump() {
        // push rbp; mov rbp, rsp; sub rsp, 0x20; ret
        let code = [0x55, 0x48, 0x89, 0xE5, 0x48, 0x83, 0xEC, 0x20, 0xC3];
        assert_eq!(prologue_length(&code, 0x1000).unwrap(), 8);

        // sub rsp, 0x28; nop
        let code = [0x48, 0x83, 0xEC, 0x28, 0x90, 0xC3];
        assert_eq!(prologue_length(&code, 0x1000).unwrap(), 5);
    }

    #[test]
    fn test_prologue_rejects_short_functions() {
        // xor eax, eax; ret
        let code = [0x31, 0xC0, 0xC3, 0xCC, 0xCC, 0xCC];
        assert!(matches!(
            prologue_length(&code, 0x1000),
            Err(HookError::RelocationFailed(_))
        ));
    }

    #[test]
    fn test_relative_jump_encoding() {
        let bytes = relative_jump(0x1000, 0x2000, 7).unwrap();
        assert_eq!(bytes[0], 0xE9);
        assert_eq!(i32::from_le_bytes(bytes[1..5].try_into().unwrap()), 0x2000 - 0x1005);
        assert_eq!(&bytes[5..], &[0x90, 0x90]);

        assert!(relative_jump(0x1000, 0x1_0000_1000, 5).is_err());
    }

    #[test]
    fn test_absolute_jump_encoding() {
        let bytes = absolute_jump(0x1122_3344_5566_7788);
        assert_eq!(&bytes[..6], &[0xFF, 0x25, 0, 0, 0, 0]);
        assert_eq!(u64::from_le_bytes(bytes[6..].try_into().unwrap()), 0x1122_3344_5566_7788);
    }

    #[test]
    fn test_unknown_key() {
        let key = InlineHookKey::default();
        assert!(get_inline_hook_original(key).is_none());
        assert!(matches!(remove_inline_hook(key), Err(HookError::NotFound)));
    }
}
