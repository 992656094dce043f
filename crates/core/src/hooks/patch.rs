//! Raw byte patches
//!
//! A patch replaces a fixed run of code or data bytes. Applying records the
//! bytes currently in memory, applying again is a no-op, and removing writes
//! back exactly what was recorded.

use super::inline::HookError;

/// Write bytes into host memory, lifting page protection when needed.
///
/// Pages that are already writable are written directly; otherwise the
/// protection is raised for the duration of the write and restored after.
///
/// # Safety
/// `address..address + bytes.len()` must be mapped and nothing may execute
/// or read it concurrently.
pub unsafe fn write_bytes(address: *mut u8, bytes: &[u8]) -> Result<(), HookError> {
    if address.is_null() {
        return Err(HookError::InvalidAddress(0));
    }
    if bytes.is_empty() {
        return Ok(());
    }

    let writable = region::query(address as *const u8)
        .map(|r| r.protection().contains(region::Protection::WRITE))
        .unwrap_or(false);

    if writable {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), address, bytes.len());
        return Ok(());
    }

    // Guard restores the previous protection on drop
    let _guard = region::protect_with_handle(
        address as *const u8,
        bytes.len(),
        region::Protection::READ_WRITE_EXECUTE,
    )
    .map_err(|e| HookError::MemoryProtection(e.to_string()))?;

    std::ptr::copy_nonoverlapping(bytes.as_ptr(), address, bytes.len());
    Ok(())
}

/// Read `len` bytes from host memory
///
/// # Safety
/// `address..address + len` must be mapped and readable.
pub unsafe fn read_bytes(address: *const u8, len: usize) -> Vec<u8> {
    std::slice::from_raw_parts(address, len).to_vec()
}

/// A toggleable replacement of raw bytes at a fixed address
#[derive(Debug)]
pub struct BytePatch {
    name: String,
    address: usize,
    replacement: Vec<u8>,
    /// Bytes that were in memory when the patch was applied
    original: Option<Vec<u8>>,
}

impl BytePatch {
    /// Describe a patch; nothing is written until [`BytePatch::apply`]
    pub fn new(name: impl Into<String>, address: usize, replacement: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            address,
            replacement,
            original: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_applied(&self) -> bool {
        self.original.is_some()
    }

    /// Write the replacement bytes. No-op when already applied.
    ///
    /// # Safety
    /// The patch address must be valid for `replacement.len()` bytes.
    pub unsafe fn apply(&mut self) -> Result<(), HookError> {
        if self.original.is_some() {
            return Ok(());
        }

        let ptr = self.address as *mut u8;
        let original = read_bytes(ptr, self.replacement.len());
        write_bytes(ptr, &self.replacement)?;
        self.original = Some(original);

        tracing::debug!("Applied patch '{}' at {:#x}", self.name, self.address);
        Ok(())
    }

    /// Restore the recorded bytes. No-op when not applied.
    ///
    /// # Safety
    /// The patch address must still be valid.
    pub unsafe fn remove(&mut self) -> Result<(), HookError> {
        let Some(original) = self.original.as_deref() else {
            return Ok(());
        };

        write_bytes(self.address as *mut u8, original)?;
        self.original = None;

        tracing::debug!("Removed patch '{}' at {:#x}", self.name, self.address);
        Ok(())
    }

    /// Apply or remove depending on `enabled`
    ///
    /// # Safety
    /// See [`BytePatch::apply`].
    pub unsafe fn set(&mut self, enabled: bool) -> Result<(), HookError> {
        if enabled {
            self.apply()
        } else {
            self.remove()
        }
    }
}

impl Drop for BytePatch {
    fn drop(&mut self) {
        if self.is_applied() {
            if let Err(e) = unsafe { self.remove() } {
                tracing::error!("Failed to restore patch '{}': {}", self.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_is_idempotent() {
        let mut memory = vec![0xE8u8, 0x11, 0x22, 0x33, 0x44, 0x45];
        let address = memory.as_mut_ptr() as usize;
        let mut patch = BytePatch::new("collision", address, vec![0x30, 0xC0, 0x90, 0x90, 0x90]);

        unsafe {
            patch.apply().unwrap();
            let once = memory.clone();
            patch.apply().unwrap();
            assert_eq!(memory, once);
            assert_eq!(memory, vec![0x30, 0xC0, 0x90, 0x90, 0x90, 0x45]);
            assert!(patch.is_applied());
        }
    }

    #[test]
    fn test_remove_restores_exact_bytes() {
        let mut memory = vec![0xE8u8, 0x11, 0x22, 0x33, 0x44, 0x45];
        let before = memory.clone();
        let address = memory.as_mut_ptr() as usize;
        let mut patch = BytePatch::new("collision", address, vec![0x30, 0xC0, 0x90, 0x90, 0x90]);

        unsafe {
            patch.apply().unwrap();
            patch.apply().unwrap();
            patch.remove().unwrap();
            assert_eq!(memory, before);

            // Removing again must not touch memory
            patch.remove().unwrap();
            assert_eq!(memory, before);
        }
    }

    #[test]
    fn test_set_and_drop() {
        let mut memory = vec![1u8, 2, 3];
        let address = memory.as_mut_ptr() as usize;

        {
            let mut patch = BytePatch::new("data", address, vec![9, 9]);
            unsafe {
                patch.set(true).unwrap();
                assert_eq!(memory[..2], [9, 9]);
                patch.set(false).unwrap();
                assert!(!patch.is_applied());
                assert_eq!(memory, vec![1, 2, 3]);
                patch.set(true).unwrap();
            }
        }

        // Dropping an applied patch restores memory
        assert_eq!(memory, vec![1, 2, 3]);
    }
}
