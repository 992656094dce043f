//! Trampoline memory allocation
//!
//! Allocates executable memory within ±2GB of hook targets so a `jmp rel32`
//! written over the target can reach it, and so relocated RIP-relative
//! instructions keep a 32-bit displacement.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ptr::NonNull;

/// Page size (4KB on most systems)
const PAGE_SIZE: usize = 4096;

/// Maximum distance for a rel32 jump (2GB minus slack)
pub const MAX_RANGE: usize = 0x7FFF_0000;

/// Allocation granularity inside a page
const ALIGN: usize = 16;

/// Global trampoline allocator
static ALLOCATOR: Mutex<TrampolineAllocator> = Mutex::new(TrampolineAllocator::new());

/// Bump allocator over executable pages
struct TrampolineAllocator {
    /// Pages allocated, keyed by base address
    pages: BTreeMap<usize, Page>,
}

struct Page {
    base: *mut u8,
    used: usize,
}

// SAFETY: Pages are only touched while the allocator mutex is held
unsafe impl Send for Page {}

fn distance(a: usize, b: usize) -> usize {
    a.abs_diff(b)
}

impl TrampolineAllocator {
    const fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    fn alloc_near(&mut self, target: usize, size: usize) -> Option<NonNull<u8>> {
        let size = size.next_multiple_of(ALIGN);
        if size > PAGE_SIZE {
            return None;
        }

        // Reuse a page in range with room left
        for (&base, page) in &mut self.pages {
            if distance(base, target) < MAX_RANGE && page.used + size <= PAGE_SIZE {
                let ptr = unsafe { page.base.add(page.used) };
                page.used += size;
                return NonNull::new(ptr);
            }
        }

        let base = self.map_page_near(target)?;
        self.pages.insert(base as usize, Page { base, used: size });
        NonNull::new(base)
    }

    #[cfg(unix)]
    fn map_page_near(&mut self, target: usize) -> Option<*mut u8> {
        use nix::sys::mman::{mmap_anonymous, munmap, MapFlags, ProtFlags};
        use std::num::NonZeroUsize;

        let len = NonZeroUsize::new(PAGE_SIZE)?;
        let prot = ProtFlags::PROT_READ | ProtFlags::PROT_WRITE | ProtFlags::PROT_EXEC;
        let flags = MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS;

        let start = target.saturating_sub(MAX_RANGE) & !(PAGE_SIZE - 1);
        let end = target.saturating_add(MAX_RANGE);

        for hint in (start..end).step_by(PAGE_SIZE * 64) {
            let Some(hint) = NonZeroUsize::new(hint) else {
                continue;
            };

            let Ok(ptr) = (unsafe { mmap_anonymous(Some(hint), len, prot, flags) }) else {
                continue;
            };

            let base = ptr.as_ptr() as *mut u8;
            if distance(base as usize, target) < MAX_RANGE {
                return Some(base);
            }

            // The kernel treated the hint loosely; try the next one
            unsafe {
                let _ = munmap(ptr, PAGE_SIZE);
            }
        }

        tracing::error!("Failed to allocate trampoline page near {:#x}", target);
        None
    }

    #[cfg(windows)]
    fn map_page_near(&mut self, target: usize) -> Option<*mut u8> {
        use windows::Win32::System::Memory::{
            VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE,
            PAGE_EXECUTE_READWRITE,
        };

        // Allocation granularity is 64KB on Windows
        let start = target.saturating_sub(MAX_RANGE) & !0xFFFF;
        let end = target.saturating_add(MAX_RANGE);

        for hint in (start..end).step_by(0x10000) {
            if hint == 0 {
                continue;
            }

            let result = unsafe {
                VirtualAlloc(
                    Some(hint as *const std::ffi::c_void),
                    PAGE_SIZE,
                    MEM_COMMIT | MEM_RESERVE,
                    PAGE_EXECUTE_READWRITE,
                )
            };

            if result.is_null() {
                continue;
            }

            let base = result as *mut u8;
            if distance(base as usize, target) < MAX_RANGE {
                return Some(base);
            }

            unsafe {
                let _ = VirtualFree(result, 0, MEM_RELEASE);
            }
        }

        tracing::error!("Failed to allocate trampoline page near {:#x}", target);
        None
    }
}

/// Allocate `size` bytes of executable memory within rel32 range of `target`
pub fn alloc_near(target: *const u8, size: usize) -> Option<NonNull<u8>> {
    ALLOCATOR.lock().alloc_near(target as usize, size)
}
