#![cfg(unix)]

use crate::error::PageError;
use core::ptr::NonNull;
use libc::{c_void, mmap, munmap, sysconf, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, _SC_PAGESIZE};

/// Queries the host's VM page size via `sysconf(_SC_PAGESIZE)`.
pub fn query_page_size() -> usize {
    let size = unsafe { sysconf(_SC_PAGESIZE) };
    debug_assert!(size > 0, "sysconf(_SC_PAGESIZE) returned a non-positive size");
    size as usize
}

/// Maps `units * page_size` bytes, anonymous, private, read+write, zero-filled.
pub fn map_pages(units: usize, page_size: usize) -> Result<NonNull<u8>, PageError> {
    let len = units * page_size;
    let ptr = unsafe {
        mmap(
            core::ptr::null_mut(),
            len,
            PROT_READ | PROT_WRITE,
            MAP_PRIVATE | MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if ptr == MAP_FAILED {
        return Err(PageError::Acquire);
    }

    // mmap with MAP_ANONYMOUS is already zero-filled by the kernel.
    NonNull::new(ptr as *mut u8).ok_or(PageError::Acquire)
}

/// Returns a previously `map_pages`-returned region to the OS.
pub fn unmap_pages(base: NonNull<u8>, units: usize, page_size: usize) -> Result<(), PageError> {
    let len = units * page_size;
    let rc = unsafe { munmap(base.as_ptr() as *mut c_void, len) };
    if rc == 0 {
        Ok(())
    } else {
        Err(PageError::Release)
    }
}
