#![cfg(windows)]

use crate::error::PageError;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use windows_sys::Win32::System::Memory::{VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE};
use windows_sys::Win32::System::SystemInformation::GetSystemInfo;

/// Queries the host's VM page size via `GetSystemInfo`.
pub fn query_page_size() -> usize {
    unsafe {
        let mut info = MaybeUninit::zeroed();
        GetSystemInfo(info.as_mut_ptr());
        info.assume_init().dwPageSize as usize
    }
}

/// Reserves and commits `units * page_size` bytes, read+write, zero-filled.
pub fn map_pages(units: usize, page_size: usize) -> Result<NonNull<u8>, PageError> {
    let len = units * page_size;
    let ptr = unsafe { VirtualAlloc(core::ptr::null_mut(), len, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE) };
    NonNull::new(ptr as *mut u8).ok_or(PageError::Acquire)
}

/// Releases a previously `map_pages`-returned region. `units`/`page_size`
/// are unused: `VirtualFree` with `MEM_RELEASE` requires a size of 0 and
/// always frees the whole region a matching `VirtualAlloc` reserved.
pub fn unmap_pages(base: NonNull<u8>, _units: usize, _page_size: usize) -> Result<(), PageError> {
    let ok = unsafe { VirtualFree(base.as_ptr() as *mut _, 0, MEM_RELEASE) };
    if ok != 0 {
        Ok(())
    } else {
        Err(PageError::Release)
    }
}
