//! The process-wide page size, `S` in the design notes.
//!
//! Captured once from the host at [`init`] time and read everywhere a
//! component needs to know how many bytes an arena spans. Modeled as a
//! lazily-initialized global guarded by the single-threaded contract
//! documented on [`crate::api`] — same shape as `ryancinsight-halo`'s
//! `PageHeap` (`src/allocator/core/page.rs`), which also wraps a raw,
//! non-thread-safe value in an explicit `unsafe impl Sync`.

use core::cell::Cell;

use crate::syscall;

struct PageSizeCell(Cell<usize>);

// Safety: access to this process-wide singleton is confined to the
// single-threaded contract documented on the public API; there is no
// concurrent access to race against.
unsafe impl Sync for PageSizeCell {}

static PAGE_SIZE: PageSizeCell = PageSizeCell(Cell::new(0));

/// Queries the host and latches the page size. Idempotent; safe to call
/// more than once (later calls are no-ops once a nonzero value is set).
pub fn init() {
    if PAGE_SIZE.0.get() == 0 {
        PAGE_SIZE.0.set(syscall::query_page_size());
    }
}

/// Returns the latched page size.
///
/// # Panics
/// Panics in debug builds if [`init`] has not yet run.
pub fn get() -> usize {
    let size = PAGE_SIZE.0.get();
    debug_assert!(size > 0, "page_size::init() must run before the allocator is used");
    size
}
