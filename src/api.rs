//! Public API (component F): `init`, `register`, `alloc`, `free`, and the
//! three introspection traversals, layered over the process-wide
//! singleton state described in the crate's concurrency model.
//!
//! ## Concurrency contract
//! Every function here assumes single-threaded, program-ordered access to
//! the process-wide registry and page size (§5 of the design notes: no
//! locking discipline is implemented). The registry is held behind an
//! `UnsafeCell` in a wrapper given an explicit `unsafe impl Sync` -- the
//! same shape as `ryancinsight-halo`'s `PageHeap`
//! (`src/allocator/core/page.rs`), which wraps a bare `*mut u8` the same
//! way for the same reason: the type itself isn't thread-safe, and the
//! crate is declaring by contract, not by construction, that it won't be
//! shared across threads. Porting this to a threaded context means
//! wrapping every call below in one mutex, or sharding per type.

use core::fmt::Write as _;
use core::mem;
use core::ptr::NonNull;

use crate::arena::Arena;
use crate::block::{self, BlockHeader, BlockState};
use crate::error::RegisterError;
use crate::page_size;
use crate::registry::{Registry, TypeRecord};

struct GlobalRegistry(core::cell::UnsafeCell<Registry>);

// Safety: see the module-level concurrency contract. No code path here
// is reachable from more than one thread.
unsafe impl Sync for GlobalRegistry {}

static REGISTRY: GlobalRegistry = GlobalRegistry(core::cell::UnsafeCell::new(Registry::new()));

fn registry() -> &'static mut Registry {
    unsafe { &mut *REGISTRY.0.get() }
}

/// Captures the host's page size. Idempotent: a second call re-queries
/// the same value rather than erroring.
pub fn init() {
    page_size::init();
}

/// Registers a record type (§4.6, §4.2).
pub fn register(name: &str, size: usize) -> Result<(), RegisterError> {
    registry().register(name, size).map(|_| ())
}

/// Allocates `units` zero-initialized instances of the type registered as
/// `name`. Returns `None` if the type is unknown, the request exceeds a
/// single arena's payload, or the OS refuses to hand over a page.
pub fn alloc(name: &str, units: usize) -> Option<NonNull<u8>> {
    let mut record = registry().lookup(name)?;
    let type_record = unsafe { record.as_mut() };

    let bytes = units.checked_mul(type_record.size)?;
    if bytes == 0 || bytes > Registry::max_record_size() {
        return None;
    }

    let block = unsafe { block::alloc_for(type_record, bytes) }.ok()?;
    let payload = unsafe { BlockHeader::payload_ptr(block) };
    unsafe { core::ptr::write_bytes(payload.as_ptr(), 0, bytes) };
    Some(payload)
}

/// Frees a pointer previously returned by [`alloc`].
///
/// # Safety
/// `ptr` must have been returned by a prior, not-yet-freed call to
/// [`alloc`]. Any other pointer is undefined behavior; debug builds
/// assert a magic tag on the recovered block header as a best-effort
/// check, but this is not a guarantee (§7).
pub fn free(ptr: NonNull<u8>) {
    unsafe {
        let block = BlockHeader::from_payload_ptr(ptr);
        let arena = Arena::from_block(block);
        let mut owner = arena.as_ref().owner;
        let type_record = owner.as_mut();
        block::free_block(type_record, block).expect("releasing the arena's page failed");
    }
}

/// One line per registered type, in registry order: `name: size`.
pub fn print_registered_types() -> String {
    let mut out = String::new();
    for record in registry().records() {
        let r = unsafe { record.as_ref() };
        let _ = writeln!(out, "{}: {}", r.name_str(), r.size);
    }
    out
}

/// Arena-level dump. With `name` given, restricted to that type; with
/// `None`, every registered type, in registry order. Within a type,
/// arenas are visited head-first and blocks in ascending address order.
pub fn print_memory_usage(name: Option<&str>) -> String {
    let mut out = String::new();

    let targets: Vec<NonNull<TypeRecord>> = match name {
        Some(n) => registry().lookup(n).into_iter().collect(),
        None => registry().records().collect(),
    };

    for record in targets {
        let r = unsafe { record.as_ref() };
        for arena_node in r.arena_head.iter() {
            let arena = unsafe { Arena::from_chain(arena_node) };
            let mut cursor = Some(unsafe { Arena::first_block(arena) });
            let mut index = 0usize;
            while let Some(block) = cursor {
                let header = unsafe { block.as_ref() };
                let _ = writeln!(
                    out,
                    "{:p} {} {} {} {} {:?} {:?}",
                    block.as_ptr(),
                    index,
                    header.state,
                    header.data_size,
                    header.offset,
                    header.prev_block.map(|p| p.as_ptr()),
                    header.next_block.map(|p| p.as_ptr()),
                );
                index += 1;
                cursor = header.next_block;
            }
        }
    }

    out
}

/// Per-type block accounting: `total_blocks`, `free_blocks`,
/// `allocated_blocks`, `app_memory`.
pub fn print_block_usage() -> String {
    let mut out = String::new();

    for record in registry().records() {
        let r = unsafe { record.as_ref() };
        let (mut total, mut free, mut allocated) = (0usize, 0usize, 0usize);

        for arena_node in r.arena_head.iter() {
            let arena = unsafe { Arena::from_chain(arena_node) };
            let mut cursor = Some(unsafe { Arena::first_block(arena) });
            while let Some(block) = cursor {
                let header = unsafe { block.as_ref() };
                total += 1;
                match header.state {
                    BlockState::Free => free += 1,
                    BlockState::Allocated => allocated += 1,
                }
                cursor = header.next_block;
            }
        }

        let app_memory = allocated * (mem::size_of::<BlockHeader>() + r.size);
        let _ = writeln!(
            out,
            "{}: total_blocks={} free_blocks={} allocated_blocks={} app_memory={}",
            r.name_str(),
            total,
            free,
            allocated,
            app_memory
        );
    }

    out
}
