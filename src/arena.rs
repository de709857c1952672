//! Per-type arena: one OS page holding a chain of [`BlockHeader`]s
//! (component C, the "vm_page_for_data" of the original design).
//!
//! Grounded on `mm_allocate_data_vm_page` / `_mm_delete_and_free_data_vm_page`
//! (`examples/original_source/src/mem_mang/src/mm.c`) and on the intrusive
//! `FreeBlock` / page-spawning style of `ryancinsight-halo`'s
//! `src/alloc/buddy.rs`.

use core::mem;
use core::ptr::{self, NonNull};

use crate::block::BlockHeader;
use crate::error::PageError;
use crate::list::{List, Node};
use crate::page_size;
use crate::registry::TypeRecord;
use crate::syscall;

/// One OS page: a chain link into the owning type's arena list, a
/// back-reference to that type, and the first block header embedded at a
/// fixed offset. Everything after `first_block`'s header is payload bytes,
/// carved up by later splits.
#[repr(C)]
pub struct Arena {
    pub chain: Node,
    pub owner: NonNull<TypeRecord>,
    pub first_block: BlockHeader,
}

impl Arena {
    /// `O` in the design notes: byte offset from the arena's base to the
    /// start of its first (and every subsequent) block header.
    pub fn header_offset() -> usize {
        mem::offset_of!(Arena, first_block)
    }

    pub fn chain_offset() -> usize {
        mem::offset_of!(Arena, chain)
    }

    /// Bytes available to blocks: `S - O`.
    pub fn payload_capacity() -> usize {
        page_size::get() - Self::header_offset()
    }

    /// # Safety
    /// `node` must be the `chain` field of a live `Arena`.
    pub unsafe fn from_chain(node: NonNull<Node>) -> NonNull<Arena> {
        NonNull::new_unchecked(List::base_of(node, Self::chain_offset()) as *mut Arena)
    }

    pub unsafe fn chain_node(arena: NonNull<Arena>) -> NonNull<Node> {
        NonNull::new_unchecked(&mut (*arena.as_ptr()).chain as *mut Node)
    }

    /// Recovers an arena from a block via the block's stored `offset`
    /// (component design §4.5 — the sole owner-recovery path for `free`).
    ///
    /// # Safety
    /// `block` must be a live block whose `offset` field was set relative
    /// to a currently-mapped `Arena`.
    pub unsafe fn from_block(block: NonNull<BlockHeader>) -> NonNull<Arena> {
        let offset = block.as_ref().offset;
        NonNull::new_unchecked((block.as_ptr() as *mut u8).sub(offset) as *mut Arena)
    }

    pub unsafe fn first_block(arena: NonNull<Arena>) -> NonNull<BlockHeader> {
        NonNull::new_unchecked(&mut (*arena.as_ptr()).first_block as *mut BlockHeader)
    }

    /// Acquires a fresh page and initializes it as a single-block arena
    /// owned by `owner` (§4.3.1). The sole block is left `FREE` and is
    /// *not* registered in any free-index -- the caller's split step
    /// handles that.
    pub fn spawn(owner: NonNull<TypeRecord>) -> Result<NonNull<Arena>, PageError> {
        let page_size = page_size::get();
        let base = syscall::map_pages(1, page_size)?;
        let arena_ptr = base.as_ptr() as *mut Arena;
        let offset = Self::header_offset();
        let data_size = Self::payload_capacity() - mem::size_of::<BlockHeader>();

        unsafe {
            ptr::write(
                arena_ptr,
                Arena {
                    chain: Node::new(),
                    owner,
                    first_block: BlockHeader::new_free(data_size, offset),
                },
            );
        }

        Ok(unsafe { NonNull::new_unchecked(arena_ptr) })
    }

    /// Returns the arena's page to the OS. Callers must have already
    /// unlinked it from its type's arena chain and removed its sole block
    /// from the free-index.
    ///
    /// # Safety
    /// `arena` must not be referenced again after this call.
    pub unsafe fn teardown(arena: NonNull<Arena>) -> Result<(), PageError> {
        let base = NonNull::new_unchecked(arena.as_ptr() as *mut u8);
        syscall::unmap_pages(base, 1, page_size::get())
    }

    /// True when `block` is the arena's only block and it spans the whole
    /// payload -- the "empty arena" predicate of §4.3.
    pub unsafe fn is_sole_and_empty(block: NonNull<BlockHeader>) -> bool {
        let b = block.as_ref();
        b.prev_block.is_none()
            && b.next_block.is_none()
            && b.data_size == Self::payload_capacity() - mem::size_of::<BlockHeader>()
    }
}
