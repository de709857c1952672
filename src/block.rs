//! The per-arena block engine (component C): split on allocation, merge
//! on free, and the embedded metadata header both operations share.
//!
//! Grounded on `_mm_split_free_data_block_for_allocation`,
//! `_mm_bind_blocks_after_splitting`, `_mm_merge_free_blocks` and
//! `_mm_allocate_free_data_block` in
//! `examples/original_source/src/mem_mang/src/mm.c`; the intrusive-header
//! shape (metadata embedded in front of the payload, linked in physical
//! address order) mirrors `ryancinsight-halo`'s `src/alloc/buddy.rs`
//! `FreeBlock` / split-merge loops.

use core::fmt;
use core::mem;
use core::ptr::{self, NonNull};

use crate::arena::Arena;
use crate::error::PageError;
use crate::list::Node;
use crate::registry::TypeRecord;

/// Tag written into every header and checked (debug builds only) before a
/// block is coalesced, to catch a `free()` call on a pointer `alloc`
/// never produced. Zero cost in release builds.
const MAGIC: u32 = 0x424c_4b48; // "BLKH"

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Free,
    Allocated,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Free => write!(f, "FREE"),
            BlockState::Allocated => write!(f, "ALLOCATED"),
        }
    }
}

/// Metadata embedded immediately in front of a block's payload bytes.
/// `glue` is the block's free-index link; it is garbage whenever
/// `state == Allocated` and must not be read.
#[repr(C)]
pub struct BlockHeader {
    pub state: BlockState,
    pub data_size: usize,
    pub prev_block: Option<NonNull<BlockHeader>>,
    pub next_block: Option<NonNull<BlockHeader>>,
    pub offset: usize,
    pub glue: Node,
    magic: u32,
}

impl BlockHeader {
    pub fn new_free(data_size: usize, offset: usize) -> Self {
        BlockHeader {
            state: BlockState::Free,
            data_size,
            prev_block: None,
            next_block: None,
            offset,
            glue: Node::new(),
            magic: MAGIC,
        }
    }

    pub fn glue_offset() -> usize {
        mem::offset_of!(BlockHeader, glue)
    }

    /// # Safety
    /// `node` must be the `glue` field of a live `BlockHeader`.
    pub unsafe fn from_glue(node: NonNull<Node>) -> NonNull<BlockHeader> {
        NonNull::new_unchecked((node.as_ptr() as *mut u8).sub(Self::glue_offset()) as *mut BlockHeader)
    }

    pub unsafe fn glue_node(block: NonNull<BlockHeader>) -> NonNull<Node> {
        NonNull::new_unchecked(&mut (*block.as_ptr()).glue as *mut Node)
    }

    /// Address of the first payload byte following this header.
    pub unsafe fn payload_ptr(block: NonNull<BlockHeader>) -> NonNull<u8> {
        NonNull::new_unchecked((block.as_ptr() as *mut u8).add(mem::size_of::<BlockHeader>()))
    }

    /// Recovers a block header from a pointer `alloc` handed to a caller.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior `alloc` call.
    pub unsafe fn from_payload_ptr(ptr: NonNull<u8>) -> NonNull<BlockHeader> {
        NonNull::new_unchecked(ptr.as_ptr().sub(mem::size_of::<BlockHeader>()) as *mut BlockHeader)
    }

    fn check_magic(block: NonNull<BlockHeader>) {
        debug_assert_eq!(
            unsafe { (*block.as_ptr()).magic },
            MAGIC,
            "free() called with a pointer not produced by alloc"
        );
    }
}

/// Finds or creates a free block of at least `bytes` and carves an
/// allocation out of it (§4.3 allocation algorithm).
///
/// # Safety
/// `type_record` must be the live owner of every arena reachable from its
/// `arena_head` and `free_index`.
pub unsafe fn alloc_for(
    type_record: &mut TypeRecord,
    bytes: usize,
) -> Result<NonNull<BlockHeader>, PageError> {
    let reusable = type_record
        .free_index
        .peek_largest()
        .filter(|b| b.as_ref().data_size >= bytes);

    let chosen = match reusable {
        Some(block) => {
            type_record.free_index.remove(block);
            block
        }
        None => {
            let owner = NonNull::from(&mut *type_record);
            let arena = Arena::spawn(owner)?;
            type_record.arena_head.insert_at_head(Arena::chain_node(arena));
            Arena::first_block(arena)
        }
    };

    Ok(split_for_allocation(type_record, chosen, bytes))
}

/// Splits `block` for a `bytes`-sized allocation (§4.3.2). The four
/// remainder cases collapse to two code paths: the operative predicate is
/// `remainder < sizeof(BlockHeader)`, not the soft/hard/clean label.
unsafe fn split_for_allocation(
    type_record: &mut TypeRecord,
    block: NonNull<BlockHeader>,
    bytes: usize,
) -> NonNull<BlockHeader> {
    let header_size = mem::size_of::<BlockHeader>();

    (*block.as_ptr()).state = BlockState::Allocated;
    let original_size = (*block.as_ptr()).data_size;
    let remainder = original_size - bytes;

    if remainder < header_size {
        // Exact fit or hard internal fragmentation: no header can be
        // carved out of the remainder, so data_size is left as-is.
    } else {
        let offset = (*block.as_ptr()).offset;
        let next_block = (*block.as_ptr()).next_block;

        let new_ptr = (block.as_ptr() as *mut u8).add(header_size + bytes) as *mut BlockHeader;
        let new_data_size = remainder - header_size;
        let new_offset = offset + header_size + bytes;
        ptr::write(new_ptr, BlockHeader::new_free(new_data_size, new_offset));
        let new_block = NonNull::new_unchecked(new_ptr);

        (*new_ptr).prev_block = Some(block);
        (*new_ptr).next_block = next_block;
        if let Some(next) = next_block {
            (*next.as_ptr()).prev_block = Some(new_block);
        }
        (*block.as_ptr()).next_block = Some(new_block);
        (*block.as_ptr()).data_size = bytes;

        type_record.free_index.insert(new_block);
    }

    block
}

/// Frees `block`: flips it to `FREE`, coalesces with any free physical
/// neighbor, and tears the arena down if the merge consumed the whole
/// payload (§4.3.3).
///
/// # Safety
/// `block` must have been produced by a prior `alloc_for` call against
/// `type_record` and not already freed (double-free is undefined
/// behavior, per the specification's error taxonomy).
pub unsafe fn free_block(
    type_record: &mut TypeRecord,
    block: NonNull<BlockHeader>,
) -> Result<(), PageError> {
    BlockHeader::check_magic(block);

    (*block.as_ptr()).state = BlockState::Free;
    type_record.free_index.insert(block);

    let mut survivor = block;

    if let Some(next) = (*survivor.as_ptr()).next_block {
        if (*next.as_ptr()).state == BlockState::Free {
            type_record.free_index.remove(survivor);
            type_record.free_index.remove(next);
            absorb_right(survivor, next);
            type_record.free_index.insert(survivor);
        }
    }

    if let Some(prev) = (*survivor.as_ptr()).prev_block {
        if (*prev.as_ptr()).state == BlockState::Free {
            type_record.free_index.remove(survivor);
            type_record.free_index.remove(prev);
            absorb_right(prev, survivor);
            survivor = prev;
            type_record.free_index.insert(survivor);
        }
    }

    if Arena::is_sole_and_empty(survivor) {
        type_record.free_index.remove(survivor);
        let arena = Arena::from_block(survivor);
        type_record.arena_head.remove(Arena::chain_node(arena));
        Arena::teardown(arena)?;
    }

    Ok(())
}

/// Absorbs `second` into `first`; `second` ceases to exist as a block.
/// `first` and `second` must be adjacent, both `FREE`.
///
/// The `second.next_block.prev_block` fixup is applied whenever a
/// successor exists -- the original source gated this on the reverse
/// condition, which left a dangling `prev_block` after a right-merge.
unsafe fn absorb_right(first: NonNull<BlockHeader>, second: NonNull<BlockHeader>) {
    let header_size = mem::size_of::<BlockHeader>();
    let second_data_size = (*second.as_ptr()).data_size;
    let second_next = (*second.as_ptr()).next_block;

    (*first.as_ptr()).data_size += header_size + second_data_size;
    (*first.as_ptr()).next_block = second_next;
    if let Some(next) = second_next {
        (*next.as_ptr()).prev_block = Some(first);
    }
}
