//! Per-type free-block priority index (component D).
//!
//! A thin wrapper over [`crate::list::List`] keyed on descending
//! `data_size`. Grounded on `_mm_add_free_data_block_meta_info` /
//! `_mm_free_block_comparison` / `_mm_get_largest_free_data_block`
//! (`examples/original_source/src/mem_mang/src/mm.c`), translated to the
//! generic `priority_insert` built in `list.rs`.

use core::ptr::NonNull;

use crate::block::BlockHeader;
use crate::list::{List, Node};

/// Largest-first priority list of `FREE` blocks belonging to one type.
#[derive(Debug, Default)]
pub struct FreeIndex {
    list: List,
}

impl FreeIndex {
    pub const fn new() -> Self {
        FreeIndex { list: List::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Inserts `block` keeping the list ordered by non-increasing
    /// `data_size`; a re-inserted block with a size tying an existing
    /// entry is placed after it, never before (stable re-insertion).
    ///
    /// # Safety
    /// `block` must be a live, currently-unindexed `BlockHeader`.
    pub unsafe fn insert(&mut self, block: NonNull<BlockHeader>) {
        let node = BlockHeader::glue_node(block);
        let offset = BlockHeader::glue_offset();
        self.list.priority_insert(node, offset, |new, cur| {
            let new_size = (*(new as *const BlockHeader)).data_size;
            let cur_size = (*(cur as *const BlockHeader)).data_size;
            cur_size.cmp(&new_size)
        });
    }

    /// Removes `block` from the index. O(1).
    ///
    /// # Safety
    /// `block` must currently be linked in this index.
    pub unsafe fn remove(&mut self, block: NonNull<BlockHeader>) {
        self.list.remove(BlockHeader::glue_node(block));
    }

    /// Returns the largest free block without removing it.
    pub fn peek_largest(&self) -> Option<NonNull<BlockHeader>> {
        self.list
            .head
            .map(|node: NonNull<Node>| unsafe { BlockHeader::from_glue(node) })
    }

    /// Iterates largest-to-smallest.
    pub fn iter(&self) -> impl Iterator<Item = NonNull<BlockHeader>> + '_ {
        self.list.iter().map(|node| unsafe { BlockHeader::from_glue(node) })
    }
}
