//! Property-based checks of the structural invariants blocks and
//! free-indexes must hold after any sequence of allocations and frees.
//!
//! These drive `recordpool::registry::Registry` and `recordpool::block`
//! directly rather than the process-wide API, so each proptest case gets
//! its own independent registry and arenas -- no shared mutable state to
//! serialize across cases beyond the once-per-process page size.

mod common;

use std::collections::HashSet;

use core::ptr::NonNull;
use proptest::prelude::*;

use recordpool::arena::Arena;
use recordpool::block::{self, BlockHeader, BlockState};
use recordpool::registry::{Registry, TypeRecord};

const RECORD_SIZE: usize = 40;

#[derive(Debug, Clone, Copy)]
enum Action {
    Alloc,
    FreeOldest,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![3 => Just(Action::Alloc), 1 => Just(Action::FreeOldest)]
}

unsafe fn blocks_in_arena(type_record: &TypeRecord) -> Vec<NonNull<BlockHeader>> {
    let mut blocks = Vec::new();
    for arena_node in type_record.arena_head.iter() {
        let arena = Arena::from_chain(arena_node);
        let mut cursor = Some(Arena::first_block(arena));
        while let Some(block) = cursor {
            blocks.push(block);
            cursor = block.as_ref().next_block;
        }
    }
    blocks
}

unsafe fn assert_invariants(type_record: &TypeRecord) {
    for arena_node in type_record.arena_head.iter() {
        let arena = Arena::from_chain(arena_node);
        let base = arena.as_ptr() as *const u8;
        let mut cursor = Some(Arena::first_block(arena));
        let mut covered = 0usize;
        let mut prev_was_free = false;

        while let Some(block) = cursor {
            let header = block.as_ref();
            covered += core::mem::size_of::<BlockHeader>() + header.data_size;

            let actual_offset = (block.as_ptr() as *const u8).offset_from(base) as usize;
            assert_eq!(header.offset, actual_offset, "offset must match distance to arena base");

            let is_free = header.state == BlockState::Free;
            assert!(!(is_free && prev_was_free), "two adjacent FREE blocks survived coalescing");
            prev_was_free = is_free;

            cursor = header.next_block;
        }

        assert_eq!(covered, Arena::payload_capacity(), "blocks must cover the whole payload with no gaps");
    }

    let mut index_blocks = Vec::new();
    let mut prev_size: Option<usize> = None;
    for block in type_record.free_index.iter() {
        let header = block.as_ref();
        assert_eq!(header.state, BlockState::Free, "free_index must only contain FREE blocks");
        if let Some(prev) = prev_size {
            assert!(prev >= header.data_size, "free_index must be non-increasing in data_size");
        }
        prev_size = Some(header.data_size);
        index_blocks.push(block.as_ptr());
    }

    let free_in_chain: Vec<_> = blocks_in_arena(type_record)
        .into_iter()
        .filter(|b| b.as_ref().state == BlockState::Free)
        .map(|b| b.as_ptr())
        .collect();

    let index_set: HashSet<_> = index_blocks.into_iter().collect();
    let chain_set: HashSet<_> = free_in_chain.into_iter().collect();
    assert_eq!(index_set, chain_set, "free_index must hold exactly the FREE blocks in the arena chain");
}

proptest! {
    #[test]
    fn alloc_free_sequences_preserve_invariants(actions in prop::collection::vec(action_strategy(), 1..40)) {
        common::ensure_init();

        let mut registry = Registry::new();
        let mut type_ptr = registry.register("PropRecord", RECORD_SIZE).unwrap();
        let type_record = unsafe { type_ptr.as_mut() };

        let mut live: Vec<NonNull<BlockHeader>> = Vec::new();

        for action in actions {
            match action {
                Action::Alloc => {
                    if let Ok(new_block) = unsafe { block::alloc_for(type_record, RECORD_SIZE) } {
                        live.push(new_block);
                    }
                }
                Action::FreeOldest => {
                    if !live.is_empty() {
                        let freed = live.remove(0);
                        unsafe { block::free_block(type_record, freed) }.unwrap();
                    }
                }
            }
            unsafe { assert_invariants(type_record) };
        }

        for leftover in live {
            unsafe { block::free_block(type_record, leftover) }.unwrap();
        }
        prop_assert!(type_record.arena_head.is_empty());
    }
}
