//! # `recordpool` - a structure-aware page allocator
//!
//! A userspace memory manager that services fixed-size-record allocation
//! requests directly on top of anonymous OS pages, bypassing the general
//! purpose heap entirely. Clients first [`register`] each record type
//! they intend to allocate -- a name plus a byte size -- then request `N`
//! zero-initialized instances with [`alloc`]. The allocator carves
//! instances out of page-sized arenas it owns, splits and coalesces free
//! regions, and releases whole pages back to the kernel once they become
//! fully empty.
//!
//! ## Example
//!
//! ```rust
//! use recordpool::{init, register, alloc, free};
//!
//! init();
//! register("Employee", 36).unwrap();
//!
//! let ptr = alloc("Employee", 1).expect("allocation failed");
//! free(ptr);
//! ```
//!
//! ## Scope
//!
//! This crate does not provide thread safety, `realloc`, user-specified
//! alignment, cross-type pooling, or allocations spanning more than one
//! arena's payload. See the module docs on [`api`] for the full
//! concurrency contract.

#![warn(missing_docs, clippy::all)]
#![allow(clippy::missing_safety_doc)]

pub mod api;
pub mod arena;
pub mod block;
pub mod error;
pub mod free_index;
pub mod list;
pub mod page_size;
pub mod registry;
pub mod syscall;

pub use api::{alloc, free, init, print_block_usage, print_memory_usage, print_registered_types, register};
pub use error::{PageError, RegisterError};

const _: () = {
    use core::mem;

    // A block header carries one `BlockState`, two size/offset fields,
    // two optional neighbor pointers and an intrusive link -- it must
    // stay small; a regression here silently inflates arena overhead.
    // Loose bound (platform padding varies), not a tight layout guarantee.
    assert!(mem::size_of::<block::BlockHeader>() <= mem::size_of::<usize>() * 10);
};
