//! Error taxonomy for the allocator's public boundaries.
//!
//! Hand-rolled `Display`/`Error` impls, no `thiserror` — mirrors
//! `ryancinsight-halo`'s `AllocError` (`src/alloc/allocator.rs`).

use core::fmt;

/// Failure modes for [`crate::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// `size` is zero, or exceeds a single arena's payload capacity.
    SizeTooLarge,
    /// A type with this name is already registered.
    DuplicateName,
    /// The OS refused to hand over a fresh registry page.
    OutOfMemory,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::SizeTooLarge => write!(f, "record size exceeds a single arena's payload capacity"),
            RegisterError::DuplicateName => write!(f, "a type with this name is already registered"),
            RegisterError::OutOfMemory => write!(f, "failed to acquire a registry page from the operating system"),
        }
    }
}

impl std::error::Error for RegisterError {}

/// Failure modes for the page source (component A).
///
/// `Release` is fatal per the specification: once the allocator's
/// book-keeping assumes a page is gone, there is no defined recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// The OS refused to map a new page.
    Acquire,
    /// The OS refused to unmap a page the allocator believed it owned.
    Release,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::Acquire => write!(f, "failed to acquire a page from the operating system"),
            PageError::Release => write!(f, "failed to release a page back to the operating system"),
        }
    }
}

impl std::error::Error for PageError {}
