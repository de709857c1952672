//! The type registry (component E): a page-backed, dense-prefix catalog
//! of registered record types.
//!
//! Grounded on `mm_register_struct_record` / `_mm_lookup_struct_record_by_name`
//! (`examples/original_source/src/mem_mang/src/mm.c`) and the struct-hack
//! VLA layout of `vm_page_for_struct_records_t`
//! (`examples/original_source/src/mem_mang/inc/mm.h`). The VLA becomes a
//! runtime-computed capacity `K` here because the page size itself is only
//! known at `init` time, not at compile time.

use core::mem;
use core::ptr::{self, NonNull};

use crate::arena::Arena;
use crate::block::BlockHeader;
use crate::error::{PageError, RegisterError};
use crate::free_index::FreeIndex;
use crate::list::List;
use crate::page_size;
use crate::syscall;

pub const MAX_NAME_LEN: usize = 32;

/// One registered record type: its catalog entry, arena chain, and
/// free-block index. Zero-initialized bytes are a valid, empty-slot
/// `TypeRecord` -- `size == 0` is exactly the "unoccupied" predicate.
#[repr(C)]
pub struct TypeRecord {
    pub name: [u8; MAX_NAME_LEN],
    pub size: usize,
    pub arena_head: List,
    pub free_index: FreeIndex,
}

impl TypeRecord {
    pub fn name_str(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("<invalid-utf8>")
    }

    pub fn is_occupied(&self) -> bool {
        self.size != 0
    }
}

fn pad_name(name: &str) -> [u8; MAX_NAME_LEN] {
    let mut buf = [0u8; MAX_NAME_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(MAX_NAME_LEN);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

/// One OS page of [`TypeRecord`] slots, chained to other such pages.
/// `records_offset` is the byte distance past the `next` pointer where
/// the dense-prefix record array begins.
#[repr(C)]
pub struct TypeRecordPage {
    pub next: Option<NonNull<TypeRecordPage>>,
}

impl TypeRecordPage {
    fn records_offset() -> usize {
        mem::size_of::<Option<NonNull<TypeRecordPage>>>()
    }

    /// `K`: how many `TypeRecord` slots fit after the page's `next` field.
    pub fn capacity() -> usize {
        (page_size::get() - Self::records_offset()) / mem::size_of::<TypeRecord>()
    }

    unsafe fn record_ptr(page: NonNull<TypeRecordPage>, index: usize) -> *mut TypeRecord {
        (page.as_ptr() as *mut u8)
            .add(Self::records_offset())
            .add(index * mem::size_of::<TypeRecord>()) as *mut TypeRecord
    }

    /// Scans the dense prefix for the first unoccupied slot.
    unsafe fn find_free_slot(page: NonNull<TypeRecordPage>) -> Option<usize> {
        (0..Self::capacity()).find(|&idx| !(*Self::record_ptr(page, idx)).is_occupied())
    }

    /// Scans the dense prefix for `name`, stopping at the first empty slot.
    unsafe fn find_named(page: NonNull<TypeRecordPage>, name: &[u8; MAX_NAME_LEN]) -> Option<NonNull<TypeRecord>> {
        for idx in 0..Self::capacity() {
            let record_ptr = Self::record_ptr(page, idx);
            if !(*record_ptr).is_occupied() {
                break;
            }
            if &(*record_ptr).name == name {
                return NonNull::new(record_ptr);
            }
        }
        None
    }

    unsafe fn write_record(
        page: NonNull<TypeRecordPage>,
        idx: usize,
        name: [u8; MAX_NAME_LEN],
        size: usize,
    ) -> NonNull<TypeRecord> {
        let ptr = Self::record_ptr(page, idx);
        ptr::write(
            ptr,
            TypeRecord {
                name,
                size,
                arena_head: List::new(),
                free_index: FreeIndex::new(),
            },
        );
        NonNull::new_unchecked(ptr)
    }

    fn spawn(next: Option<NonNull<TypeRecordPage>>) -> Result<NonNull<TypeRecordPage>, PageError> {
        let page_size = page_size::get();
        let base = syscall::map_pages(1, page_size)?;
        let page_ptr = base.as_ptr() as *mut TypeRecordPage;
        unsafe { ptr::write(page_ptr, TypeRecordPage { next }) };
        Ok(unsafe { NonNull::new_unchecked(page_ptr) })
    }
}

/// The process-wide catalog of registered types: a singly-linked chain
/// of [`TypeRecordPage`]s, newest first.
#[derive(Default)]
pub struct Registry {
    head: Option<NonNull<TypeRecordPage>>,
}

impl Registry {
    pub const fn new() -> Self {
        Registry { head: None }
    }

    /// Maximum single-record size a type can be registered with: a whole
    /// arena's payload, minus room for the arena's own embedded block
    /// header.
    pub fn max_record_size() -> usize {
        Arena::payload_capacity() - mem::size_of::<BlockHeader>()
    }

    fn lookup_raw(&self, name: &[u8; MAX_NAME_LEN]) -> Option<NonNull<TypeRecord>> {
        let mut cursor = self.head;
        while let Some(page) = cursor {
            if let Some(found) = unsafe { TypeRecordPage::find_named(page, name) } {
                return Some(found);
            }
            cursor = unsafe { page.as_ref().next };
        }
        None
    }

    /// Registers a new type (§4.2).
    pub fn register(&mut self, name: &str, size: usize) -> Result<NonNull<TypeRecord>, RegisterError> {
        if size == 0 || size > Self::max_record_size() {
            return Err(RegisterError::SizeTooLarge);
        }

        let padded = pad_name(name);
        if self.lookup_raw(&padded).is_some() {
            return Err(RegisterError::DuplicateName);
        }

        let mut cursor = self.head;
        while let Some(page) = cursor {
            if let Some(idx) = unsafe { TypeRecordPage::find_free_slot(page) } {
                return Ok(unsafe { TypeRecordPage::write_record(page, idx, padded, size) });
            }
            cursor = unsafe { page.as_ref().next };
        }

        let new_page = TypeRecordPage::spawn(self.head).map_err(|_| RegisterError::OutOfMemory)?;
        self.head = Some(new_page);
        Ok(unsafe { TypeRecordPage::write_record(new_page, 0, padded, size) })
    }

    /// Looks up a registered type by exact name (§4.2).
    pub fn lookup(&self, name: &str) -> Option<NonNull<TypeRecord>> {
        self.lookup_raw(&pad_name(name))
    }

    /// Iterates every `TypeRecordPage`, head-first.
    pub fn pages(&self) -> PageIter {
        PageIter { next: self.head }
    }

    /// Iterates every occupied `TypeRecord` in registry order (page
    /// head-first, slot prefix-first) -- the ordering `print_registered_types`
    /// and friends must preserve (§6.4).
    pub fn records(&self) -> impl Iterator<Item = NonNull<TypeRecord>> + '_ {
        self.pages().flat_map(|page| {
            (0..TypeRecordPage::capacity()).map_while(move |idx| unsafe {
                let ptr = TypeRecordPage::record_ptr(page, idx);
                (*ptr).is_occupied().then(|| NonNull::new_unchecked(ptr))
            })
        })
    }
}

pub struct PageIter {
    next: Option<NonNull<TypeRecordPage>>,
}

impl Iterator for PageIter {
    type Item = NonNull<TypeRecordPage>;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = unsafe { cur.as_ref().next };
        Some(cur)
    }
}
