//! The allocator core: allocate, release, zero-allocate and resize over a
//! [`Ledger`] and a [`HeapSource`].
//!
//! `Heap` does no locking of its own; [`BrkAlloc`](crate::BrkAlloc) wraps it in
//! the process-wide mutex. Keeping the state in a plain object lets tests run
//! many independent heaps side by side.
//!
//! Policy, in short:
//! - allocate: first-fit over the ledger; on a miss, extend the break by one
//!   header plus the request and append the new block.
//! - release: if the block ends exactly at the break, unlink it and shrink the
//!   break; otherwise just mark it free. Neighbours are never merged.
//! - resize: keep the block if its recorded size already suffices; otherwise
//!   allocate, copy the recorded size, release the old block.

use core::fmt;
use core::ptr::{self, NonNull};

use crate::error::{AllocError, Result};
use crate::header::{HEADER_ALIGN, HEADER_SIZE, Header, header_of, payload_of};
use crate::ledger::{Blocks, Ledger};
use crate::macros::{stat_add, stat_inc};
use crate::platform::HeapSource;

/// Times `grow` re-measures the break when a foreign `sbrk` moved it between
/// the query and the extension.
const GROW_ATTEMPTS: usize = 4;

/// A block issued by a [`Heap`].
///
/// Not `Copy`: [`Heap::release`] consumes it, so a handle can't be released
/// twice. Handles carry no reference to their heap; passing one to a
/// different heap is a logic error the type system doesn't catch.
pub struct Allocation {
    ptr: NonNull<u8>,
}

// SAFETY: the handle is just an owned address; the heap lock serializes the
// bookkeeping behind it.
unsafe impl Send for Allocation {}

impl Allocation {
    #[inline]
    fn new(ptr: NonNull<u8>) -> Self {
        Self { ptr }
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Gives up the handle, returning the payload pointer.
    #[inline]
    pub fn into_raw(self) -> NonNull<u8> {
        self.ptr
    }

    /// Re-wraps a pointer obtained from [`Allocation::into_raw`].
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` on a handle of the heap it will be
    /// used with, and must not have been released since.
    #[inline]
    pub unsafe fn from_raw(ptr: NonNull<u8>) -> Self {
        Self { ptr }
    }
}

impl fmt::Debug for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Allocation").field(&self.ptr).finish()
    }
}

/// Validates a zero-allocate request and returns its byte size.
pub(crate) fn zeroed_size(count: usize, size: usize) -> Result<usize> {
    stat_inc!(zeroed_count);
    if count == 0 || size == 0 {
        stat_inc!(no_allocation);
        return Err(AllocError::ZeroSize);
    }
    count.checked_mul(size).ok_or_else(|| {
        stat_inc!(no_allocation);
        AllocError::Overflow
    })
}

fn out_of_memory<T>() -> Result<T> {
    stat_inc!(out_of_memory);
    Err(AllocError::OutOfMemory)
}

/// An unlocked heap: the block ledger plus the source it grows from.
///
/// Dropping a `Heap` returns nothing to the source; blocks stay carved.
pub struct Heap<S> {
    ledger: Ledger,
    source: S,
}

impl<S: HeapSource> Heap<S> {
    pub const fn new(source: S) -> Self {
        Self {
            ledger: Ledger::new(),
            source,
        }
    }

    /// Allocates `size` bytes aligned to [`HEADER_ALIGN`].
    pub fn allocate(&mut self, size: usize) -> Result<Allocation> {
        self.allocate_aligned(size, HEADER_ALIGN)
    }

    /// Allocates `size` bytes whose address is a multiple of `align`.
    ///
    /// Alignments up to [`HEADER_ALIGN`] cost nothing. Larger ones only
    /// reuse free blocks that happen to be aligned, and may leave padding in
    /// front of a new header.
    pub fn allocate_aligned(&mut self, size: usize, align: usize) -> Result<Allocation> {
        if size == 0 {
            stat_inc!(no_allocation);
            return Err(AllocError::ZeroSize);
        }
        if !align.is_power_of_two() {
            stat_inc!(no_allocation);
            return Err(AllocError::BadAlignment);
        }
        let align = align.max(HEADER_ALIGN);

        stat_inc!(alloc_count);
        stat_add!(alloc_bytes, size);

        if let Some(header) = self.ledger.find_free(size, align) {
            // The recorded size stays as-is: the caller may get more than it asked for.
            unsafe { (*header.as_ptr()).is_free = false };
            stat_inc!(reuse_hits);
            return Ok(Allocation::new(payload_of(header)));
        }

        let header = self.grow(size, align)?;
        Ok(Allocation::new(payload_of(header)))
    }

    /// Extends the break by one block and appends it to the ledger.
    /// On failure the ledger is untouched.
    fn grow(&mut self, size: usize, align: usize) -> Result<NonNull<Header>> {
        for _ in 0..GROW_ATTEMPTS {
            let end = self.source.current_break();
            let pad = end.wrapping_add(HEADER_SIZE).wrapping_neg() & (align - 1);
            let Some(total) = pad
                .checked_add(HEADER_SIZE)
                .and_then(|n| n.checked_add(size))
                .filter(|&n| n <= isize::MAX as usize)
            else {
                return out_of_memory();
            };

            let Some(prev) = (unsafe { self.source.sbrk(total as isize) }) else {
                return out_of_memory();
            };
            if prev.as_ptr() as usize != end {
                unsafe { self.give_back(prev, total) };
                continue;
            }

            stat_inc!(heap_grows);
            stat_add!(heap_grow_bytes, total);

            let header = unsafe { Header::init(prev.add(pad), size, pad) };
            unsafe { self.ledger.push(header) };
            return Ok(header);
        }
        out_of_memory()
    }

    /// Undoes an extension of `total` bytes at `start`, if it is still on top.
    unsafe fn give_back(&mut self, start: NonNull<u8>, total: usize) {
        let end = start.as_ptr() as usize + total;
        if self.source.current_break() == end {
            unsafe { self.shrink(end, total) };
        }
    }

    /// Moves the break from `end` down by `len` bytes.
    ///
    /// Returns false if the break was no longer at `end` when the shrink
    /// landed; the shrink is then reverted so memory above `end` stays with
    /// whoever grew it.
    unsafe fn shrink(&mut self, end: usize, len: usize) -> bool {
        match unsafe { self.source.sbrk(-(len as isize)) } {
            Some(prev) if prev.as_ptr() as usize == end => true,
            Some(_) => {
                unsafe { self.source.sbrk(len as isize) };
                false
            }
            None => false,
        }
    }

    /// Allocates `count * size` zeroed bytes.
    ///
    /// Fails with [`AllocError::ZeroSize`] if either factor is zero and with
    /// [`AllocError::Overflow`] if the product doesn't fit in `usize`.
    pub fn allocate_zeroed(&mut self, count: usize, size: usize) -> Result<Allocation> {
        let total = zeroed_size(count, size)?;
        let block = self.allocate(total)?;
        unsafe { ptr::write_bytes(block.as_ptr(), 0, total) };
        Ok(block)
    }

    /// Returns a block to the heap.
    pub fn release(&mut self, block: Allocation) {
        unsafe { self.release_block(block.into_raw()) }
    }

    /// Returns a block by raw pointer. Null is a no-op.
    ///
    /// # Safety
    /// `ptr` must be null or a live payload pointer issued by this heap.
    /// Nothing is validated (beyond the canary, with the `canary` feature).
    pub unsafe fn release_raw(&mut self, ptr: *mut u8) {
        if let Some(ptr) = NonNull::new(ptr) {
            unsafe { self.release_block(ptr) }
        }
    }

    unsafe fn release_block(&mut self, ptr: NonNull<u8>) {
        let header = unsafe { header_of(ptr) };
        let (end, footprint) = {
            let h = unsafe { header.as_ref() };
            if !h.is_intact() {
                stat_inc!(foreign_releases);
                return;
            }
            ((ptr.as_ptr() as usize).wrapping_add(h.size), h.footprint())
        };

        if end == self.source.current_break() && self.ledger.tail() == Some(header) {
            // A reverted shrink may hand back fresh pages, so keep a copy.
            let saved = unsafe { header.as_ptr().read() };
            if unsafe { self.shrink(end, footprint) } {
                // Last thing on the heap: its bytes are gone, now drop the link.
                self.ledger.pop_tail();
                stat_inc!(heap_shrinks);
                stat_add!(heap_shrink_bytes, footprint);
                return;
            }
            unsafe { header.as_ptr().write(saved) };
        }

        unsafe { (*header.as_ptr()).is_free = true };
        stat_inc!(interior_releases);
    }

    /// Resizes `block` in place or by moving it.
    ///
    /// On success `block` points at memory of at least `new_size` bytes. On
    /// failure it is left exactly as it was and still owned by the caller.
    /// A `new_size` of 0 fails with [`AllocError::ZeroSize`]; it does not
    /// release the block.
    pub fn resize(&mut self, block: &mut Allocation, new_size: usize) -> Result<()> {
        block.ptr = unsafe { self.resize_block(block.ptr, new_size, HEADER_ALIGN) }?;
        Ok(())
    }

    /// Raw-pointer resize. Null behaves like [`Heap::allocate`].
    ///
    /// # Safety
    /// Same contract as [`Heap::release_raw`]. On success the old pointer
    /// may be invalid; on failure it is untouched.
    pub unsafe fn resize_raw(&mut self, ptr: *mut u8, new_size: usize) -> Result<NonNull<u8>> {
        unsafe { self.resize_raw_aligned(ptr, new_size, HEADER_ALIGN) }
    }

    /// [`Heap::resize_raw`] for blocks allocated with [`Heap::allocate_aligned`].
    ///
    /// # Safety
    /// Same contract as [`Heap::release_raw`].
    pub unsafe fn resize_raw_aligned(
        &mut self,
        ptr: *mut u8,
        new_size: usize,
        align: usize,
    ) -> Result<NonNull<u8>> {
        match NonNull::new(ptr) {
            None => self.allocate_aligned(new_size, align).map(Allocation::into_raw),
            Some(ptr) => unsafe { self.resize_block(ptr, new_size, align) },
        }
    }

    unsafe fn resize_block(
        &mut self,
        ptr: NonNull<u8>,
        new_size: usize,
        align: usize,
    ) -> Result<NonNull<u8>> {
        if new_size == 0 {
            return self.allocate_aligned(0, align).map(Allocation::into_raw);
        }

        let header = unsafe { header_of(ptr) };
        let old_size = {
            let h = unsafe { header.as_ref() };
            if !h.is_intact() {
                return Err(AllocError::ForeignPointer);
            }
            h.size
        };

        stat_inc!(resize_count);
        if old_size >= new_size {
            stat_inc!(resize_in_place);
            return Ok(ptr);
        }

        let fresh = self.allocate_aligned(new_size, align)?.into_raw();
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), fresh.as_ptr(), old_size);
            self.release_block(ptr);
        }
        stat_inc!(resize_moves);
        Ok(fresh)
    }

    /// Payload size recorded in `block`'s header. May exceed what was last
    /// asked for, since reuse and resize never shrink it.
    pub fn capacity_of(&self, block: &Allocation) -> usize {
        unsafe { header_of(block.ptr).as_ref().size }
    }

    /// Every block on the ledger, lowest address first.
    pub fn blocks(&self) -> Blocks<'_> {
        self.ledger.iter()
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// The current break of the underlying source.
    pub fn heap_end(&mut self) -> usize {
        self.source.current_break()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
