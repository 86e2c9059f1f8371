//! The heap ledger: a singly linked chain of every block carved from the heap.
//!
//! Headers live in-band on the heap, so the chain owns nothing itself; `head`
//! and `tail` only point into it. Blocks are appended at the current break,
//! which keeps the chain in ascending address order.
//!
//! Invariants:
//! - `head` is null iff `tail` is null.
//! - `tail` is reached from `head` by following `next` exactly `len - 1` times.
//! - every header on the chain is live memory owned by the heap source.

use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::header::{Header, payload_of};

/// Head/tail anchors of the block chain.
pub struct Ledger {
    head: *mut Header,
    tail: *mut Header,
}

// SAFETY: the chain is only reached through `&mut Ledger` (or `&Ledger` for
// reads), so moving the anchors between threads moves exclusive access too.
unsafe impl Send for Ledger {}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    #[inline]
    pub fn head(&self) -> Option<NonNull<Header>> {
        NonNull::new(self.head)
    }

    #[inline]
    pub fn tail(&self) -> Option<NonNull<Header>> {
        NonNull::new(self.tail)
    }

    /// Number of blocks on the chain. O(n).
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// First-fit search: the first free block, in address order, whose
    /// payload holds at least `size` bytes and starts on an `align` boundary.
    pub fn find_free(&self, size: usize, align: usize) -> Option<NonNull<Header>> {
        let mut curr = self.head;
        while let Some(header) = NonNull::new(curr) {
            let h = unsafe { header.as_ref() };
            if h.is_free && h.size >= size && (payload_of(header).as_ptr() as usize) & (align - 1) == 0
            {
                return Some(header);
            }
            curr = h.next;
        }
        None
    }

    /// Appends `header` as the new tail.
    ///
    /// # Safety
    /// `header` must point to an initialized header that sits above every
    /// block already on the chain and stays valid until it is popped.
    pub unsafe fn push(&mut self, header: NonNull<Header>) {
        let header = header.as_ptr();
        if self.head.is_null() {
            self.head = header;
        } else {
            unsafe { (*self.tail).next = header };
        }
        self.tail = header;
    }

    /// Unlinks and returns the tail.
    ///
    /// The predecessor is found by walking from `head`, so this is O(n).
    pub fn pop_tail(&mut self) -> Option<NonNull<Header>> {
        let tail = NonNull::new(self.tail)?;

        if self.head == self.tail {
            self.head = ptr::null_mut();
            self.tail = ptr::null_mut();
            return Some(tail);
        }

        let mut curr = self.head;
        while !curr.is_null() {
            let next = unsafe { (*curr).next };
            if next == self.tail {
                unsafe { (*curr).next = ptr::null_mut() };
                self.tail = curr;
                break;
            }
            curr = next;
        }
        Some(tail)
    }

    /// Iterates the chain from head to tail.
    pub fn iter(&self) -> Blocks<'_> {
        Blocks {
            curr: self.head,
            _ledger: PhantomData,
        }
    }
}

/// A read-only view of one block on the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// The payload address, as handed to callers.
    pub addr: NonNull<u8>,
    /// Payload size recorded when the block was created.
    pub size: usize,
    pub is_free: bool,
}

/// Iterator over the ledger, oldest (lowest address) block first.
pub struct Blocks<'a> {
    curr: *mut Header,
    _ledger: PhantomData<&'a Ledger>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let header = NonNull::new(self.curr)?;
        let h = unsafe { header.as_ref() };
        self.curr = h.next;
        Some(BlockInfo {
            addr: payload_of(header),
            size: h.size,
            is_free: h.is_free,
        })
    }
}
