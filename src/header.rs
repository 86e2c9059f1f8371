//! Block header layout and the payload/header address relationship.
//!
//! Every block on the heap is laid out as
//!
//! ```text
//!   prev break
//!   │
//!   ▼
//!   ┌─────────┬──────────────────┬────────────────────────────┐
//!   │ padding │   Header (32 B)  │   payload (`size` bytes)   │
//!   └─────────┴──────────────────┴────────────────────────────┘
//!                                ▲
//!                                └── pointer handed to the caller
//! ```
//!
//! `padding` is zero whenever the break was already suitably aligned.
//! [`header_of`] and [`payload_of`] are the only places that do arithmetic
//! between the two addresses.

use core::mem;
use core::ptr::{self, NonNull};

#[cfg(feature = "canary")]
use crate::config::HEADER_CANARY;

/// Alignment of every header, and therefore of every payload.
pub const HEADER_ALIGN: usize = 16;

/// Metadata prepended to each block.
#[repr(C, align(16))]
pub struct Header {
    /// Payload size requested when the block was created. Never shrunk on reuse.
    pub size: usize,
    /// Bytes between the break before this block was carved and the header.
    pub pad: usize,
    /// True if the finder may hand this block out again.
    pub is_free: bool,
    #[cfg(feature = "canary")]
    canary: u32,
    /// Next header in address order, null for the tail.
    pub next: *mut Header,
}

/// Bytes between a header's address and its payload.
pub const HEADER_SIZE: usize = mem::size_of::<Header>();

const _: () = assert!(HEADER_SIZE % HEADER_ALIGN == 0);

impl Header {
    /// Writes a fresh in-use header at `at`.
    ///
    /// # Safety
    /// `at` must be `HEADER_ALIGN`-aligned and valid for writes of
    /// `HEADER_SIZE + size` bytes.
    pub unsafe fn init(at: NonNull<u8>, size: usize, pad: usize) -> NonNull<Header> {
        let header = at.cast::<Header>();
        unsafe {
            header.as_ptr().write(Header {
                size,
                pad,
                is_free: false,
                #[cfg(feature = "canary")]
                canary: HEADER_CANARY,
                next: ptr::null_mut(),
            })
        };
        header
    }

    /// Whether this header looks like one written by [`Header::init`].
    ///
    /// Always true without the `canary` feature.
    #[inline]
    pub fn is_intact(&self) -> bool {
        #[cfg(feature = "canary")]
        {
            self.canary == HEADER_CANARY
        }
        #[cfg(not(feature = "canary"))]
        {
            true
        }
    }

    /// Total bytes this block took from the heap source.
    #[inline]
    pub fn footprint(&self) -> usize {
        self.pad + HEADER_SIZE + self.size
    }
}

/// Recovers the header in front of a payload pointer.
///
/// # Safety
/// `payload` must have been produced by [`payload_of`] on a header that is
/// still part of a live heap.
#[inline]
pub unsafe fn header_of(payload: NonNull<u8>) -> NonNull<Header> {
    unsafe { payload.sub(HEADER_SIZE).cast() }
}

/// Address of the payload that follows `header`.
#[inline]
pub fn payload_of(header: NonNull<Header>) -> NonNull<u8> {
    // SAFETY: a header is always followed by its payload inside the same
    // heap region, so the sum neither wraps nor leaves the allocation.
    unsafe { header.cast::<u8>().add(HEADER_SIZE) }
}
