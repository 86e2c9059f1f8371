//! The real program break, via `sbrk(2)`.
//!
//! `sbrk` is process-global: anything else calling it (the libc allocator,
//! for one) moves the same break. The allocator core copes with that by
//! only shrinking when the break sits exactly at the end of its own tail.

use core::ptr::NonNull;

use libc::{c_void, intptr_t, sbrk};

use super::HeapSource;

const SBRK_FAILED: *mut c_void = !0usize as *mut c_void;

/// The process data segment as a [`HeapSource`].
pub struct ProgramBreak {
    _private: (),
}

impl ProgramBreak {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for ProgramBreak {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapSource for ProgramBreak {
    unsafe fn sbrk(&mut self, increment: isize) -> Option<NonNull<u8>> {
        let prev = unsafe { sbrk(increment as intptr_t) };
        if prev == SBRK_FAILED {
            None
        } else {
            NonNull::new(prev.cast::<u8>())
        }
    }
}
