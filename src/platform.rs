//! The heap growth/shrink driver.
//!
//! A [`HeapSource`] is anything that behaves like `sbrk(2)`: one contiguous
//! region whose upper boundary (the "break") moves up to grow and down to
//! shrink. The allocator core never touches the OS directly.
//!
//! - unix: [`ProgramBreak`] drives the real process data segment via `libc::sbrk`.
//! - everywhere: [`Region`] simulates a break over a fixed byte range. It
//!   backs the global allocator under Miri and on non-unix targets, and makes
//!   heap-boundary assertions in tests deterministic.

use core::ptr::{self, NonNull};

cfg_if::cfg_if! {
    if #[cfg(all(unix, not(miri)))] {
        mod unix;
        pub use unix::ProgramBreak;

        /// Heap source used by the process-wide allocator.
        pub type DefaultSource = ProgramBreak;

        pub(crate) const fn default_source() -> DefaultSource {
            ProgramBreak::new()
        }
    } else {
        mod fallback;

        /// Heap source used by the process-wide allocator.
        pub type DefaultSource = Region;

        pub(crate) const fn default_source() -> DefaultSource {
            fallback::default_source()
        }
    }
}

/// A contiguous, break-style memory source.
pub trait HeapSource {
    /// Moves the break by `increment` bytes (negative shrinks) and returns
    /// the break as it was before the call. An increment of 0 only queries.
    ///
    /// Returns `None` if the source refuses, in which case the break is unchanged.
    ///
    /// # Safety
    /// Shrinking hands memory back: the caller must no longer use any byte
    /// above the new break.
    unsafe fn sbrk(&mut self, increment: isize) -> Option<NonNull<u8>>;

    /// Current break address, 0 if the source has no memory at all.
    fn current_break(&mut self) -> usize {
        // SAFETY: a zero increment never moves the break.
        unsafe { self.sbrk(0) }.map_or(0, |p| p.as_ptr() as usize)
    }
}

/// Statically allocated, header-aligned backing store for a [`Region`].
#[repr(C, align(16))]
pub struct Arena<const N: usize>([u8; N]);

impl<const N: usize> Arena<N> {
    pub const fn new() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> Default for Arena<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A simulated break over `len` bytes starting at `base`.
///
/// The break starts at `base` and may move anywhere in `base..=base + len`.
pub struct Region {
    base: *mut u8,
    len: usize,
    brk: usize,
}

// SAFETY: a `Region` has exclusive use of its byte range (see `Region::new`).
unsafe impl Send for Region {}

impl Region {
    /// A region with no memory; every growth request fails.
    pub const fn empty() -> Self {
        Self {
            base: ptr::null_mut(),
            len: 0,
            brk: 0,
        }
    }

    /// # Safety
    /// `base..base + len` must be valid for reads and writes, used by nothing
    /// else, and outlive the region and every pointer carved from it.
    pub const unsafe fn new(base: *mut u8, len: usize) -> Self {
        Self { base, len, brk: 0 }
    }

    /// Region over a leaked or `static` arena.
    pub fn from_arena<const N: usize>(arena: &'static mut Arena<N>) -> Self {
        // SAFETY: the arena is exclusively borrowed for 'static.
        unsafe { Self::new(arena.0.as_mut_ptr(), N) }
    }

    /// Lowest address of the region.
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    /// Bytes currently below the break.
    pub fn used(&self) -> usize {
        self.brk
    }

    /// Total bytes the break may grow to.
    pub fn capacity(&self) -> usize {
        self.len
    }
}

impl HeapSource for Region {
    unsafe fn sbrk(&mut self, increment: isize) -> Option<NonNull<u8>> {
        let prev = self.brk;
        let next = if increment >= 0 {
            prev.checked_add(increment as usize)?
        } else {
            prev.checked_sub(increment.unsigned_abs())?
        };
        if next > self.len {
            return None;
        }
        let prev_break = NonNull::new(self.base.wrapping_add(prev))?;
        self.brk = next;
        Some(prev_break)
    }
}
