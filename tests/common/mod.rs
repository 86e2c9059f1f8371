//! Shared helpers for integration tests.

#![allow(dead_code)]

use brkalloc::{BrkAlloc, HEADER_ALIGN, Heap, Region};
use std::alloc::Layout;

/// A region of `capacity` bytes, leaked from the test binary's allocator.
pub fn region(capacity: usize) -> Region {
    let layout = Layout::from_size_align(capacity, HEADER_ALIGN).unwrap();
    let base = unsafe { std::alloc::alloc_zeroed(layout) };
    assert!(!base.is_null(), "could not reserve {capacity} bytes for a test region");
    unsafe { Region::new(base, capacity) }
}

pub fn heap(capacity: usize) -> Heap<Region> {
    Heap::new(region(capacity))
}

pub fn shared(capacity: usize) -> BrkAlloc<Region> {
    BrkAlloc::new(region(capacity))
}

/// Fill a buffer with a deterministic pattern derived from `seed`.
pub fn fill_fixed(ptr: *mut u8, size: usize, seed: usize) {
    for i in 0..size {
        unsafe {
            *ptr.add(i) = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        }
    }
}

/// Verify the pattern written by [`fill_fixed`].
pub fn check_fixed(ptr: *const u8, size: usize, seed: usize) -> bool {
    (0..size).all(|i| {
        let expected = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        unsafe { *ptr.add(i) == expected }
    })
}

/// Fill with a pattern derived from the buffer's own address and size.
pub fn fill_pattern(ptr: *mut u8, size: usize) {
    fill_fixed(ptr, size, ptr as usize ^ size);
}

pub fn check_pattern(ptr: *const u8, size: usize) -> bool {
    check_fixed(ptr, size, ptr as usize ^ size)
}
