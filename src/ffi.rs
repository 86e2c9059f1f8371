//! C ABI exports.
//!
//! Gated behind `features = ["ffi"]`. Always exports the prefixed
//! `brkalloc_*` family. With `malloc-override`, also exports unmangled
//! `malloc`, `free`, `calloc` and `realloc`, so a cdylib or staticlib built on
//! top of this crate can be preloaded in front of the platform allocator.
//!
//! Every failure is reported as a null return; nothing here panics.

use core::ffi::c_void;
use core::ptr::{self, NonNull};

use crate::allocator::HEAP;

/// `malloc(3)`: `size` bytes, 16-byte aligned, or null (also for `size == 0`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn brkalloc_malloc(size: usize) -> *mut c_void {
    HEAP.allocate(size)
        .map_or(ptr::null_mut(), |p| p.as_ptr().cast())
}

/// `free(3)`: null is a no-op.
///
/// # Safety
/// `ptr` must be null or a live pointer from this family of functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn brkalloc_free(ptr: *mut c_void) {
    unsafe { HEAP.release(ptr.cast()) }
}

/// `calloc(3)`: null if either argument is zero or their product overflows.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn brkalloc_calloc(count: usize, size: usize) -> *mut c_void {
    HEAP.allocate_zeroed(count, size)
        .map_or(ptr::null_mut(), |p| p.as_ptr().cast())
}

/// `realloc(3)`: null `ptr` allocates. On failure (including `size == 0`)
/// returns null and leaves `ptr` untouched and still owned by the caller.
///
/// # Safety
/// `ptr` must be null or a live pointer from this family of functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn brkalloc_realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    unsafe { HEAP.resize(ptr.cast(), size) }
        .map_or(ptr::null_mut(), |p: NonNull<u8>| p.as_ptr().cast())
}

#[cfg(feature = "malloc-override")]
mod malloc_override {
    use core::ffi::c_void;

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
        unsafe { super::brkalloc_malloc(size) }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn free(ptr: *mut c_void) {
        unsafe { super::brkalloc_free(ptr) }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn calloc(count: usize, size: usize) -> *mut c_void {
        unsafe { super::brkalloc_calloc(count, size) }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
        unsafe { super::brkalloc_realloc(ptr, size) }
    }
}
