//! Locked allocator surface and the process-wide instance.
//!
//! [`BrkAlloc`] puts a [`Heap`] behind the single [`SpinMutex`]. Each public
//! operation holds the lock for its whole body, break extension and shrink
//! included, so operations are totally ordered by lock acquisition. Requests
//! that fail fast (zero size, overflow, null release) never take the lock.
//!
//! [`BrkMalloc`] is the zero-sized global allocator hook. Its state is the
//! module-level `HEAP` static, backed by the real program break on unix.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use crate::error::{AllocError, Result};
use crate::heap::{Allocation, Heap, zeroed_size};
use crate::macros::{heap_trace, stat_inc};
use crate::platform::{self, DefaultSource, HeapSource};
use crate::sync::SpinMutex;

pub(crate) static HEAP: BrkAlloc = BrkAlloc::new(platform::default_source());

/// A [`Heap`] shared between threads.
pub struct BrkAlloc<S = DefaultSource> {
    heap: SpinMutex<Heap<S>>,
}

impl<S: HeapSource> BrkAlloc<S> {
    pub const fn new(source: S) -> Self {
        Self {
            heap: SpinMutex::new(Heap::new(source)),
        }
    }

    /// Allocates `size` bytes. See [`Heap::allocate`].
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            stat_inc!(no_allocation);
            return Err(AllocError::ZeroSize);
        }
        let result = self.heap.lock().allocate(size).map(Allocation::into_raw);
        heap_trace!("allocate({}) -> {:?}", size, result);
        result
    }

    /// Allocates `size` bytes aligned to `align`. See [`Heap::allocate_aligned`].
    pub fn allocate_aligned(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            stat_inc!(no_allocation);
            return Err(AllocError::ZeroSize);
        }
        let result = self
            .heap
            .lock()
            .allocate_aligned(size, align)
            .map(Allocation::into_raw);
        heap_trace!("allocate_aligned({}, {}) -> {:?}", size, align, result);
        result
    }

    /// Allocates `count * size` zeroed bytes. The zeroing runs after the lock
    /// is released.
    pub fn allocate_zeroed(&self, count: usize, size: usize) -> Result<NonNull<u8>> {
        let total = zeroed_size(count, size)?;
        let ptr = self.allocate(total)?;
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, total) };
        Ok(ptr)
    }

    /// Returns a block. Null is a no-op and doesn't lock.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer issued by this allocator.
    pub unsafe fn release(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        unsafe { self.heap.lock().release_raw(ptr) };
        heap_trace!("release({:p})", ptr);
    }

    /// Resizes a block. Null behaves like [`BrkAlloc::allocate`]; a zero
    /// `new_size` fails without touching the block.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer issued by this allocator. It stays
    /// valid if this returns an error or the same pointer.
    pub unsafe fn resize(&self, ptr: *mut u8, new_size: usize) -> Result<NonNull<u8>> {
        unsafe { self.resize_aligned(ptr, new_size, crate::HEADER_ALIGN) }
    }

    /// [`BrkAlloc::resize`] for blocks from [`BrkAlloc::allocate_aligned`].
    ///
    /// # Safety
    /// Same contract as [`BrkAlloc::resize`].
    pub unsafe fn resize_aligned(
        &self,
        ptr: *mut u8,
        new_size: usize,
        align: usize,
    ) -> Result<NonNull<u8>> {
        if new_size == 0 {
            stat_inc!(no_allocation);
            return Err(AllocError::ZeroSize);
        }
        let result = unsafe {
            self.heap
                .lock()
                .resize_raw_aligned(ptr, new_size, align)
        };
        heap_trace!("resize({:p}, {}) -> {:?}", ptr, new_size, result);
        result
    }

    /// Runs `f` with the heap locked.
    ///
    /// `f` must not allocate through this same allocator: the lock is not
    /// reentrant.
    pub fn with_heap<R>(&self, f: impl FnOnce(&mut Heap<S>) -> R) -> R {
        f(&mut self.heap.lock())
    }
}

unsafe impl<S: HeapSource> GlobalAlloc for BrkAlloc<S> {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocate_aligned(layout.size(), layout.align())
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        unsafe { self.release(ptr) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.alloc(layout) };
        if !ptr.is_null() {
            unsafe { ptr::write_bytes(ptr, 0, layout.size()) };
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { self.resize_aligned(ptr, new_size, layout.align()) }
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

/// The process-wide break allocator.
///
/// Register as the global allocator with:
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: brkalloc::BrkMalloc = brkalloc::BrkMalloc;
/// ```
pub struct BrkMalloc;

impl BrkMalloc {
    /// Runs `f` with the process-wide heap locked. `f` must not allocate.
    pub fn with_heap<R>(&self, f: impl FnOnce(&mut Heap<DefaultSource>) -> R) -> R {
        HEAP.with_heap(f)
    }

    /// The process-wide allocator as a [`BrkAlloc`].
    pub fn get() -> &'static BrkAlloc {
        &HEAP
    }
}

unsafe impl GlobalAlloc for BrkMalloc {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { HEAP.alloc(layout) }
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { HEAP.dealloc(ptr, layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        unsafe { HEAP.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { HEAP.realloc(ptr, layout, new_size) }
    }
}
