//! The allocator's one lock.
//!
//! `std::sync::Mutex` may allocate and is unavailable under `no_std`, so every
//! public allocator operation serializes on this test-and-set spin mutex
//! instead. It is not reentrant: locking it again from the thread that holds
//! it spins forever.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::macros::stat_inc;

/// Spins before yielding the thread, when `std` is available.
#[cfg(feature = "std")]
const SPINS_BEFORE_YIELD: u32 = 64;

/// A mutex that uses a spinlock for synchronization.
/// Does not allocate and can be used in a `static`.
pub struct SpinMutex<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinMutex<T> {}
unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    pub const fn new(val: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(val),
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Blocks until the lock is free. No timeout, no fairness beyond what the
    /// cache-coherence protocol gives.
    #[inline]
    pub fn lock(&self) -> SpinMutexGuard<'_, T> {
        if !self.try_acquire() {
            self.lock_contended();
        }
        SpinMutexGuard { mutex: self }
    }

    #[cold]
    fn lock_contended(&self) {
        stat_inc!(lock_contended);
        #[cfg(feature = "std")]
        let mut spins = 0u32;
        loop {
            // Spin on a plain load so waiters don't bounce the cache line.
            while self.locked.load(Ordering::Relaxed) {
                #[cfg(feature = "std")]
                {
                    spins += 1;
                    if spins % SPINS_BEFORE_YIELD == 0 {
                        std::thread::yield_now();
                        continue;
                    }
                }
                core::hint::spin_loop();
            }
            if self.try_acquire() {
                return;
            }
        }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinMutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Racy snapshot of the lock state; only useful for diagnostics.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Exclusive access without locking, via `&mut self`.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// RAII guard for `SpinMutex`. Unlocks on drop.
pub struct SpinMutexGuard<'a, T> {
    mutex: &'a SpinMutex<T>,
}

impl<T> Deref for SpinMutexGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for SpinMutexGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for SpinMutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.mutex.locked.store(false, Ordering::Release);
    }
}
