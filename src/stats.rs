//! Allocation statistics counters.
//!
//! All counters use `Relaxed` ordering. They are observational only; the heap
//! lock provides the ordering guarantees for correctness. Counters are
//! process-wide and shared by every [`BrkAlloc`](crate::BrkAlloc) and
//! [`Heap`](crate::Heap) instance.
//!
//! ```ignore
//! let snap = brkalloc::stats::snapshot();
//! println!("heap grows: {}", snap.heap_grows);
//! ```

use core::sync::atomic::{AtomicU64, Ordering};

macro_rules! counters {
    ($($(#[$doc:meta])* $name:ident,)*) => {
        pub(crate) struct Stats {
            $($(#[$doc])* pub $name: AtomicU64,)*
        }

        impl Stats {
            const fn new() -> Self {
                Self { $($name: AtomicU64::new(0),)* }
            }
        }

        /// A point-in-time snapshot of all allocation statistics.
        ///
        /// Individual fields are each atomically read, but the snapshot as a
        /// whole is not globally consistent.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct Snapshot {
            $($(#[$doc])* pub $name: u64,)*
        }

        /// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
        pub fn snapshot() -> Snapshot {
            let s = &STATS;
            Snapshot { $($name: s.$name.load(Ordering::Relaxed),)* }
        }
    };
}

counters! {
    /// Non-zero allocate calls.
    alloc_count,
    /// Sum of byte sizes passed to non-zero allocate calls.
    alloc_bytes,
    /// Allocations served by reusing a free block.
    reuse_hits,
    /// Successful break extensions.
    heap_grows,
    /// Bytes added to the heap by break extensions, padding included.
    heap_grow_bytes,
    /// Releases that shrank the break.
    heap_shrinks,
    /// Bytes returned by shrinking the break.
    heap_shrink_bytes,
    /// Releases that only marked a block free.
    interior_releases,
    /// Releases ignored because the header failed its canary check.
    foreign_releases,
    /// Zero-allocate calls.
    zeroed_count,
    /// Resize calls on a live block.
    resize_count,
    /// Resizes answered with the same pointer.
    resize_in_place,
    /// Resizes that moved the data to a new block.
    resize_moves,
    /// Requests refused as zero-size, overflowing or misaligned.
    no_allocation,
    /// Requests refused because the heap source would not grow.
    out_of_memory,
    /// Lock acquisitions that had to wait.
    lock_contended,
}

pub(crate) static STATS: Stats = Stats::new();
