#![no_std]

//! brkalloc: a first-fit allocator over a single `sbrk`-grown heap.
//!
//! Every block sits behind a fixed-size header on one contiguous heap, and
//! all headers form one address-ordered chain:
//!
//! ```text
//!   ┌────────┬──────┬────────┬──────────┬────────┬─────┐
//!   │ hdr A  │  A   │ hdr B  │    B     │ hdr C  │  C  │ ← break
//!   └────────┴──────┴────────┴──────────┴────────┴─────┘
//!   head ──────────────► ──────────────────► tail
//! ```
//!
//! - allocate: first free block large enough, else grow the break.
//! - release: shrink the break if the block ends the heap, else mark it free.
//! - no coalescing, no size classes, no per-thread caches; one lock.
//!
//! # Usage
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: brkalloc::BrkMalloc = brkalloc::BrkMalloc;
//! ```
//!
//! For an isolated heap with explicit state, build a [`Heap`] (unlocked) or
//! a [`BrkAlloc`] (locked) over any [`HeapSource`], e.g. a [`Region`].

#[cfg(any(test, feature = "std"))]
extern crate std;

mod macros;

pub mod allocator;
pub mod config;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod header;
pub mod heap;
pub mod ledger;
pub mod platform;
#[cfg(feature = "stats")]
pub mod stats;
pub mod sync;

pub use allocator::{BrkAlloc, BrkMalloc};
pub use error::AllocError;
pub use header::{HEADER_ALIGN, HEADER_SIZE};
pub use heap::{Allocation, Heap};
pub use ledger::BlockInfo;
pub use platform::{Arena, HeapSource, Region};

// Panic handler for staticlib builds (no_std has no default panic handler).
// Only active when panic="abort" (i.e., the `fast` profile), not during normal checks.
#[cfg(all(feature = "ffi", not(test), not(feature = "std"), panic = "abort"))]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    unsafe extern "C" {
        fn abort() -> !;
    }
    unsafe { abort() }
}
