//! Static backing store for targets without a usable program break.
//!
//! Miri can't execute `sbrk`, and non-unix targets have none, so the global
//! allocator there carves from a `static` arena sized by `brkalloc.toml`.

use super::{Arena, Region};
use crate::config::FALLBACK_HEAP_SIZE;

static mut ARENA: Arena<FALLBACK_HEAP_SIZE> = Arena::new();

pub(super) const fn default_source() -> Region {
    // SAFETY: ARENA is only ever reached through this one region, which is
    // owned by the process-wide allocator.
    unsafe { Region::new((&raw mut ARENA).cast::<u8>(), FALLBACK_HEAP_SIZE) }
}
