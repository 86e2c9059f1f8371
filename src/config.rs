//! Build-time constants generated by `build.rs` from `brkalloc.toml`.
//!
//! - `FALLBACK_HEAP_SIZE`: bytes of static memory backing the global
//!   allocator where no program break is available.
//! - `HEADER_CANARY`: magic word stored in every header under `canary`.

include!(concat!(env!("OUT_DIR"), "/config_gen.rs"));
