//! Failure outcomes of the allocator core.
//!
//! The raw entry points (`GlobalAlloc`, the C ABI) collapse every variant to
//! a null pointer. The typed API keeps them apart so callers can tell a benign
//! zero-size request from heap exhaustion.

use core::fmt;

/// Why an allocation request produced no memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocError {
    /// Zero bytes were requested (or a zero count/size to `allocate_zeroed`).
    ZeroSize,
    /// `count * size` wrapped the address space in `allocate_zeroed`.
    Overflow,
    /// The requested alignment is not a power of two.
    BadAlignment,
    /// The heap source refused to extend the break.
    OutOfMemory,
    /// The header in front of a pointer failed its canary check.
    ///
    /// Only reported with the `canary` feature.
    ForeignPointer,
}

impl AllocError {
    /// True for the outcomes that are not resource exhaustion: the request
    /// itself asked for nothing, or asked for something unrepresentable.
    pub const fn is_no_allocation(self) -> bool {
        matches!(self, Self::ZeroSize | Self::Overflow | Self::BadAlignment)
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ZeroSize => "zero-size allocation request",
            Self::Overflow => "allocation size overflows usize",
            Self::BadAlignment => "alignment is not a power of two",
            Self::OutOfMemory => "heap source refused to grow the break",
            Self::ForeignPointer => "pointer was not issued by this allocator",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for AllocError {}

pub type Result<T> = core::result::Result<T, AllocError>;
