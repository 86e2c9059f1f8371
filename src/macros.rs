/// Increment a stats counter by 1.
///
/// Compiles to nothing when the `stats` feature is disabled.
macro_rules! stat_inc {
    ($counter:ident) => {
        #[cfg(feature = "stats")]
        {
            $crate::stats::STATS
                .$counter
                .fetch_add(1, ::core::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Add a value to a stats counter.
///
/// Compiles to nothing (including the value expression) when the `stats`
/// feature is disabled.
macro_rules! stat_add {
    ($counter:ident, $val:expr) => {
        #[cfg(feature = "stats")]
        {
            $crate::stats::STATS
                .$counter
                .fetch_add($val as u64, ::core::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Emit a `log::trace!` record under the `brkalloc` target.
///
/// Compiles to nothing when the `log` feature is disabled. Never call this
/// while the heap lock is held: a logger that allocates would re-enter the
/// allocator and spin on its own lock.
macro_rules! heap_trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        {
            ::log::trace!(target: "brkalloc", $($arg)+);
        }
    };
}

pub(crate) use {heap_trace, stat_add, stat_inc};
