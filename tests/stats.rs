//! Statistics counters.
//!
//! Run with: cargo test --features stats --test stats
//!
//! Counters are process-wide and other tests run concurrently, so checks
//! compare deltas with `>=`.

#![cfg(feature = "stats")]

mod common;

use brkalloc::stats;
use common::heap;

#[test]
fn grow_reuse_and_shrink_are_counted() {
    let mut h = heap(4096);
    let before = stats::snapshot();

    let a = h.allocate(64).unwrap();
    let b = h.allocate(64).unwrap();
    h.release(a);
    let c = h.allocate(32).unwrap();
    h.release(b);

    let after = stats::snapshot();
    assert!(after.alloc_count >= before.alloc_count + 3);
    assert!(after.alloc_bytes >= before.alloc_bytes + 160);
    assert!(after.heap_grows >= before.heap_grows + 2);
    assert!(after.reuse_hits > before.reuse_hits);
    assert!(after.interior_releases > before.interior_releases);
    assert!(after.heap_shrinks > before.heap_shrinks);
    h.release(c);
}

#[test]
fn failures_are_counted() {
    let mut h = heap(256);
    let before = stats::snapshot();

    let _ = h.allocate(0);
    let _ = h.allocate_zeroed(usize::MAX, 2);
    let _ = h.allocate(4096);

    let after = stats::snapshot();
    assert!(after.no_allocation >= before.no_allocation + 2);
    assert!(after.out_of_memory > before.out_of_memory);
    assert!(after.zeroed_count > before.zeroed_count);
}

#[test]
fn resize_paths_are_counted() {
    let mut h = heap(4096);
    let before = stats::snapshot();

    let mut a = h.allocate(64).unwrap();
    h.resize(&mut a, 32).unwrap();
    h.resize(&mut a, 128).unwrap();

    let after = stats::snapshot();
    assert!(after.resize_count >= before.resize_count + 2);
    assert!(after.resize_in_place > before.resize_in_place);
    assert!(after.resize_moves > before.resize_moves);
}
