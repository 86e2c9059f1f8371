use brkalloc::{BrkMalloc, HEADER_SIZE, Heap, Region};
use std::alloc::{GlobalAlloc, Layout, System};
use std::collections::HashMap;
use std::time::Instant;

#[global_allocator]
static GLOBAL: BrkMalloc = BrkMalloc;

fn print_ledger(label: &str, heap: &mut Heap<Region>) {
    let end = heap.heap_end();
    println!("  [{label}] break = {end:#x}");
    for (i, b) in heap.blocks().enumerate() {
        println!(
            "    #{i}: {:p} size={:<4} {}",
            b.addr,
            b.size,
            if b.is_free { "free" } else { "used" }
        );
    }
}

fn main() {
    println!("brkalloc demo");
    println!("=============\n");

    // Everything below allocates through the program break.
    let boxed = Box::new(42u64);
    println!("Box<u64>:    value = {boxed}");

    let mut v: Vec<i32> = (0..1000).collect();
    println!("Vec<i32>:    len = {}, cap = {}", v.len(), v.capacity());
    v.sort_unstable_by(|a, b| b.cmp(a));
    println!("  sorted[0] = {}, sorted[999] = {}", v[0], v[999]);

    let s: String = (0..100).map(|i| format!("{i} ")).collect();
    println!("String:      len = {}", s.len());

    let mut map = HashMap::new();
    for i in 0..500 {
        map.insert(i, format!("val_{i}"));
    }
    println!("HashMap:     len = {}", map.len());

    let blocks = GLOBAL.with_heap(|h| h.len());
    println!("Global ledger holds {blocks} blocks\n");

    // Reuse and tail shrink on an isolated heap. The region comes from the
    // system allocator so printing doesn't disturb it.
    println!("Isolated heap walkthrough (header = {HEADER_SIZE} bytes):");
    let capacity = 4096;
    let base = unsafe { System.alloc(Layout::from_size_align(capacity, 16).unwrap()) };
    let mut heap = Heap::new(unsafe { Region::new(base, capacity) });

    let a = heap.allocate(64).unwrap();
    let b = heap.allocate(128).unwrap();
    print_ledger("alloc A=64, B=128", &mut heap);

    let a_addr = a.as_ptr();
    heap.release(a);
    print_ledger("release A (interior)", &mut heap);

    let c = heap.allocate(32).unwrap();
    println!("  alloc 32 reused A: {}", c.as_ptr() == a_addr);

    heap.release(b);
    print_ledger("release B (tail, break shrinks)", &mut heap);
    heap.release(c);
    print_ledger("release C (sole block)", &mut heap);

    // Multi-threaded workload through the single lock.
    println!("\nMulti-threaded run (4 threads, 20k allocs each):");
    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let mut vecs: Vec<Vec<u64>> = Vec::new();
                for i in 0u64..20_000 {
                    vecs.push(vec![i; 8]);
                    if vecs.len() > 100 {
                        vecs.drain(..50);
                    }
                }
                vecs.len()
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let elapsed = start.elapsed();
    println!("  completed in {elapsed:?} ({total} live vecs remaining)");

    println!("\nDone.");
}
