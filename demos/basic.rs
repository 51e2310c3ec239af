//! Acquire, use, and release memory directly through the engine, with no
//! OS-level global-allocator wiring involved.

use mmapalloc::Allocator;

fn log_acquire(addr: *mut u8, size: usize) {
    println!("Requested {size} bytes of memory");
    println!("Received this address: {addr:?}");
}

fn main() {
    let allocator = Allocator::new();

    let addr1 = allocator.labeled_acquire(8, "first");
    log_acquire(addr1, 8);

    let addr2 = allocator.labeled_acquire(8, "second");
    log_acquire(addr2, 8);

    let addr3 = allocator.labeled_acquire(16, "third");
    log_acquire(addr3, 16);

    let mut out = std::io::stdout();
    allocator.dump(&mut out).unwrap();

    allocator.release(addr1);
    allocator.release(addr2);
    allocator.release(addr3);
}
