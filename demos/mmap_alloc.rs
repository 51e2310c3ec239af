//! Reuse of a freed block: acquiring, releasing, then acquiring the same
//! size again should hand back the same address.

use mmapalloc::Allocator;

fn main() {
    let allocator = Allocator::new();

    let block1 = allocator.acquire(4);
    println!("{block1:?}");
    let block2 = allocator.acquire(4);
    println!("{block2:?}");

    println!("Releasing block1");
    allocator.release(block1);

    let block3 = allocator.acquire(4);
    println!("Should be first addr {block3:?}");

    allocator.release(block2);
    allocator.release(block3);
}
