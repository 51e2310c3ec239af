//! S5 — in-place grow: resizing upward into a free, same-region neighbor
//! keeps the same pointer and preserves the original contents, and the
//! absorbed neighbor's header disappears entirely.

use mmapalloc::Allocator;

#[test]
fn resize_grows_into_freed_neighbor_in_place() {
    let allocator = Allocator::new();

    let x = allocator.labeled_acquire(100, "X");
    let y = allocator.labeled_acquire(100, "Y");
    unsafe { x.write_bytes(0x5, 100) };

    allocator.release(y);

    let grown = allocator.resize(x, 150);
    assert_eq!(grown, x);

    let bytes = unsafe { std::slice::from_raw_parts(grown, 100) };
    assert!(bytes.iter().all(|&b| b == 0x5));

    let mut out = Vec::new();
    allocator.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("'Y'"));

    allocator.release(grown);
}
