//! Boundary behaviors from the acquire/release contract that don't need a
//! dedicated scenario of their own.

use mmapalloc::Allocator;

#[test]
fn zero_byte_acquire_is_still_valid_and_distinct() {
    let allocator = Allocator::new();

    let a = allocator.acquire(0);
    let b = allocator.acquire(0);

    assert!(!a.is_null());
    assert!(!b.is_null());
    assert_ne!(a, b);

    allocator.release(a);
    allocator.release(b);
}

#[test]
fn fresh_region_acquire_reports_at_least_the_requested_size() {
    let allocator = Allocator::new();

    let p = allocator.labeled_acquire(64, "tight");
    assert!(!p.is_null());

    let mut out = Vec::new();
    allocator.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let line = text.lines().find(|l| l.contains("'tight'")).unwrap();
    assert!(line.contains("[USED]"));

    allocator.release(p);
}

#[test]
fn release_of_null_is_a_noop() {
    let allocator = Allocator::new();
    allocator.release(std::ptr::null_mut());
}

#[test]
fn resize_to_current_size_preserves_contents() {
    let allocator = Allocator::new();
    let p = allocator.acquire(48);
    unsafe { p.write_bytes(0x9, 48) };

    let same = allocator.resize(p, 48);
    let bytes = unsafe { std::slice::from_raw_parts(same, 48) };
    assert!(bytes.iter().all(|&b| b == 0x9));

    allocator.release(same);
}
