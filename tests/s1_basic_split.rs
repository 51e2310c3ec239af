//! S1 — basic split, default (unset `ALLOCATOR_ALGORITHM`) first-fit
//! placement: releasing two blocks of different sizes and reacquiring a
//! small one reuses the first (address-order) free block large enough,
//! leaving the other free block undisturbed.

use mmapalloc::Allocator;

fn dump(allocator: &Allocator) -> String {
    let mut out = Vec::new();
    allocator.dump(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn line_for<'a>(text: &'a str, label: &str) -> &'a str {
    text.lines()
        .find(|line| line.contains(&format!("'{label}'")))
        .unwrap_or_else(|| panic!("no dump line for label {label}"))
}

#[test]
fn basic_split_reuses_first_fit_slot() {
    let allocator = Allocator::new();

    let a = allocator.labeled_acquire(100, "A");
    let b = allocator.labeled_acquire(100, "B");
    let _c = allocator.labeled_acquire(100, "C");
    let d = allocator.labeled_acquire(10, "D");
    let e = allocator.labeled_acquire(100, "E");
    let f = allocator.labeled_acquire(100, "F");

    allocator.release(b);
    allocator.release(d);

    let g = allocator.labeled_acquire(10, "G");

    // first_fit walks from head: B's slot precedes D's in address order and
    // is large enough, so G lands there, not in D's tighter slot.
    assert_eq!(g, b);

    let text = dump(&allocator);
    assert!(line_for(&text, "D").contains("[FREE]"));
    assert!(line_for(&text, "G").contains("[USED]"));

    allocator.release(a);
    allocator.release(g);
    allocator.release(e);
    allocator.release(f);
}
