//! Installing the engine as the process's `#[global_allocator]`.
//!
//! [`mmapalloc::prepare_environment`] must run before the first allocation
//! this allocator serves — otherwise resolving `ALLOCATOR_ALGORITHM` /
//! `ALLOCATOR_SCRIBBLE` / the system page size would itself allocate and
//! re-enter the allocator's own mutex.

use mmapalloc::Allocator;

#[global_allocator]
static ALLOCATOR: Allocator = Allocator::new();

fn main() {
    mmapalloc::prepare_environment();

    let mut v = Vec::with_capacity(4);
    v.extend_from_slice(&[1, 2, 3, 4]);
    println!("{v:?}");

    let s = String::from("allocated through mmapalloc");
    println!("{s}");
}
