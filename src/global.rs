//! The idiomatic Rust analogue of wrapping the C ABI's `malloc`/`free`:
//! `#[global_allocator]`. This is purely an adapter over [`Allocator`]'s own
//! operations — see `demos/global.rs` for a runnable example, and
//! [`crate::prepare_environment`] for the setup call it needs first.

use std::alloc::{GlobalAlloc, Layout};

use crate::{Allocator, ALIGN};

unsafe impl GlobalAlloc for Allocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN {
            return std::ptr::null_mut();
        }
        self.acquire(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.release(ptr);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGN {
            return std::ptr::null_mut();
        }
        self.zero_acquire(1, layout.size())
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > ALIGN {
            return std::ptr::null_mut();
        }
        self.resize(ptr, new_size)
    }
}
