//! Orchestrates the block list, placement policies, splitter, coalescer,
//! and region manager into the four public operations plus the diagnostic
//! variants, all under a single process-wide mutex.

use std::{
    io,
    ptr::NonNull,
    sync::{Mutex, OnceLock},
};

use crate::{
    block::{self, Block, BLOCK_HEADER_SIZE},
    coalesce,
    list::{List, Node},
    policy,
    region::{self, align_up, MIN_BLOCK_SIZE},
    splitter, ALIGN,
};

static SCRIBBLE: OnceLock<bool> = OnceLock::new();

/// Resolves `ALLOCATOR_SCRIBBLE` once per process and caches the result.
pub(crate) fn scribble_flag() -> bool {
    *SCRIBBLE.get_or_init(|| std::env::var("ALLOCATOR_SCRIBBLE").as_deref() == Ok("1"))
}

const SCRIBBLE_BYTE: u8 = 0xAA;

struct State {
    list: List<Block>,
    next_alloc_id: u64,
    next_region_id: u64,
}

impl State {
    const fn new() -> Self {
        Self {
            list: List::new(),
            next_alloc_id: 0,
            next_region_id: 0,
        }
    }
}

/// The free-space management engine: a doubly linked intrusive block index
/// over one or more OS-mapped regions, with first/best/worst-fit placement,
/// splitting, coalescing, and region reclamation.
///
/// All public operations serialize on an internal mutex acquired on entry
/// and released on every exit path, including error paths.
pub struct Allocator {
    state: Mutex<State>,
}

impl Allocator {
    /// Creates an allocator with no regions mapped yet. Cheap and
    /// `const`-constructible so it can be used directly as a
    /// `static`/`#[global_allocator]`.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
        }
    }

    fn real_size(requested: usize) -> usize {
        align_up(requested + BLOCK_HEADER_SIZE, ALIGN).max(MIN_BLOCK_SIZE)
    }

    /// Acquires a buffer of at least `size` bytes. Returns null on OS
    /// mapping failure.
    pub fn acquire(&self, size: usize) -> *mut u8 {
        self.acquire_labeled(size, None)
    }

    /// Diagnostic variant of [`Allocator::acquire`] that additionally
    /// records `label` (truncated to 31 characters) in the block header.
    pub fn labeled_acquire(&self, size: usize, label: &str) -> *mut u8 {
        self.acquire_labeled(size, Some(label))
    }

    fn acquire_labeled(&self, size: usize, label: Option<&str>) -> *mut u8 {
        let real = Self::real_size(size);
        let mut state = self.state.lock().unwrap();

        let header = match policy::find(&state.list, policy::resolved_policy(), real) {
            Some(candidate) => {
                unsafe { splitter::split(&mut state.list, candidate, real) };
                candidate
            }
            None => match self.map_fresh_region(&mut state, real) {
                Some(header) => header,
                None => return std::ptr::null_mut(),
            },
        };

        let alloc_id = state.next_alloc_id;
        state.next_alloc_id += 1;

        unsafe {
            let mut header = header;
            header.as_mut().data.free = false;
            match label {
                Some(label) => header.as_mut().data.set_label(label),
                None => header
                    .as_mut()
                    .data
                    .set_label_fmt(format_args!("Allocation {alloc_id}")),
            }
        }

        let payload = unsafe { block::payload_ptr(header) };

        if scribble_flag() {
            unsafe { payload.as_ptr().write_bytes(SCRIBBLE_BYTE, size) };
        }

        payload.as_ptr()
    }

    /// Maps a new region sized for `real` bytes, links it in as a single
    /// free block, and splits off the requested prefix. Returns the header
    /// of the (now oversized-or-exact) block to use, still marked free —
    /// the caller finishes marking it used.
    fn map_fresh_region(&self, state: &mut State, real: usize) -> Option<NonNull<Node<Block>>> {
        let region_id = state.next_region_id;
        let (addr, mapped_len) = region::map_region(real, region_id).ok()?;
        state.next_region_id += 1;

        let block = Block::new(mapped_len, true, region_id);
        let header = unsafe { state.list.append(block, addr) };

        unsafe { splitter::split(&mut state.list, header, real) };

        Some(header)
    }

    /// Releases a previously acquired payload pointer. A null pointer is a
    /// no-op.
    pub fn release(&self, payload: *mut u8) {
        let Some(payload) = NonNull::new(payload) else {
            return;
        };

        let mut state = self.state.lock().unwrap();
        let header = unsafe { block::header_from_payload(payload) };

        unsafe { header.as_ptr().as_mut().unwrap().data.free = true };

        let representative = unsafe { coalesce::merge(&mut state.list, header) };

        let sole_block_in_region = unsafe {
            let region_id = representative.as_ref().data.region_id;
            let prev_shares = representative
                .as_ref()
                .prev
                .is_some_and(|p| p.as_ref().data.region_id == region_id);
            let next_shares = representative
                .as_ref()
                .next
                .is_some_and(|n| n.as_ref().data.region_id == region_id);
            !prev_shares && !next_shares
        };

        if sole_block_in_region {
            unsafe {
                state.list.unlink(representative);
                region::unmap_region(representative);
            }
        }
    }

    /// Acquires `count * size` bytes and zeroes them.
    ///
    /// Overflow of `count * size` is not defended against, matching the
    /// surrounding C ABI contract this engine services.
    pub fn zero_acquire(&self, count: usize, size: usize) -> *mut u8 {
        let total = count * size;
        let payload = self.acquire(total);

        if !payload.is_null() {
            unsafe { payload.write_bytes(0, total) };
        }

        payload
    }

    /// Resizes the buffer at `payload` to `new_size`, growing in place when
    /// possible.
    ///
    /// `payload == null` behaves like [`Allocator::acquire`]; `new_size ==
    /// 0` behaves like [`Allocator::release`] and returns null.
    pub fn resize(&self, payload: *mut u8, new_size: usize) -> *mut u8 {
        let Some(payload_nn) = NonNull::new(payload) else {
            return self.acquire(new_size);
        };

        if new_size == 0 {
            self.release(payload);
            return std::ptr::null_mut();
        }

        let real = Self::real_size(new_size);

        let old_payload_size = {
            let mut state = self.state.lock().unwrap();
            let header = unsafe { block::header_from_payload(payload_nn) };

            let can_grow_in_place = unsafe {
                match header.as_ref().next {
                    Some(next) => {
                        next.as_ref().data.region_id == header.as_ref().data.region_id
                            && next.as_ref().data.free
                            && header.as_ref().data.size + next.as_ref().data.size >= real
                    }
                    None => false,
                }
            };

            if can_grow_in_place {
                unsafe {
                    let mut header = header;
                    let next = header.as_ref().next.unwrap();
                    let absorbed = next.as_ref().data.size;
                    header.as_mut().data.size += absorbed;
                    state.list.unlink(next);
                }
                return payload;
            }

            unsafe { header.as_ref().data.size - BLOCK_HEADER_SIZE }
        };

        let new_payload = self.acquire(new_size);
        if new_payload.is_null() {
            return std::ptr::null_mut();
        }

        let copy_len = old_payload_size.min(new_size);
        unsafe { std::ptr::copy_nonoverlapping(payload, new_payload, copy_len) };

        self.release(payload);

        new_payload
    }

    /// Writes a stable, parseable report of every mapped region and block
    /// to `out`. Never allocates, so it is safe to call even when this
    /// allocator is installed as the process's global allocator.
    pub fn dump(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let state = self.state.lock().unwrap();

        writeln!(out, "-- Current Memory State --")?;

        let mut current_region: Option<u64> = None;

        for (header, data) in state.list.iter() {
            if current_region != Some(data.region_id) {
                writeln!(out, "[REGION {}] {:p}", data.region_id, header.as_ptr())?;
                current_region = Some(data.region_id);
            }

            let start = header.as_ptr();
            let end = unsafe { block::block_end(header) };
            let next = unsafe { header.as_ref().next }
                .map(|n| n.as_ptr())
                .unwrap_or(std::ptr::null_mut());

            writeln!(
                out,
                "    [BLOCK] {start:p}-{end:p} in region {} '{}' {} [{}] -> {next:p}",
                data.region_id,
                data.label(),
                data.size,
                if data.free { "FREE" } else { "USED" },
            )?;
        }

        Ok(())
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: every field access goes through `self.state`'s mutex.
unsafe impl Sync for Allocator {}
unsafe impl Send for Allocator {}
