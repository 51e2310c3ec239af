use std::{mem, ptr::NonNull};

use crate::{
    block::{Block, BLOCK_HEADER_SIZE},
    list::Node,
    os::{self, MapError},
};

/// Rounds `n` up to the next multiple of `alignment`, which must be a power
/// of two. Used both to round a requested size up to the 8-byte quantum and
/// to round a region's header+payload size up to a whole number of system
/// pages.
pub(crate) fn align_up(n: usize, alignment: usize) -> usize {
    (n + alignment - 1) & !(alignment - 1)
}

/// Minimum size of any legal block: a header plus one quantum of payload.
pub(crate) const MIN_BLOCK_SIZE: usize = BLOCK_HEADER_SIZE + crate::ALIGN;

/// Maps a fresh region large enough to hold `total_bytes` (header included),
/// rounded up to a whole number of system pages.
///
/// Returns the mapping's start address and its actual length, which may
/// exceed `total_bytes` — the caller is responsible for writing a block
/// header at that address spanning the full length.
pub(crate) fn map_region(total_bytes: usize, region_id: u64) -> Result<(NonNull<u8>, usize), MapError> {
    let region_size = align_up(total_bytes, os::page_size());

    match unsafe { os::request_memory(region_size) } {
        Ok(addr) => {
            log::debug!("mapped region {region_id}: {region_size} bytes at {addr:?}");
            Ok((addr, region_size))
        }
        Err(err) => {
            log::warn!("failed to map region of {region_size} bytes: {err}");
            Err(err)
        }
    }
}

/// Returns the region occupied by `block` back to the OS. Only legal when
/// `block` is the sole block in its region and free — the caller must
/// already have unlinked it from the global block list.
///
/// **SAFETY**: `block` must be a header written by [`map_region`] (or
/// descended from one via split/merge) spanning its entire mapped region.
pub(crate) unsafe fn unmap_region(block: NonNull<Node<Block>>) {
    let size = unsafe { block.as_ref().data.size };
    let region_id = unsafe { block.as_ref().data.region_id };
    let addr = block.cast::<u8>();

    unsafe { os::return_memory(addr, size) };

    log::debug!("unmapped region {region_id}: {size} bytes at {addr:?}");
}

const _: () = assert!(mem::size_of::<Block>() > 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_pointer_size() {
        let cases = [(1..8, 8), (9..16, 16), (17..24, 24), (25..32, 32)];

        for (sizes, expected) in cases {
            for size in sizes {
                assert_eq!(expected, align_up(size, 8));
            }
        }
    }

    #[test]
    fn align_up_page_size() {
        let cases = [(1..4096, 4096usize), (4097..8192, 8192)];

        for (sizes, expected) in cases {
            for size in sizes {
                assert_eq!(expected, align_up(size, 4096));
            }
        }
    }

    #[test]
    fn map_region_spans_whole_pages() {
        let (addr, size) = map_region(10, 1).expect("mapping should succeed");
        assert_eq!(size % os::page_size(), 0);
        assert!(!addr.as_ptr().is_null());
        unsafe { os::return_memory(addr, size) };
    }
}
