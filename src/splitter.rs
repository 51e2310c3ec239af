//! Carves a free block into a used-sized prefix and a free suffix.

use std::ptr::NonNull;

use crate::{
    block::Block,
    list::{List, Node},
    region::MIN_BLOCK_SIZE,
};

/// Splits `block` so that it becomes exactly `head_size` bytes and a new
/// free block is linked in immediately after it, covering the remainder.
///
/// Returns `None` — leaving `block` entirely untouched — when `block` isn't
/// free, `head_size` is smaller than the minimum legal block, or the
/// remainder would be smaller than the minimum legal block (splitting
/// wouldn't be worth it, or couldn't even hold a header).
///
/// **SAFETY**: `block` must currently be linked into `list`.
pub(crate) unsafe fn split(
    list: &mut List<Block>,
    mut block: NonNull<Node<Block>>,
    head_size: usize,
) -> Option<NonNull<Node<Block>>> {
    unsafe {
        if !block.as_ref().data.free || head_size < MIN_BLOCK_SIZE {
            return None;
        }

        let remainder = block.as_ref().data.size.checked_sub(head_size)?;
        if remainder < MIN_BLOCK_SIZE {
            return None;
        }

        let region_id = block.as_ref().data.region_id;
        let leftover_addr = NonNull::new_unchecked((block.as_ptr() as *mut u8).add(head_size));

        block.as_mut().data.size = head_size;

        let leftover = list.insert_after(block, Block::new(remainder, true, region_id), leftover_addr);

        Some(leftover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BLOCK_HEADER_SIZE;

    #[repr(align(8))]
    struct Scratch([u8; 4096]);

    fn scratch() -> Box<Scratch> {
        Box::new(Scratch([0; 4096]))
    }

    #[test]
    fn splits_oversized_free_block() {
        let mut scratch = scratch();
        let mut list: List<Block> = List::new();
        let addr = unsafe { NonNull::new_unchecked(scratch.0.as_mut_ptr()) };

        unsafe {
            let block = list.append(Block::new(512, true, 1), addr);

            let leftover = split(&mut list, block, 128).expect("should split");

            assert_eq!(block.as_ref().data.size, 128);
            assert_eq!(leftover.as_ref().data.size, 512 - 128);
            assert!(leftover.as_ref().data.free);
            assert_eq!(leftover.as_ref().data.region_id, 1);
            assert_eq!(list.tail(), Some(leftover));
            assert_eq!(block.as_ref().next, Some(leftover));
        }
    }

    #[test]
    fn refuses_to_split_when_remainder_too_small() {
        let mut scratch = scratch();
        let mut list: List<Block> = List::new();
        let addr = unsafe { NonNull::new_unchecked(scratch.0.as_mut_ptr()) };

        let head_size = BLOCK_HEADER_SIZE + 8;
        unsafe {
            let block = list.append(Block::new(head_size + 4, true, 1), addr);

            let result = split(&mut list, block, head_size);

            assert!(result.is_none());
            assert_eq!(block.as_ref().data.size, head_size + 4);
            assert_eq!(list.len(), 1);
        }
    }

    #[test]
    fn refuses_to_split_used_block() {
        let mut scratch = scratch();
        let mut list: List<Block> = List::new();
        let addr = unsafe { NonNull::new_unchecked(scratch.0.as_mut_ptr()) };

        unsafe {
            let block = list.append(Block::new(512, false, 1), addr);
            assert!(split(&mut list, block, 128).is_none());
        }
    }
}
