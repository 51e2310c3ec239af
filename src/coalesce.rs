//! Joins a just-freed block with its immediate free neighbors in the same
//! region.

use std::ptr::NonNull;

use crate::{
    block::Block,
    list::{List, Node},
};

/// Attempts to absorb `block`'s next and previous neighbors into it, in that
/// order, when they share a region and are free. Returns the representative
/// header for the merged run — `block` itself, unless a merge with `prev`
/// took place, in which case it's `prev`.
///
/// At most one absorption happens on each side: coalescing is
/// invariant-preserving, so there can never be a chain of two adjacent free
/// blocks on either side before this call.
///
/// **SAFETY**: `block` must currently be linked into `list` and free.
pub(crate) unsafe fn merge(
    list: &mut List<Block>,
    mut block: NonNull<Node<Block>>,
) -> NonNull<Node<Block>> {
    unsafe {
        debug_assert!(block.as_ref().data.free);

        if let Some(next) = block.as_ref().next {
            let same_region = next.as_ref().data.region_id == block.as_ref().data.region_id;
            if same_region && next.as_ref().data.free {
                let absorbed = next.as_ref().data.size;
                block.as_mut().data.size += absorbed;
                list.unlink(next);
            }
        }

        if let Some(prev) = block.as_ref().prev {
            let same_region = prev.as_ref().data.region_id == block.as_ref().data.region_id;
            if same_region && prev.as_ref().data.free {
                let mut prev = prev;
                let absorbed = block.as_ref().data.size;
                prev.as_mut().data.size += absorbed;
                list.unlink(block);
                block = prev;
            }
        }

        block
    }
}
