//! Selectable search strategies over the global block list, and the
//! environment-driven resolution of which one is active.

use std::{ptr::NonNull, sync::OnceLock};

use crate::{
    block::Block,
    list::{List, Node},
};

/// Which placement strategy an acquire should use to search for a reusable
/// free block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    FirstFit,
    BestFit,
    WorstFit,
    /// `ALLOCATOR_ALGORITHM` was unset or held an unrecognized value. Not an
    /// error: every search under this policy reports no candidate, forcing
    /// a fresh region on every acquire.
    None,
}

static POLICY: OnceLock<Policy> = OnceLock::new();

/// Resolves [`Policy`] from `ALLOCATOR_ALGORITHM`, once per process.
pub(crate) fn resolved_policy() -> Policy {
    *POLICY.get_or_init(|| match std::env::var("ALLOCATOR_ALGORITHM") {
        Ok(value) if value == "first_fit" => Policy::FirstFit,
        Ok(value) if value == "best_fit" => Policy::BestFit,
        Ok(value) if value == "worst_fit" => Policy::WorstFit,
        Ok(other) if !other.is_empty() => {
            log::warn!("unknown ALLOCATOR_ALGORITHM '{other}', disabling block reuse");
            Policy::None
        }
        _ => Policy::FirstFit,
    })
}

/// Searches `list` under `policy` for a free block able to hold at least `n`
/// bytes (header included). Returns `None` if no candidate exists, or if
/// `policy` is [`Policy::None`].
pub(crate) fn find(list: &List<Block>, policy: Policy, n: usize) -> Option<NonNull<Node<Block>>> {
    match policy {
        Policy::FirstFit => first_fit(list, n),
        Policy::BestFit => best_fit(list, n),
        Policy::WorstFit => worst_fit(list, n),
        Policy::None => None,
    }
}

fn candidates(list: &List<Block>, n: usize) -> impl Iterator<Item = (NonNull<Node<Block>>, usize)> + '_ {
    list.iter()
        .filter(move |(_, block)| block.free && block.size >= n)
        .map(move |(node, block)| (node, block.size - n))
}

fn first_fit(list: &List<Block>, n: usize) -> Option<NonNull<Node<Block>>> {
    candidates(list, n).next().map(|(node, _)| node)
}

fn best_fit(list: &List<Block>, n: usize) -> Option<NonNull<Node<Block>>> {
    candidates(list, n)
        .min_by_key(|&(_, slack)| slack)
        .map(|(node, _)| node)
}

fn worst_fit(list: &List<Block>, n: usize) -> Option<NonNull<Node<Block>>> {
    // `max_by_key` keeps the *last* maximum on ties; the spec wants the
    // first-encountered candidate to win, so track the running max by hand.
    let mut best: Option<(NonNull<Node<Block>>, usize)> = None;
    for (node, slack) in candidates(list, n) {
        match best {
            Some((_, best_slack)) if slack <= best_slack => {}
            _ => best = Some((node, slack)),
        }
    }
    best.map(|(node, _)| node)
}
