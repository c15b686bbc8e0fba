// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::SharedPointerKind;

use crate::balance::DELTA;
use crate::node::{Node, Root};

/// A structural invariant violation found by [`check`].
///
/// A correct build of this crate never produces one; the checker exists
/// for test suites and debugging.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    /// A node's key does not order strictly between its subtrees.
    #[error("key ordering violated between a node and its subtree")]
    OutOfOrder,
    /// Sibling subtrees outweigh each other beyond the balance bound.
    #[error("weight balance violated: left={left}, right={right}")]
    Imbalance {
        /// Size of the left subtree.
        left: usize,
        /// Size of the right subtree.
        right: usize,
    },
    /// A node's stored size disagrees with its subtrees.
    #[error("stored size {stored} != computed size {computed}")]
    SizeMismatch {
        /// The size recorded in the node.
        stored: usize,
        /// The size recomputed from its subtrees.
        computed: usize,
    },
}

/// Validate key ordering, weight balance and size bookkeeping for every
/// node of the tree.
pub fn check<K, V, P>(root: &Root<K, V, P>) -> Result<(), InvariantError>
where
    K: Ord,
    P: SharedPointerKind,
{
    if let Some(n) = root {
        check_node(n, None, None)?;
    }
    Ok(())
}

fn check_node<K, V, P>(
    node: &Node<K, V, P>,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Result<usize, InvariantError>
where
    K: Ord,
    P: SharedPointerKind,
{
    let key = &node.entry.key;
    if lower.map_or(false, |lo| key <= lo) || upper.map_or(false, |hi| key >= hi) {
        return Err(InvariantError::OutOfOrder);
    }

    let left = match &node.left {
        Some(l) => check_node(l, lower, Some(key))?,
        None => 0,
    };
    let right = match &node.right {
        Some(r) => check_node(r, Some(key), upper)?,
        None => 0,
    };

    if left + right > 1 && (left > DELTA * right || right > DELTA * left) {
        return Err(InvariantError::Imbalance { left, right });
    }
    let computed = 1 + left + right;
    if node.size != computed {
        return Err(InvariantError::SizeMismatch { stored: node.size, computed });
    }
    Ok(computed)
}
