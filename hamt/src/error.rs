// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::SharedPointerKind;

use crate::bitmap::{chunk, BITS_PER_SUBKEY};
use crate::node::{Node, Root};

/// A structural invariant violation found by [`check`].
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    /// A branch's child array disagrees with its bitmap.
    #[error("branch holds {children} children for a bitmap of {populated} bits")]
    BitmapMismatch {
        /// Number of children stored.
        children: usize,
        /// Popcount of the bitmap.
        populated: usize,
    },
    /// A branch has no children at all.
    #[error("branch holds no children")]
    EmptyBranch,
    /// A single-child branch wraps a node it should have collapsed
    /// into.
    #[error("single-child branch wraps a leaf or collision")]
    DanglingChain,
    /// A collision bucket holds fewer than two entries.
    #[error("collision bucket holds {size} entries")]
    ThinCollision {
        /// Entries in the bucket.
        size: usize,
    },
    /// A node sits under a slot its hash does not select.
    #[error("node hash {hash:#010x} does not match its position")]
    MisplacedNode {
        /// The node's hash.
        hash: u32,
    },
    /// A wrapper's cached size disagrees with the trie.
    #[error("cached size {stored} != counted size {computed}")]
    WrongSize {
        /// The cached size.
        stored: usize,
        /// The number of entries actually present.
        computed: usize,
    },
    /// The collision bucket's ordered tree is itself broken.
    #[error(transparent)]
    Bucket(#[from] shale_tree::InvariantError),
}

/// Validate bitmap consistency, chain collapse, collision bucket sizes
/// and hash placement for every node of the trie.
pub fn check<K, V, P>(root: &Root<K, V, P>) -> Result<(), InvariantError>
where
    K: Ord,
    P: SharedPointerKind,
{
    match root {
        None => Ok(()),
        Some(node) => check_node(node, 0, 0),
    }
}

fn check_node<K, V, P>(node: &Node<K, V, P>, shift: u32, prefix: u32) -> Result<(), InvariantError>
where
    K: Ord,
    P: SharedPointerKind,
{
    let prefix_mask = if shift >= 32 { !0 } else { (1u32 << shift) - 1 };
    match node {
        Node::Leaf { hash, .. } => {
            if hash & prefix_mask != prefix {
                return Err(InvariantError::MisplacedNode { hash: *hash });
            }
            Ok(())
        }
        Node::Collision { hash, tree } => {
            if hash & prefix_mask != prefix {
                return Err(InvariantError::MisplacedNode { hash: *hash });
            }
            let size = shale_tree::size(tree);
            if size < 2 {
                return Err(InvariantError::ThinCollision { size });
            }
            shale_tree::check(tree)?;
            Ok(())
        }
        Node::Branch { bitmap, children } => {
            let populated = bitmap.count_ones() as usize;
            if populated != children.len() {
                return Err(InvariantError::BitmapMismatch {
                    children: children.len(),
                    populated,
                });
            }
            if children.is_empty() {
                return Err(InvariantError::EmptyBranch);
            }
            if children.len() == 1 && children[0].is_leaf_like() {
                return Err(InvariantError::DanglingChain);
            }
            let mut pos = 0;
            for i in 0..32u32 {
                if bitmap & (1 << i) == 0 {
                    continue;
                }
                let child = &children[pos];
                pos += 1;
                let child_prefix = prefix | (i << shift);
                check_node(child, shift + BITS_PER_SUBKEY, child_prefix)?;
                if let Node::Leaf { hash, .. } | Node::Collision { hash, .. } = &**child {
                    if chunk(*hash, shift) != i {
                        return Err(InvariantError::MisplacedNode { hash: *hash });
                    }
                }
            }
            Ok(())
        }
    }
}
