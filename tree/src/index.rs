// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Rank and select queries.
//!
//! Every node stores the size of its subtree, so positional access is a
//! single descent.

use core::borrow::Borrow;
use core::cmp::Ordering;

use archery::{SharedPointer, SharedPointerKind};

use crate::balance::{combine_after_insert_or_remove, combine_different_sizes, glue_size_balanced};
use crate::change::Change;
use crate::entry::Entry;
use crate::node::{replace_entry, same_root, size, Root};

/// Rank of `key`: how many keys order strictly before it. `None` when
/// the key is absent.
pub fn index_of<K, V, P, Q>(root: &Root<K, V, P>, key: &Q) -> Option<usize>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    let mut node = root.as_ref();
    let mut before = 0;
    while let Some(n) = node {
        match key.cmp(n.entry.key.borrow()) {
            Ordering::Less => node = n.left.as_ref(),
            Ordering::Greater => {
                before += size(&n.left) + 1;
                node = n.right.as_ref();
            }
            Ordering::Equal => return Some(before + size(&n.left)),
        }
    }
    None
}

/// The entry at rank `index`, counting from zero in key order.
pub fn lookup_by_index<K, V, P>(root: &Root<K, V, P>, index: usize) -> Option<(&K, &V)>
where
    P: SharedPointerKind,
{
    if index >= size(root) {
        return None;
    }
    let mut node = root.as_ref();
    let mut index = index;
    while let Some(n) = node {
        let ls = size(&n.left);
        match index.cmp(&ls) {
            Ordering::Less => node = n.left.as_ref(),
            Ordering::Equal => return Some((&n.entry.key, &n.entry.value)),
            Ordering::Greater => {
                index -= ls + 1;
                node = n.right.as_ref();
            }
        }
    }
    None
}

/// The first `n` entries in key order.
pub fn take<K, V, P>(root: &Root<K, V, P>, n: usize) -> Root<K, V, P>
where
    P: SharedPointerKind,
{
    if n == 0 {
        return None;
    }
    match root {
        None => None,
        Some(node) => {
            if n >= node.size {
                return root.clone();
            }
            let ls = size(&node.left);
            if n <= ls {
                take(&node.left, n)
            } else {
                let right = take(&node.right, n - ls - 1);
                Some(combine_different_sizes(
                    node.entry.clone(),
                    node.left.clone(),
                    right,
                ))
            }
        }
    }
}

/// Everything but the first `n` entries in key order.
pub fn drop<K, V, P>(root: &Root<K, V, P>, n: usize) -> Root<K, V, P>
where
    P: SharedPointerKind,
{
    if n == 0 {
        return root.clone();
    }
    match root {
        None => None,
        Some(node) => {
            if n >= node.size {
                return None;
            }
            let ls = size(&node.left);
            if n <= ls {
                let left = drop(&node.left, n);
                Some(combine_different_sizes(
                    node.entry.clone(),
                    left,
                    node.right.clone(),
                ))
            } else {
                drop(&node.right, n - ls - 1)
            }
        }
    }
}

/// Update or delete the entry at rank `index`. Out-of-range indices and
/// [`Change::Keep`] return the input root pointer-identical.
pub fn alter_by_index<K, V, P, F>(root: &Root<K, V, P>, index: usize, f: F) -> (Root<K, V, P>, isize)
where
    K: Clone,
    P: SharedPointerKind,
    F: FnOnce(&K, &V) -> Change<V>,
{
    match root {
        None => (None, 0),
        Some(node) => {
            if index >= node.size {
                return (root.clone(), 0);
            }
            let ls = size(&node.left);
            match index.cmp(&ls) {
                Ordering::Less => {
                    let (new_left, delta) = alter_by_index(&node.left, index, f);
                    if same_root(&new_left, &node.left) {
                        (root.clone(), 0)
                    } else {
                        let rebuilt = combine_after_insert_or_remove(
                            node.entry.clone(),
                            new_left,
                            node.right.clone(),
                        );
                        (Some(rebuilt), delta)
                    }
                }
                Ordering::Equal => match f(&node.entry.key, &node.entry.value) {
                    Change::Keep => (root.clone(), 0),
                    Change::Update(v) => {
                        let entry = SharedPointer::new(Entry::new(node.entry.key.clone(), v));
                        (Some(replace_entry(node, entry)), 0)
                    }
                    Change::Remove => (glue_size_balanced(&node.left, &node.right), -1),
                },
                Ordering::Greater => {
                    let (new_right, delta) = alter_by_index(&node.right, index - ls - 1, f);
                    if same_root(&new_right, &node.right) {
                        (root.clone(), 0)
                    } else {
                        let rebuilt = combine_after_insert_or_remove(
                            node.entry.clone(),
                            node.left.clone(),
                            new_right,
                        );
                        (Some(rebuilt), delta)
                    }
                }
            }
        }
    }
}
