// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::{SharedPointer, SharedPointerKind};

use crate::balance::{combine_different_sizes, glue_different_sizes};
use crate::change::Change;
use crate::entry::Entry;
use crate::node::{same_root, size, Node, NodeRef, Root};

/// Transform every value in key order.
///
/// Entries answered with [`Change::Keep`] are reused, and a subtree
/// whose entries were all kept comes back pointer-identical. Answering
/// [`Change::Remove`] drops the entry.
pub fn map_values<K, V, P, F>(root: &Root<K, V, P>, f: &mut F) -> Root<K, V, P>
where
    K: Clone,
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> Change<V>,
{
    collect_values(root, f)
}

/// Transform and filter every value in key order; see [`map_values`].
pub fn collect_values<K, V, P, F>(root: &Root<K, V, P>, f: &mut F) -> Root<K, V, P>
where
    K: Clone,
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> Change<V>,
{
    match root {
        None => None,
        Some(n) => {
            let new_left = collect_values(&n.left, f);
            let change = f(&n.entry.key, &n.entry.value);
            let new_right = collect_values(&n.right, f);
            match change {
                Change::Keep => {
                    if same_root(&new_left, &n.left) && same_root(&new_right, &n.right) {
                        root.clone()
                    } else {
                        Some(combine_different_sizes(n.entry.clone(), new_left, new_right))
                    }
                }
                Change::Update(v) => {
                    let entry = SharedPointer::new(Entry::new(n.entry.key.clone(), v));
                    Some(combine_different_sizes(entry, new_left, new_right))
                }
                Change::Remove => glue_different_sizes(&new_left, &new_right),
            }
        }
    }
}

/// Fold over the entries in ascending key order.
pub fn fold<K, V, P, B, F>(root: &Root<K, V, P>, init: B, mut f: F) -> B
where
    P: SharedPointerKind,
    F: FnMut(B, &K, &V) -> B,
{
    let mut acc = init;
    for (k, v) in Iter::new(root) {
        acc = f(acc, k, v);
    }
    acc
}

/// Ascending in-order iterator.
///
/// Keeps the left spine of the not-yet-visited part on an explicit
/// stack; depth is bounded by the tree height.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    stack: Vec<&'a Node<K, V, P>>,
    remaining: usize,
}

impl<'a, K, V, P: SharedPointerKind> Iter<'a, K, V, P> {
    /// Iterate over `root` in ascending key order.
    pub fn new(root: &'a Root<K, V, P>) -> Self {
        let mut iter = Iter { stack: Vec::new(), remaining: size(root) };
        iter.push_left_spine(root.as_ref());
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a NodeRef<K, V, P>>) {
        while let Some(n) = node {
            let n: &'a Node<K, V, P> = n;
            self.stack.push(n);
            node = n.left.as_ref();
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_ref());
        self.remaining -= 1;
        Some((&node.entry.key, &node.entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}
