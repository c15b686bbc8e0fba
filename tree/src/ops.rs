// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use core::borrow::Borrow;
use core::cmp::Ordering;

use archery::{SharedPointer, SharedPointerKind};

use crate::balance::{
    combine_after_insert_or_remove, combine_after_left_increase, combine_after_right_increase,
    combine_different_sizes, glue_size_balanced, pop_max, pop_min,
};
use crate::change::Change;
use crate::entry::{Entry, EntryRef};
use crate::node::{leaf_entry, replace_entry, same_root, Root};

/// Look up the value stored for `key`.
pub fn lookup<'a, K, V, P, Q>(root: &'a Root<K, V, P>, key: &Q) -> Option<&'a V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    lookup_entry(root, key).map(|e| &e.value)
}

/// Look up the entry stored for `key`.
pub fn lookup_entry<'a, K, V, P, Q>(root: &'a Root<K, V, P>, key: &Q) -> Option<&'a EntryRef<K, V, P>>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    let mut node = root.as_ref();
    while let Some(n) = node {
        match key.cmp(n.entry.key.borrow()) {
            Ordering::Less => node = n.left.as_ref(),
            Ordering::Greater => node = n.right.as_ref(),
            Ordering::Equal => return Some(&n.entry),
        }
    }
    None
}

/// Insert, update or delete the entry for `key` in one descent.
///
/// The callback receives the current value, if any. Returns the new
/// root and the change in entry count. When the callback answers
/// [`Change::Keep`], or deletes an absent key, the input root is
/// returned pointer-identical.
pub fn alter<K, V, P, F>(root: &Root<K, V, P>, key: K, f: F) -> (Root<K, V, P>, isize)
where
    K: Ord,
    P: SharedPointerKind,
    F: FnOnce(Option<&V>) -> Change<V>,
{
    match root {
        None => match f(None) {
            Change::Update(value) => (Some(leaf_entry(key, value)), 1),
            Change::Keep | Change::Remove => (None, 0),
        },
        Some(n) => match key.cmp(&n.entry.key) {
            Ordering::Less => {
                let (new_left, delta) = alter(&n.left, key, f);
                if same_root(&new_left, &n.left) {
                    (root.clone(), 0)
                } else {
                    let rebuilt =
                        combine_after_insert_or_remove(n.entry.clone(), new_left, n.right.clone());
                    (Some(rebuilt), delta)
                }
            }
            Ordering::Greater => {
                let (new_right, delta) = alter(&n.right, key, f);
                if same_root(&new_right, &n.right) {
                    (root.clone(), 0)
                } else {
                    let rebuilt =
                        combine_after_insert_or_remove(n.entry.clone(), n.left.clone(), new_right);
                    (Some(rebuilt), delta)
                }
            }
            Ordering::Equal => match f(Some(&n.entry.value)) {
                Change::Keep => (root.clone(), 0),
                Change::Update(value) => {
                    let entry = SharedPointer::new(Entry::new(key, value));
                    (Some(replace_entry(n, entry)), 0)
                }
                Change::Remove => (glue_size_balanced(&n.left, &n.right), -1),
            },
        },
    }
}

/// Bind `key` to `value`. Returns the new root and whether the key was
/// new.
pub fn insert<K, V, P>(root: &Root<K, V, P>, key: K, value: V) -> (Root<K, V, P>, bool)
where
    K: Ord,
    P: SharedPointerKind,
{
    let (root, delta) = alter(root, key, |_| Change::Update(value));
    (root, delta == 1)
}

/// Delete the entry for `key`. Returns the new root and whether the key
/// was present; an absent key returns the input root pointer-identical.
pub fn remove<K, V, P, Q>(root: &Root<K, V, P>, key: &Q) -> (Root<K, V, P>, bool)
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    match root {
        None => (None, false),
        Some(n) => match key.cmp(n.entry.key.borrow()) {
            Ordering::Less => {
                let (new_left, removed) = remove(&n.left, key);
                if !removed {
                    (root.clone(), false)
                } else {
                    let rebuilt =
                        combine_after_right_increase(n.entry.clone(), new_left, n.right.clone());
                    (Some(rebuilt), true)
                }
            }
            Ordering::Greater => {
                let (new_right, removed) = remove(&n.right, key);
                if !removed {
                    (root.clone(), false)
                } else {
                    let rebuilt =
                        combine_after_left_increase(n.entry.clone(), n.left.clone(), new_right);
                    (Some(rebuilt), true)
                }
            }
            Ordering::Equal => (glue_size_balanced(&n.left, &n.right), true),
        },
    }
}

/// Smallest entry of the tree.
pub fn lookup_min<K, V, P: SharedPointerKind>(root: &Root<K, V, P>) -> Option<(&K, &V)> {
    let mut node = root.as_ref()?;
    while let Some(l) = node.left.as_ref() {
        node = l;
    }
    Some((&node.entry.key, &node.entry.value))
}

/// Largest entry of the tree.
pub fn lookup_max<K, V, P: SharedPointerKind>(root: &Root<K, V, P>) -> Option<(&K, &V)> {
    let mut node = root.as_ref()?;
    while let Some(r) = node.right.as_ref() {
        node = r;
    }
    Some((&node.entry.key, &node.entry.value))
}

/// Detach the smallest entry, returning it and the remaining tree.
pub fn min_view<K, V, P: SharedPointerKind>(
    root: &Root<K, V, P>,
) -> Option<(EntryRef<K, V, P>, Root<K, V, P>)> {
    root.as_ref().map(|n| pop_min(n))
}

/// Detach the largest entry, returning it and the remaining tree.
pub fn max_view<K, V, P: SharedPointerKind>(
    root: &Root<K, V, P>,
) -> Option<(EntryRef<K, V, P>, Root<K, V, P>)> {
    root.as_ref().map(|n| pop_max(n))
}

/// Partition the tree around `key` into the entries below it, the
/// matching entry if present, and the entries above it. Both sides come
/// back balanced.
pub fn split<K, V, P, Q>(
    root: &Root<K, V, P>,
    key: &Q,
) -> (Root<K, V, P>, Option<EntryRef<K, V, P>>, Root<K, V, P>)
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    match root {
        None => (None, None, None),
        Some(n) => match key.cmp(n.entry.key.borrow()) {
            Ordering::Less => {
                let (below, matched, above) = split(&n.left, key);
                let above =
                    combine_different_sizes(n.entry.clone(), above, n.right.clone());
                (below, matched, Some(above))
            }
            Ordering::Greater => {
                let (below, matched, above) = split(&n.right, key);
                let below =
                    combine_different_sizes(n.entry.clone(), n.left.clone(), below);
                (Some(below), matched, above)
            }
            Ordering::Equal => (n.left.clone(), Some(n.entry.clone()), n.right.clone()),
        },
    }
}
