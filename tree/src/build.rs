// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Bulk construction.
//!
//! The builders insert in place: descent goes through
//! `SharedPointer::make_mut`, so nodes still uniquely owned by the
//! build are rewritten without copying and anything already shared is
//! copied once. The result only becomes visible to other owners when
//! the builder returns.

use core::cmp::Ordering;

use archery::{SharedPointer, SharedPointerKind};

use crate::balance::{mut_rebalance_after_left_growth, mut_rebalance_after_right_growth};
use crate::entry::{Entry, EntryRef};
use crate::node::{join, leaf_entry, NodeRef, Root};

/// Insert one entry in place.
///
/// `merge` resolves a key clash from the existing value, the incoming
/// value and the key. Returns whether the key was new.
pub fn mutate_insert<K, V, P, F>(root: &mut Root<K, V, P>, key: K, value: V, merge: &mut F) -> bool
where
    K: Ord,
    P: SharedPointerKind,
    F: FnMut(&V, V, &K) -> V,
{
    match root {
        None => {
            *root = Some(leaf_entry(key, value));
            true
        }
        Some(node) => mutate_insert_node(node, key, value, merge),
    }
}

fn mutate_insert_node<K, V, P, F>(
    node_ref: &mut NodeRef<K, V, P>,
    key: K,
    value: V,
    merge: &mut F,
) -> bool
where
    K: Ord,
    P: SharedPointerKind,
    F: FnMut(&V, V, &K) -> V,
{
    enum Grew {
        Left,
        Right,
        Not,
    }

    let (inserted, grew) = {
        let n = SharedPointer::make_mut(node_ref);
        match key.cmp(&n.entry.key) {
            Ordering::Equal => {
                let value = merge(&n.entry.value, value, &n.entry.key);
                n.entry = SharedPointer::new(Entry::new(key, value));
                (false, Grew::Not)
            }
            Ordering::Less => {
                let inserted = mutate_insert(&mut n.left, key, value, merge);
                if inserted {
                    n.size += 1;
                }
                (inserted, if inserted { Grew::Left } else { Grew::Not })
            }
            Ordering::Greater => {
                let inserted = mutate_insert(&mut n.right, key, value, merge);
                if inserted {
                    n.size += 1;
                }
                (inserted, if inserted { Grew::Right } else { Grew::Not })
            }
        }
    };
    match grew {
        Grew::Left => mut_rebalance_after_left_growth(node_ref),
        Grew::Right => mut_rebalance_after_right_growth(node_ref),
        Grew::Not => {}
    }
    inserted
}

/// Build a tree from key/value pairs; a repeated key keeps the later
/// value.
pub fn from_entries<K, V, P, I>(items: I) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
    I: IntoIterator<Item = (K, V)>,
{
    from_entries_with(items, |_, incoming, _| incoming)
}

/// Build a tree from key/value pairs, resolving repeated keys through
/// `merge` (existing value, incoming value, key).
pub fn from_entries_with<K, V, P, I, F>(items: I, mut merge: F) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
    I: IntoIterator<Item = (K, V)>,
    F: FnMut(&V, V, &K) -> V,
{
    let mut root = None;
    for (key, value) in items {
        mutate_insert(&mut root, key, value, &mut merge);
    }
    root
}

/// Build a tree from arbitrary items through a key extractor and a
/// value extractor; a repeated key keeps the later item's value.
pub fn build<K, V, P, T, I, KF, VF>(items: I, mut key_of: KF, mut value_of: VF) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
    I: IntoIterator<Item = T>,
    KF: FnMut(&T) -> K,
    VF: FnMut(T) -> V,
{
    let mut root = None;
    let mut merge = |_: &V, incoming: V, _: &K| incoming;
    for item in items {
        let key = key_of(&item);
        let value = value_of(item);
        mutate_insert(&mut root, key, value, &mut merge);
    }
    root
}

// Build directly from entries already in strictly ascending key order.
pub(crate) fn from_sorted_entries<K, V, P>(entries: &[EntryRef<K, V, P>]) -> Root<K, V, P>
where
    P: SharedPointerKind,
{
    if entries.is_empty() {
        return None;
    }
    let mid = entries.len() / 2;
    Some(join(
        entries[mid].clone(),
        from_sorted_entries(&entries[..mid]),
        from_sorted_entries(&entries[mid + 1..]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archery::RcK;

    #[test]
    fn builds_balanced_from_unsorted_input() {
        let root: Root<u32, u32, RcK> = from_entries((0..256).rev().map(|k| (k, k * 2)));
        assert_eq!(crate::size(&root), 256);
        crate::check(&root).unwrap();
        assert_eq!(crate::lookup(&root, &7), Some(&14));
    }

    #[test]
    fn merge_resolves_duplicates() {
        let items = vec![(1, 10), (2, 20), (1, 30)];
        let root: Root<i32, i32, RcK> =
            from_entries_with(items, |existing, incoming, _| existing + incoming);
        assert_eq!(crate::size(&root), 2);
        assert_eq!(crate::lookup(&root, &1), Some(&40));
    }

    #[test]
    fn from_sorted_entries_is_balanced() {
        let entries: Vec<EntryRef<u32, u32, RcK>> = (0..100)
            .map(|k| SharedPointer::new(Entry::new(k, k)))
            .collect();
        let root = from_sorted_entries(&entries);
        assert_eq!(crate::size(&root), 100);
        crate::check(&root).unwrap();
    }
}
