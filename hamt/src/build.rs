// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Bulk construction.
//!
//! Insertion descends through `SharedPointer::make_mut`, so nodes
//! still uniquely owned by the build are rewritten in place and shared
//! nodes are copied once. The result is an ordinary persistent trie
//! the moment the builder returns it.

use core::hash::{BuildHasher, Hash};

use archery::{SharedPointer, SharedPointerKind};

use shale_tree::Entry;

use crate::bitmap::{branch_index, mask, sparse_index, BITS_PER_SUBKEY};
use crate::hash::hash_key;
use crate::node::{new_leaf, two, Node, NodeRef, Root};

/// Insert one entry in place. `merge` resolves a key clash from the
/// existing value, the incoming value and the key. Returns whether the
/// key was new.
pub fn mutate_insert<K, V, P, F>(
    root: &mut Root<K, V, P>,
    key: K,
    hash: u32,
    value: V,
    merge: &mut F,
) -> bool
where
    K: Ord,
    P: SharedPointerKind,
    F: FnMut(&V, V, &K) -> V,
{
    match root {
        None => {
            let entry = SharedPointer::new(Entry::new(key, value));
            *root = Some(new_leaf(hash, entry));
            true
        }
        Some(node) => mutate_insert_node(node, key, hash, 0, value, merge),
    }
}

fn mutate_insert_node<K, V, P, F>(
    node_ref: &mut NodeRef<K, V, P>,
    key: K,
    hash: u32,
    shift: u32,
    value: V,
    merge: &mut F,
) -> bool
where
    K: Ord,
    P: SharedPointerKind,
    F: FnMut(&V, V, &K) -> V,
{
    enum Step {
        ReplaceValue,
        StartBucket,
        SplitPrefix,
        IntoBucket,
        Descend(usize),
        NewSlot(usize, u32),
    }

    let step = match &**node_ref {
        Node::Leaf { hash: h, entry } => {
            if *h == hash {
                if entry.key == key {
                    Step::ReplaceValue
                } else {
                    Step::StartBucket
                }
            } else {
                Step::SplitPrefix
            }
        }
        Node::Collision { hash: h, .. } => {
            if *h == hash {
                Step::IntoBucket
            } else {
                Step::SplitPrefix
            }
        }
        Node::Branch { bitmap, .. } => match branch_index(*bitmap, hash, shift) {
            Some(idx) => Step::Descend(idx),
            None => {
                let bit = mask(hash, shift);
                Step::NewSlot(sparse_index(*bitmap, bit), bit)
            }
        },
    };

    match step {
        Step::ReplaceValue => {
            let node = SharedPointer::make_mut(node_ref);
            if let Node::Leaf { entry, .. } = node {
                let value = merge(&entry.value, value, &entry.key);
                *entry = SharedPointer::new(Entry::new(key, value));
            }
            false
        }
        Step::StartBucket => {
            let node = SharedPointer::make_mut(node_ref);
            if let Node::Leaf { hash: h, entry } = node {
                let h = *h;
                let incoming = SharedPointer::new(Entry::new(key, value));
                let tree = Some(shale_tree::from_two_entries(entry.clone(), incoming));
                *node = Node::Collision { hash: h, tree };
            }
            true
        }
        Step::SplitPrefix => {
            let displaced = node_ref.clone();
            let entry = SharedPointer::new(Entry::new(key, value));
            *node_ref = two(shift, new_leaf(hash, entry), displaced);
            true
        }
        Step::IntoBucket => {
            let node = SharedPointer::make_mut(node_ref);
            if let Node::Collision { tree, .. } = node {
                shale_tree::mutate_insert(tree, key, value, merge)
            } else {
                unreachable!("step chosen from a collision node")
            }
        }
        Step::Descend(idx) => {
            let node = SharedPointer::make_mut(node_ref);
            if let Node::Branch { children, .. } = node {
                mutate_insert_node(
                    &mut children[idx],
                    key,
                    hash,
                    shift + BITS_PER_SUBKEY,
                    value,
                    merge,
                )
            } else {
                unreachable!("step chosen from a branch node")
            }
        }
        Step::NewSlot(idx, bit) => {
            let node = SharedPointer::make_mut(node_ref);
            if let Node::Branch { bitmap, children } = node {
                let entry = SharedPointer::new(Entry::new(key, value));
                children.insert(idx, new_leaf(hash, entry));
                *bitmap |= bit;
            }
            true
        }
    }
}

/// Build a trie from key/value pairs; a repeated key keeps the later
/// value. Returns the root and the entry count.
pub fn from_entries<K, V, P, H, I>(hasher: &H, items: I) -> (Root<K, V, P>, usize)
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher,
    I: IntoIterator<Item = (K, V)>,
{
    from_entries_with(hasher, items, |_, incoming, _| incoming)
}

/// Build a trie from key/value pairs, resolving repeated keys through
/// `merge` (existing value, incoming value, key).
pub fn from_entries_with<K, V, P, H, I, F>(
    hasher: &H,
    items: I,
    mut merge: F,
) -> (Root<K, V, P>, usize)
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher,
    I: IntoIterator<Item = (K, V)>,
    F: FnMut(&V, V, &K) -> V,
{
    let mut root = None;
    let mut size = 0;
    for (key, value) in items {
        let hash = hash_key(&key, hasher);
        if mutate_insert(&mut root, key, hash, value, &mut merge) {
            size += 1;
        }
    }
    (root, size)
}

/// Build a trie from arbitrary items through a key extractor and a
/// value extractor; a repeated key keeps the later item's value.
pub fn build<K, V, P, H, T, I, KF, VF>(
    hasher: &H,
    items: I,
    mut key_of: KF,
    mut value_of: VF,
) -> (Root<K, V, P>, usize)
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher,
    I: IntoIterator<Item = T>,
    KF: FnMut(&T) -> K,
    VF: FnMut(T) -> V,
{
    let mut root = None;
    let mut size = 0;
    let mut merge = |_: &V, incoming: V, _: &K| incoming;
    for item in items {
        let key = key_of(&item);
        let value = value_of(item);
        let hash = hash_key(&key, hasher);
        if mutate_insert(&mut root, key, hash, value, &mut merge) {
            size += 1;
        }
    }
    (root, size)
}
