// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::{SharedPointer, SharedPointerKind};

use shale_tree::{Change, Entry, EntryRef};

use crate::node::{branch, collision, new_leaf, single_entry, Node, NodeRef, Root};

/// Transform every value. Entries answered with [`Change::Keep`] keep
/// their node, and a subtree whose entries were all kept comes back
/// pointer-identical; [`Change::Remove`] drops the entry.
pub fn map_values<K, V, P, F>(root: &Root<K, V, P>, f: &mut F) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> Change<V>,
{
    collect_values(root, f).0
}

/// Transform and filter every value; see [`map_values`]. Also returns
/// how many entries were removed, so a wrapper can adjust its cached
/// size.
pub fn collect_values<K, V, P, F>(root: &Root<K, V, P>, f: &mut F) -> (Root<K, V, P>, usize)
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> Change<V>,
{
    let mut removed = 0;
    let new_root = match root {
        None => None,
        Some(node) => match collect_node(node, f, &mut removed) {
            Collected::Same => root.clone(),
            Collected::New(n) => Some(n),
            Collected::Gone => None,
        },
    };
    (new_root, removed)
}

enum Collected<K, V, P: SharedPointerKind> {
    Same,
    New(NodeRef<K, V, P>),
    Gone,
}

fn collect_node<K, V, P, F>(
    node: &NodeRef<K, V, P>,
    f: &mut F,
    removed: &mut usize,
) -> Collected<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> Change<V>,
{
    match &**node {
        Node::Leaf { hash, entry } => match f(&entry.key, &entry.value) {
            Change::Keep => Collected::Same,
            Change::Update(v) => {
                let entry = SharedPointer::new(Entry::new(entry.key.clone(), v));
                Collected::New(new_leaf(*hash, entry))
            }
            Change::Remove => {
                *removed += 1;
                Collected::Gone
            }
        },
        Node::Collision { hash, tree } => {
            let old_size = shale_tree::size(tree);
            let new_tree = shale_tree::collect_values(tree, f);
            if shale_tree::same_root(&new_tree, tree) {
                return Collected::Same;
            }
            let new_size = shale_tree::size(&new_tree);
            *removed += old_size - new_size;
            match new_size {
                0 => Collected::Gone,
                1 => Collected::New(new_leaf(*hash, single_entry(&new_tree))),
                _ => Collected::New(collision(*hash, new_tree)),
            }
        }
        Node::Branch { bitmap, children } => {
            let mut new_children = Vec::with_capacity(children.len());
            let mut new_bitmap = 0u32;
            let mut changed = false;
            let mut pos = 0;
            for i in 0..crate::bitmap::MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if bitmap & bit == 0 {
                    continue;
                }
                let child = &children[pos];
                pos += 1;
                match collect_node(child, f, removed) {
                    Collected::Same => {
                        new_children.push(child.clone());
                        new_bitmap |= bit;
                    }
                    Collected::New(c) => {
                        changed = true;
                        new_children.push(c);
                        new_bitmap |= bit;
                    }
                    Collected::Gone => changed = true,
                }
            }
            if !changed {
                return Collected::Same;
            }
            match new_children.len() {
                0 => Collected::Gone,
                1 if new_children[0].is_leaf_like() => {
                    Collected::New(new_children.pop().expect("length checked"))
                }
                _ => Collected::New(branch(new_bitmap, new_children)),
            }
        }
    }
}

/// Fold over every entry. Branch children are visited in ascending
/// slot order and collision buckets in ascending key order.
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

enum Frame<'a, K, V, P: SharedPointerKind> {
    Node(&'a Node<K, V, P>),
    Children(core::slice::Iter<'a, NodeRef<K, V, P>>),
    Bucket(shale_tree::Iter<'a, K, V, P>),
}

/// Single-use iterator over the trie.
///
/// The traversal order follows the stack: branch children by ascending
/// slot, collision buckets by ascending key. It is stable for a given
/// trie but is not a global key order.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    stack: Vec<Frame<'a, K, V, P>>,
}

impl<'a, K, V, P: SharedPointerKind> Iter<'a, K, V, P> {
    /// Iterate over `root`.
    pub fn new(root: &'a Root<K, V, P>) -> Self {
        let mut stack = Vec::new();
        if let Some(node) = root {
            stack.push(Frame::Node(node));
        }
        Iter { stack }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        loop {
            match self.stack.pop()? {
                Frame::Node(Node::Leaf { entry, .. }) => {
                    return Some((&entry.key, &entry.value));
                }
                Frame::Node(Node::Collision { tree, .. }) => {
                    self.stack.push(Frame::Bucket(shale_tree::Iter::new(tree)));
                }
                Frame::Node(Node::Branch { children, .. }) => {
                    self.stack.push(Frame::Children(children.iter()));
                }
                Frame::Children(mut iter) => {
                    if let Some(child) = iter.next() {
                        self.stack.push(Frame::Children(iter));
                        self.stack.push(Frame::Node(child));
                    }
                }
                Frame::Bucket(mut iter) => {
                    if let Some(kv) = iter.next() {
                        self.stack.push(Frame::Bucket(iter));
                        return Some(kv);
                    }
                }
            }
        }
    }
}
