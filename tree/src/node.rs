// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::{SharedPointer, SharedPointerKind};

use crate::entry::{Entry, EntryRef};

/// A tree node: one entry plus the sizes-and-children bookkeeping.
///
/// Invariants (checked by [`crate::check`]):
/// * every key in `left` is strictly smaller, every key in `right`
///   strictly greater than `entry.key`;
/// * `size == 1 + size(left) + size(right)`;
/// * sibling subtree sizes differ by at most a factor of three
///   whenever they hold more than one node between them.
#[derive(Debug)]
pub struct Node<K, V, P: SharedPointerKind> {
    pub(crate) entry: EntryRef<K, V, P>,
    pub(crate) size: usize,
    pub(crate) left: Root<K, V, P>,
    pub(crate) right: Root<K, V, P>,
}

/// Shared handle to a node.
pub type NodeRef<K, V, P> = SharedPointer<Node<K, V, P>, P>;

/// A possibly empty tree.
pub type Root<K, V, P> = Option<NodeRef<K, V, P>>;

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    pub(crate) fn new(entry: EntryRef<K, V, P>, left: Root<K, V, P>, right: Root<K, V, P>) -> Self {
        let size = 1 + size(&left) + size(&right);
        Node { entry, size, left, right }
    }

    /// The entry stored at this node.
    pub fn entry(&self) -> &EntryRef<K, V, P> {
        &self.entry
    }

    /// The key stored at this node.
    pub fn key(&self) -> &K {
        &self.entry.key
    }

    /// The value stored at this node.
    pub fn value(&self) -> &V {
        &self.entry.value
    }

    /// Total number of entries in the subtree rooted here.
    pub fn size(&self) -> usize {
        self.size
    }
}

// Not derived: a derived impl would demand `K: Clone + V: Clone`, while
// cloning a node only ever copies pointers.
impl<K, V, P: SharedPointerKind> Clone for Node<K, V, P> {
    fn clone(&self) -> Self {
        Node {
            entry: self.entry.clone(),
            size: self.size,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

/// Number of entries in a possibly empty tree.
pub fn size<K, V, P: SharedPointerKind>(root: &Root<K, V, P>) -> usize {
    root.as_ref().map_or(0, |n| n.size)
}

/// Pointer identity of two roots. Empty roots are identical.
pub fn same_root<K, V, P: SharedPointerKind>(a: &Root<K, V, P>, b: &Root<K, V, P>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => same_node(x, y),
        _ => false,
    }
}

pub(crate) fn same_node<K, V, P: SharedPointerKind>(
    a: &NodeRef<K, V, P>,
    b: &NodeRef<K, V, P>,
) -> bool {
    core::ptr::eq::<Node<K, V, P>>(&**a, &**b)
}

pub(crate) fn join<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    SharedPointer::new(Node::new(entry, left, right))
}

pub(crate) fn leaf<K, V, P: SharedPointerKind>(entry: EntryRef<K, V, P>) -> NodeRef<K, V, P> {
    join(entry, None, None)
}

pub(crate) fn leaf_entry<K, V, P: SharedPointerKind>(key: K, value: V) -> NodeRef<K, V, P> {
    leaf(SharedPointer::new(Entry::new(key, value)))
}

/// Replace the entry of a node, keeping its children and size.
pub(crate) fn replace_entry<K, V, P: SharedPointerKind>(
    node: &Node<K, V, P>,
    entry: EntryRef<K, V, P>,
) -> NodeRef<K, V, P> {
    SharedPointer::new(Node {
        entry,
        size: node.size,
        left: node.left.clone(),
        right: node.right.clone(),
    })
}

/// Build a one-entry tree around an existing entry.
pub fn from_entry<K, V, P: SharedPointerKind>(entry: EntryRef<K, V, P>) -> NodeRef<K, V, P> {
    leaf(entry)
}

/// Build a two-entry tree from entries with distinct keys.
///
/// This is how the HAMT turns a pair of colliding leaves into an
/// ordered collision bucket.
pub fn from_two_entries<K: Ord, V, P: SharedPointerKind>(
    a: EntryRef<K, V, P>,
    b: EntryRef<K, V, P>,
) -> NodeRef<K, V, P> {
    use core::cmp::Ordering;

    match a.key.cmp(&b.key) {
        Ordering::Less => join(a, None, Some(leaf(b))),
        Ordering::Greater => join(b, None, Some(leaf(a))),
        Ordering::Equal => panic!("from_two_entries: keys must be distinct"),
    }
}
