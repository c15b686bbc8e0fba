// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use core::borrow::Borrow;

use archery::{SharedPointer, SharedPointerKind};

use shale_tree::{Change, Entry, EntryRef};

use crate::bitmap::{branch_index, chunk, mask, sparse_index, BITS_PER_SUBKEY, HASH_BITS};

/// A trie node.
///
/// A `Leaf` holds one entry together with the full hash of its key.
/// A `Collision` holds every entry sharing one hash, organized as an
/// ordered tree keyed by the keys (always two or more entries). A
/// `Branch` holds its populated slots densely, indexed through the
/// bitmap.
#[derive(Debug)]
pub enum Node<K, V, P: SharedPointerKind> {
    /// A single entry.
    Leaf {
        /// Full hash of the entry's key.
        hash: u32,
        /// The entry itself.
        entry: EntryRef<K, V, P>,
    },
    /// Entries whose keys all share `hash`; the bucket is never empty
    /// and never holds exactly one entry.
    Collision {
        /// The shared hash.
        hash: u32,
        /// Key-ordered bucket of the colliding entries.
        tree: shale_tree::Root<K, V, P>,
    },
    /// Interior node.
    Branch {
        /// Which of the 32 slots hold a child.
        bitmap: u32,
        /// The children, densely packed in slot order; the length
        /// always equals the bitmap's popcount.
        children: Vec<NodeRef<K, V, P>>,
    },
}

/// Shared handle to a node.
pub type NodeRef<K, V, P> = SharedPointer<Node<K, V, P>, P>;

/// A possibly empty trie.
pub type Root<K, V, P> = Option<NodeRef<K, V, P>>;

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    /// Whether this node is a `Leaf` or a `Collision`, i.e. anything a
    /// single-child branch must collapse into.
    pub fn is_leaf_like(&self) -> bool {
        !matches!(self, Node::Branch { .. })
    }

    /// The hash carried by a `Leaf` or `Collision`.
    pub(crate) fn leaf_hash(&self) -> u32 {
        match self {
            Node::Leaf { hash, .. } | Node::Collision { hash, .. } => *hash,
            Node::Branch { .. } => panic!("leaf_hash: branch nodes carry no hash"),
        }
    }
}

impl<K, V, P: SharedPointerKind> Clone for Node<K, V, P> {
    fn clone(&self) -> Self {
        match self {
            Node::Leaf { hash, entry } => Node::Leaf { hash: *hash, entry: entry.clone() },
            Node::Collision { hash, tree } => {
                Node::Collision { hash: *hash, tree: tree.clone() }
            }
            Node::Branch { bitmap, children } => {
                Node::Branch { bitmap: *bitmap, children: children.clone() }
            }
        }
    }
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

pub(crate) fn new_leaf<K, V, P: SharedPointerKind>(
    hash: u32,
    entry: EntryRef<K, V, P>,
) -> NodeRef<K, V, P> {
    SharedPointer::new(Node::Leaf { hash, entry })
}

pub(crate) fn collision<K, V, P: SharedPointerKind>(
    hash: u32,
    tree: shale_tree::Root<K, V, P>,
) -> NodeRef<K, V, P> {
    SharedPointer::new(Node::Collision { hash, tree })
}

pub(crate) fn branch<K, V, P: SharedPointerKind>(
    bitmap: u32,
    children: Vec<NodeRef<K, V, P>>,
) -> NodeRef<K, V, P> {
    debug_assert_eq!(bitmap.count_ones() as usize, children.len());
    SharedPointer::new(Node::Branch { bitmap, children })
}

// The entry of a bucket that shrank to a single element.
pub(crate) fn single_entry<K, V, P: SharedPointerKind>(
    tree: &shale_tree::Root<K, V, P>,
) -> EntryRef<K, V, P> {
    let (entry, rest) = shale_tree::min_view(tree).expect("collision bucket cannot be empty");
    debug_assert!(rest.is_none());
    entry
}

pub(crate) fn copy_and_insert<K, V, P: SharedPointerKind>(
    children: &[NodeRef<K, V, P>],
    idx: usize,
    child: NodeRef<K, V, P>,
) -> Vec<NodeRef<K, V, P>> {
    let mut out = Vec::with_capacity(children.len() + 1);
    out.extend_from_slice(&children[..idx]);
    out.push(child);
    out.extend_from_slice(&children[idx..]);
    out
}

pub(crate) fn copy_and_replace<K, V, P: SharedPointerKind>(
    children: &[NodeRef<K, V, P>],
    idx: usize,
    child: NodeRef<K, V, P>,
) -> Vec<NodeRef<K, V, P>> {
    let mut out = children.to_vec();
    out[idx] = child;
    out
}

pub(crate) fn copy_and_remove<K, V, P: SharedPointerKind>(
    children: &[NodeRef<K, V, P>],
    idx: usize,
) -> Vec<NodeRef<K, V, P>> {
    let mut out = Vec::with_capacity(children.len() - 1);
    out.extend_from_slice(&children[..idx]);
    out.extend_from_slice(&children[idx + 1..]);
    out
}

/// Replace one child of a branch, collapsing a single-child branch
/// whose child became leaf-like.
pub(crate) fn branch_with_child<K, V, P: SharedPointerKind>(
    bitmap: u32,
    children: &[NodeRef<K, V, P>],
    idx: usize,
    child: NodeRef<K, V, P>,
) -> NodeRef<K, V, P> {
    if children.len() == 1 && child.is_leaf_like() {
        child
    } else {
        branch(bitmap, copy_and_replace(children, idx, child))
    }
}

/// Drop one child of a branch. A full branch turns sparse, a two-child
/// branch left with a lone leaf-like sibling collapses into it, and a
/// single-child branch disappears entirely.
pub(crate) fn branch_without_child<K, V, P: SharedPointerKind>(
    bitmap: u32,
    children: &[NodeRef<K, V, P>],
    idx: usize,
    bit: u32,
) -> Root<K, V, P> {
    match children.len() {
        1 => None,
        2 => {
            let sibling = children[1 - idx].clone();
            if sibling.is_leaf_like() {
                Some(sibling)
            } else {
                Some(branch(bitmap & !bit, copy_and_remove(children, idx)))
            }
        }
        _ => Some(branch(bitmap & !bit, copy_and_remove(children, idx))),
    }
}

/// Build the minimal subtrie holding two leaf-like nodes with distinct
/// hashes, descending from `shift` until their chunks part ways.
pub(crate) fn two<K, V, P: SharedPointerKind>(
    shift: u32,
    a: NodeRef<K, V, P>,
    b: NodeRef<K, V, P>,
) -> NodeRef<K, V, P> {
    let ha = a.leaf_hash();
    let hb = b.leaf_hash();
    if shift >= HASH_BITS {
        panic!("two: hash bits exhausted while separating equal prefixes");
    }
    let ca = chunk(ha, shift);
    let cb = chunk(hb, shift);
    if ca == cb {
        branch(1 << ca, vec![two(shift + BITS_PER_SUBKEY, a, b)])
    } else if ca < cb {
        branch((1 << ca) | (1 << cb), vec![a, b])
    } else {
        branch((1 << ca) | (1 << cb), vec![b, a])
    }
}

/// Look up the value stored for `key`, whose hash is `hash`.
pub fn lookup<'a, K, V, P, Q>(root: &'a Root<K, V, P>, key: &Q, hash: u32) -> Option<&'a V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    lookup_with(root.as_ref(), key, hash, 0)
}

/// [`lookup`] resumed from an interior node at depth `shift`.
pub fn lookup_with<'a, K, V, P, Q>(
    mut node: Option<&'a NodeRef<K, V, P>>,
    key: &Q,
    hash: u32,
    mut shift: u32,
) -> Option<&'a V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    while let Some(n) = node {
        match &**n {
            Node::Leaf { hash: h, entry } => {
                return if *h == hash && entry.key.borrow() == key {
                    Some(&entry.value)
                } else {
                    None
                };
            }
            Node::Collision { hash: h, tree } => {
                return if *h == hash { shale_tree::lookup(tree, key) } else { None };
            }
            Node::Branch { bitmap, children } => match branch_index(*bitmap, hash, shift) {
                Some(idx) => {
                    node = Some(&children[idx]);
                    shift += BITS_PER_SUBKEY;
                }
                None => return None,
            },
        }
    }
    None
}

pub(crate) enum Altered<K, V, P: SharedPointerKind> {
    /// Nothing changed; the caller keeps its node.
    Same,
    /// The subtree was replaced, growing by the given entry count.
    New(NodeRef<K, V, P>, isize),
    /// The subtree lost its last entry.
    Gone,
}

/// Insert, update or delete the entry for `key` in one descent. The
/// callback receives the current value, if any. Returns the new root
/// and the entry-count delta; an unchanged tree comes back
/// pointer-identical.
pub fn alter<K, V, P, F>(root: &Root<K, V, P>, key: K, hash: u32, f: F) -> (Root<K, V, P>, isize)
where
    K: Ord,
    P: SharedPointerKind,
    F: FnOnce(Option<&V>) -> Change<V>,
{
    match root {
        None => match f(None) {
            Change::Update(v) => {
                let entry = SharedPointer::new(Entry::new(key, v));
                (Some(new_leaf(hash, entry)), 1)
            }
            Change::Keep | Change::Remove => (None, 0),
        },
        Some(node) => match alter_node(node, key, hash, 0, f) {
            Altered::Same => (root.clone(), 0),
            Altered::New(n, delta) => (Some(n), delta),
            Altered::Gone => (None, -1),
        },
    }
}

/// Bind `key` to `value`. Returns the new root and whether the key was
/// new.
pub fn insert<K, V, P>(root: &Root<K, V, P>, key: K, hash: u32, value: V) -> (Root<K, V, P>, bool)
where
    K: Ord,
    P: SharedPointerKind,
{
    let (root, delta) = alter(root, key, hash, |_| Change::Update(value));
    (root, delta == 1)
}

fn alter_node<K, V, P, F>(
    node: &NodeRef<K, V, P>,
    key: K,
    hash: u32,
    shift: u32,
    f: F,
) -> Altered<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
    F: FnOnce(Option<&V>) -> Change<V>,
{
    match &**node {
        Node::Leaf { hash: h, entry } => {
            if *h == hash && entry.key == key {
                match f(Some(&entry.value)) {
                    Change::Keep => Altered::Same,
                    Change::Update(v) => {
                        let entry = SharedPointer::new(Entry::new(key, v));
                        Altered::New(new_leaf(hash, entry), 0)
                    }
                    Change::Remove => Altered::Gone,
                }
            } else if *h == hash {
                // Same hash, different key: the pair becomes a bucket.
                match f(None) {
                    Change::Update(v) => {
                        let incoming = SharedPointer::new(Entry::new(key, v));
                        let tree = Some(shale_tree::from_two_entries(entry.clone(), incoming));
                        Altered::New(collision(hash, tree), 1)
                    }
                    Change::Keep | Change::Remove => Altered::Same,
                }
            } else {
                match f(None) {
                    Change::Update(v) => {
                        let entry = SharedPointer::new(Entry::new(key, v));
                        Altered::New(two(shift, new_leaf(hash, entry), node.clone()), 1)
                    }
                    Change::Keep | Change::Remove => Altered::Same,
                }
            }
        }
        Node::Collision { hash: h, tree } => {
            if *h == hash {
                let (new_tree, delta) = shale_tree::alter(tree, key, f);
                if shale_tree::same_root(&new_tree, tree) {
                    return Altered::Same;
                }
                if shale_tree::size(&new_tree) == 1 {
                    Altered::New(new_leaf(hash, single_entry(&new_tree)), delta)
                } else {
                    Altered::New(collision(hash, new_tree), delta)
                }
            } else {
                match f(None) {
                    Change::Update(v) => {
                        let entry = SharedPointer::new(Entry::new(key, v));
                        Altered::New(two(shift, new_leaf(hash, entry), node.clone()), 1)
                    }
                    Change::Keep | Change::Remove => Altered::Same,
                }
            }
        }
        Node::Branch { bitmap, children } => match branch_index(*bitmap, hash, shift) {
            None => match f(None) {
                Change::Update(v) => {
                    let bit = mask(hash, shift);
                    let entry = SharedPointer::new(Entry::new(key, v));
                    let idx = sparse_index(*bitmap, bit);
                    let children = copy_and_insert(children, idx, new_leaf(hash, entry));
                    Altered::New(branch(bitmap | bit, children), 1)
                }
                Change::Keep | Change::Remove => Altered::Same,
            },
            Some(idx) => {
                match alter_node(&children[idx], key, hash, shift + BITS_PER_SUBKEY, f) {
                    Altered::Same => Altered::Same,
                    Altered::New(child, delta) => {
                        Altered::New(branch_with_child(*bitmap, children, idx, child), delta)
                    }
                    Altered::Gone => {
                        match branch_without_child(*bitmap, children, idx, mask(hash, shift)) {
                            Some(n) => Altered::New(n, -1),
                            None => Altered::Gone,
                        }
                    }
                }
            }
        },
    }
}

/// Delete the entry for `key`. Returns the new root and whether the key
/// was present; an absent key returns the input root pointer-identical.
pub fn remove<K, V, P, Q>(root: &Root<K, V, P>, key: &Q, hash: u32) -> (Root<K, V, P>, bool)
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    match root {
        None => (None, false),
        Some(node) => match remove_node(node, key, hash, 0) {
            Altered::Same => (root.clone(), false),
            Altered::New(n, _) => (Some(n), true),
            Altered::Gone => (None, true),
        },
    }
}

fn remove_node<K, V, P, Q>(
    node: &NodeRef<K, V, P>,
    key: &Q,
    hash: u32,
    shift: u32,
) -> Altered<K, V, P>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    match &**node {
        Node::Leaf { hash: h, entry } => {
            if *h == hash && entry.key.borrow() == key {
                Altered::Gone
            } else {
                Altered::Same
            }
        }
        Node::Collision { hash: h, tree } => {
            if *h != hash {
                return Altered::Same;
            }
            let (new_tree, removed) = shale_tree::remove(tree, key);
            if !removed {
                return Altered::Same;
            }
            if shale_tree::size(&new_tree) == 1 {
                Altered::New(new_leaf(hash, single_entry(&new_tree)), -1)
            } else {
                Altered::New(collision(hash, new_tree), -1)
            }
        }
        Node::Branch { bitmap, children } => match branch_index(*bitmap, hash, shift) {
            None => Altered::Same,
            Some(idx) => match remove_node(&children[idx], key, hash, shift + BITS_PER_SUBKEY) {
                Altered::Same => Altered::Same,
                Altered::New(child, delta) => {
                    Altered::New(branch_with_child(*bitmap, children, idx, child), delta)
                }
                Altered::Gone => {
                    match branch_without_child(*bitmap, children, idx, mask(hash, shift)) {
                        Some(n) => Altered::New(n, -1),
                        None => Altered::Gone,
                    }
                }
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archery::RcK;

    fn leaf(hash: u32, key: u32) -> NodeRef<u32, u32, RcK> {
        new_leaf(hash, SharedPointer::new(Entry::new(key, key)))
    }

    #[test]
    fn two_splits_at_the_first_differing_chunk() {
        let node = two(0, leaf(0, 0), leaf(1, 1));
        match &*node {
            Node::Branch { bitmap, children } => {
                assert_eq!(*bitmap, 0b11);
                assert_eq!(children.len(), 2);
                assert_eq!(children[0].leaf_hash(), 0);
                assert_eq!(children[1].leaf_hash(), 1);
            }
            _ => panic!("expected a branch"),
        }
    }

    #[test]
    fn two_chains_single_child_branches_over_shared_prefixes() {
        // Hashes agree on the first chunk and differ on the second.
        let node = two(0, leaf(0b00001_00001, 1), leaf(0b00010_00001, 2));
        match &*node {
            Node::Branch { bitmap, children } => {
                assert_eq!(*bitmap, 1 << 1);
                assert_eq!(children.len(), 1);
                match &*children[0] {
                    Node::Branch { bitmap, children } => {
                        assert_eq!(*bitmap, (1 << 1) | (1 << 2));
                        assert_eq!(children.len(), 2);
                    }
                    _ => panic!("expected an inner branch"),
                }
            }
            _ => panic!("expected a branch"),
        }
    }

    #[test]
    #[should_panic(expected = "hash bits exhausted")]
    fn two_rejects_equal_hashes() {
        two(0, leaf(7, 1), leaf(7, 2));
    }

    #[test]
    fn alter_builds_and_collapses_collisions() {
        let hash = 42;
        let empty: Root<u32, i32, RcK> = None;
        let (root, delta) = alter(&empty, 1u32, hash, |_| Change::Update(10));
        assert_eq!(delta, 1);
        let (root, delta) = alter(&root, 2u32, hash, |_| Change::Update(20));
        assert_eq!(delta, 1);
        assert!(matches!(root.as_deref(), Some(Node::Collision { .. })));
        assert_eq!(lookup(&root, &1, hash), Some(&10));
        assert_eq!(lookup(&root, &2, hash), Some(&20));

        let (root, removed) = remove(&root, &1, hash);
        assert!(removed);
        assert!(matches!(root.as_deref(), Some(Node::Leaf { .. })));
        assert_eq!(lookup(&root, &2, hash), Some(&20));
    }

    #[test]
    fn removing_the_last_key_through_a_chain_collapses_it() {
        let empty: Root<u32, i32, RcK> = None;
        let (root, _) = alter(&empty, 1u32, 0b00001_00001, |_| Change::Update(1));
        let (root, _) = alter(&root, 2u32, 0b00010_00001, |_| Change::Update(2));
        let (root, removed) = remove(&root, &2, 0b00010_00001);
        assert!(removed);
        // The chain above the surviving leaf is gone.
        assert!(matches!(root.as_deref(), Some(Node::Leaf { .. })));
        let (root, removed) = remove(&root, &1, 0b00001_00001);
        assert!(removed);
        assert!(root.is_none());
    }

    #[test]
    fn absent_key_removal_is_identity() {
        let empty: Root<u32, i32, RcK> = None;
        let (root, _) = alter(&empty, 1u32, 5, |_| Change::Update(1));
        let (same, removed) = remove(&root, &9, 77);
        assert!(!removed);
        assert!(same_root(&root, &same));
    }
}
