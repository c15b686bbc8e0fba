// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Bulk set-algebraic operations.
//!
//! Each operation recurses over the two operands' node pairs. A hash
//! match is the precondition for merging two leaf-like nodes;
//! mismatching hashes mean the operands occupy disjoint subtries, so a
//! union keeps both under a fresh prefix and an intersection keeps
//! neither. Branch pairs walk their combined bitmaps with two running
//! child indices. Alongside the new root, every operation threads the
//! entry count it matched or removed, so a wrapper can update its
//! cached size without recounting; and whenever a result is equal to
//! the left operand, the left operand's node is returned by reference.

use archery::{SharedPointer, SharedPointerKind};

use shale_tree::{Change, Entry, Merged};

use crate::bitmap::{branch_index, mask, sparse_index, BITS_PER_SUBKEY, MAX_CHILDREN};
use crate::node::{
    branch, branch_with_child, branch_without_child, collision, copy_and_insert, new_leaf,
    same_node, single_entry, two, Node, NodeRef, Root,
};

/// Merge two tries; `merge` resolves keys present in both, receiving
/// the left value, the right value and the key. Returns the new root
/// and how many keys the operands had in common, so the result size is
/// `size_a + size_b - matched`.
pub fn union<K, V, P, F>(
    a: &Root<K, V, P>,
    b: &Root<K, V, P>,
    merge: &mut F,
) -> (Root<K, V, P>, usize)
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (a, b) {
        (None, _) => (b.clone(), 0),
        (_, None) => (a.clone(), 0),
        (Some(an), Some(bn)) => {
            let mut matched = 0;
            let node = union_node(0, an, bn, merge, &mut matched);
            (Some(node), matched)
        }
    }
}

fn union_node<K, V, P, F>(
    shift: u32,
    a: &NodeRef<K, V, P>,
    b: &NodeRef<K, V, P>,
    merge: &mut F,
    matched: &mut usize,
) -> NodeRef<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (&**a, &**b) {
        (
            Node::Branch { bitmap: ba, children: ca },
            Node::Branch { bitmap: bb, children: cb },
        ) => {
            let combined = ba | bb;
            let mut children = Vec::with_capacity(combined.count_ones() as usize);
            let mut ia = 0;
            let mut ib = 0;
            let mut all_left = combined == *ba;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if combined & bit == 0 {
                    continue;
                }
                let child = match (ba & bit != 0, bb & bit != 0) {
                    (true, true) => {
                        let c = union_node(shift + BITS_PER_SUBKEY, &ca[ia], &cb[ib], merge, matched);
                        if !same_node(&c, &ca[ia]) {
                            all_left = false;
                        }
                        ia += 1;
                        ib += 1;
                        c
                    }
                    (true, false) => {
                        let c = ca[ia].clone();
                        ia += 1;
                        c
                    }
                    (false, true) => {
                        let c = cb[ib].clone();
                        ib += 1;
                        c
                    }
                    (false, false) => unreachable!("bit outside the combined bitmap"),
                };
                children.push(child);
            }
            if all_left {
                a.clone()
            } else {
                branch(combined, children)
            }
        }
        (Node::Branch { bitmap, children }, _) => {
            // The right operand is leaf-like: place it within the branch.
            let hash = b.leaf_hash();
            match branch_index(*bitmap, hash, shift) {
                Some(idx) => {
                    let child =
                        union_node(shift + BITS_PER_SUBKEY, &children[idx], b, merge, matched);
                    if same_node(&child, &children[idx]) {
                        a.clone()
                    } else {
                        branch_with_child(*bitmap, children, idx, child)
                    }
                }
                None => {
                    let bit = mask(hash, shift);
                    let idx = sparse_index(*bitmap, bit);
                    branch(bitmap | bit, copy_and_insert(children, idx, b.clone()))
                }
            }
        }
        (_, Node::Branch { bitmap, children }) => {
            let hash = a.leaf_hash();
            match branch_index(*bitmap, hash, shift) {
                Some(idx) => {
                    let child =
                        union_node(shift + BITS_PER_SUBKEY, a, &children[idx], merge, matched);
                    if same_node(&child, &children[idx]) {
                        b.clone()
                    } else {
                        branch_with_child(*bitmap, children, idx, child)
                    }
                }
                None => {
                    let bit = mask(hash, shift);
                    let idx = sparse_index(*bitmap, bit);
                    branch(bitmap | bit, copy_and_insert(children, idx, a.clone()))
                }
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha != hb {
                return two(shift, a.clone(), b.clone());
            }
            if ea.key == eb.key {
                *matched += 1;
                match merge(&ea.value, &eb.value, &ea.key) {
                    Merged::Left => a.clone(),
                    Merged::Right => b.clone(),
                    Merged::New(v) => {
                        let entry = SharedPointer::new(Entry::new(ea.key.clone(), v));
                        new_leaf(*ha, entry)
                    }
                }
            } else {
                let tree = Some(shale_tree::from_two_entries(ea.clone(), eb.clone()));
                collision(*ha, tree)
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Collision { hash: hb, tree: tb }) => {
            if ha != hb {
                return two(shift, a.clone(), b.clone());
            }
            let single = Some(shale_tree::from_entry(ea.clone()));
            let merged = shale_tree::union(&single, tb, merge);
            *matched += 1 + shale_tree::size(tb) - shale_tree::size(&merged);
            collision(*ha, merged)
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha != hb {
                return two(shift, a.clone(), b.clone());
            }
            let single = Some(shale_tree::from_entry(eb.clone()));
            let merged = shale_tree::union(ta, &single, merge);
            *matched += shale_tree::size(ta) + 1 - shale_tree::size(&merged);
            if shale_tree::same_root(&merged, ta) {
                a.clone()
            } else {
                collision(*ha, merged)
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Collision { hash: hb, tree: tb }) => {
            if ha != hb {
                return two(shift, a.clone(), b.clone());
            }
            let merged = shale_tree::union(ta, tb, merge);
            *matched += shale_tree::size(ta) + shale_tree::size(tb) - shale_tree::size(&merged);
            if shale_tree::same_root(&merged, ta) {
                a.clone()
            } else {
                collision(*ha, merged)
            }
        }
    }
}

/// Keep only the keys present in both tries, resolving each through
/// `merge` as in [`union`]. The returned count is the result's size.
pub fn intersection<K, V, P, F>(
    a: &Root<K, V, P>,
    b: &Root<K, V, P>,
    merge: &mut F,
) -> (Root<K, V, P>, usize)
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (a, b) {
        (None, _) | (_, None) => (None, 0),
        (Some(an), Some(bn)) => {
            let mut matched = 0;
            let node = intersection_node(0, an, bn, merge, &mut matched);
            (node, matched)
        }
    }
}

fn intersection_node<K, V, P, F>(
    shift: u32,
    a: &NodeRef<K, V, P>,
    b: &NodeRef<K, V, P>,
    merge: &mut F,
    matched: &mut usize,
) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (&**a, &**b) {
        (
            Node::Branch { bitmap: ba, children: ca },
            Node::Branch { bitmap: bb, children: cb },
        ) => {
            let common = ba & bb;
            if common == 0 {
                return None;
            }
            let mut children = Vec::with_capacity(common.count_ones() as usize);
            let mut new_bitmap = 0u32;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if common & bit == 0 {
                    continue;
                }
                let ia = sparse_index(*ba, bit);
                let ib = sparse_index(*bb, bit);
                if let Some(c) =
                    intersection_node(shift + BITS_PER_SUBKEY, &ca[ia], &cb[ib], merge, matched)
                {
                    new_bitmap |= bit;
                    children.push(c);
                }
            }
            match children.len() {
                0 => None,
                1 if children[0].is_leaf_like() => Some(children.pop().expect("length checked")),
                _ => {
                    if new_bitmap == *ba
                        && children.iter().zip(ca.iter()).all(|(x, y)| same_node(x, y))
                    {
                        Some(a.clone())
                    } else {
                        Some(branch(new_bitmap, children))
                    }
                }
            }
        }
        (Node::Branch { bitmap, children }, _) => {
            match branch_index(*bitmap, b.leaf_hash(), shift) {
                Some(idx) => {
                    intersection_node(shift + BITS_PER_SUBKEY, &children[idx], b, merge, matched)
                }
                None => None,
            }
        }
        (_, Node::Branch { bitmap, children }) => {
            match branch_index(*bitmap, a.leaf_hash(), shift) {
                Some(idx) => {
                    intersection_node(shift + BITS_PER_SUBKEY, a, &children[idx], merge, matched)
                }
                None => None,
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha == hb && ea.key == eb.key {
                *matched += 1;
                match merge(&ea.value, &eb.value, &ea.key) {
                    Merged::Left => Some(a.clone()),
                    Merged::Right => Some(b.clone()),
                    Merged::New(v) => {
                        let entry = SharedPointer::new(Entry::new(ea.key.clone(), v));
                        Some(new_leaf(*ha, entry))
                    }
                }
            } else {
                None
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Collision { hash: hb, tree: tb }) => {
            if ha != hb {
                return None;
            }
            match shale_tree::lookup_entry(tb, &ea.key) {
                Some(be) => {
                    *matched += 1;
                    match merge(&ea.value, &be.value, &ea.key) {
                        Merged::Left => Some(a.clone()),
                        Merged::Right => Some(new_leaf(*ha, be.clone())),
                        Merged::New(v) => {
                            let entry = SharedPointer::new(Entry::new(ea.key.clone(), v));
                            Some(new_leaf(*ha, entry))
                        }
                    }
                }
                None => None,
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha != hb {
                return None;
            }
            match shale_tree::lookup_entry(ta, &eb.key) {
                Some(ae) => {
                    *matched += 1;
                    match merge(&ae.value, &eb.value, &eb.key) {
                        Merged::Left => Some(new_leaf(*ha, ae.clone())),
                        Merged::Right => Some(b.clone()),
                        Merged::New(v) => {
                            let entry = SharedPointer::new(Entry::new(eb.key.clone(), v));
                            Some(new_leaf(*ha, entry))
                        }
                    }
                }
                None => None,
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Collision { hash: hb, tree: tb }) => {
            if ha != hb {
                return None;
            }
            let t = shale_tree::intersection(ta, tb, merge);
            let s = shale_tree::size(&t);
            *matched += s;
            match s {
                0 => None,
                1 => Some(new_leaf(*ha, single_entry(&t))),
                _ => {
                    if shale_tree::same_root(&t, ta) {
                        Some(a.clone())
                    } else {
                        Some(collision(*ha, t))
                    }
                }
            }
        }
    }
}

/// Remove from `a` every key present in `b`; the right operand's
/// values are never read and may have another type. Returns the new
/// root and how many entries were removed.
pub fn difference<K, V, W, P>(a: &Root<K, V, P>, b: &Root<K, W, P>) -> (Root<K, V, P>, usize)
where
    K: Ord,
    P: SharedPointerKind,
{
    match (a, b) {
        (None, _) => (None, 0),
        (_, None) => (a.clone(), 0),
        (Some(an), Some(bn)) => {
            let mut removed = 0;
            let node = difference_node(0, an, bn, &mut removed);
            (node, removed)
        }
    }
}

fn difference_node<K, V, W, P>(
    shift: u32,
    a: &NodeRef<K, V, P>,
    b: &NodeRef<K, W, P>,
    removed: &mut usize,
) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
{
    match (&**a, &**b) {
        (
            Node::Branch { bitmap: ba, children: ca },
            Node::Branch { bitmap: bb, children: cb },
        ) => {
            let mut children = Vec::with_capacity(ca.len());
            let mut new_bitmap = 0u32;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if ba & bit == 0 {
                    continue;
                }
                let ia = sparse_index(*ba, bit);
                if bb & bit == 0 {
                    new_bitmap |= bit;
                    children.push(ca[ia].clone());
                    continue;
                }
                let ib = sparse_index(*bb, bit);
                if let Some(c) = difference_node(shift + BITS_PER_SUBKEY, &ca[ia], &cb[ib], removed)
                {
                    new_bitmap |= bit;
                    children.push(c);
                }
            }
            match children.len() {
                0 => None,
                1 if children[0].is_leaf_like() => Some(children.pop().expect("length checked")),
                _ => {
                    if new_bitmap == *ba
                        && children.iter().zip(ca.iter()).all(|(x, y)| same_node(x, y))
                    {
                        Some(a.clone())
                    } else {
                        Some(branch(new_bitmap, children))
                    }
                }
            }
        }
        (Node::Branch { bitmap, children }, _) => {
            let hash = b.leaf_hash();
            match branch_index(*bitmap, hash, shift) {
                Some(idx) => {
                    match difference_node(shift + BITS_PER_SUBKEY, &children[idx], b, removed) {
                        Some(c) if same_node(&c, &children[idx]) => Some(a.clone()),
                        Some(c) => Some(branch_with_child(*bitmap, children, idx, c)),
                        None => branch_without_child(*bitmap, children, idx, mask(hash, shift)),
                    }
                }
                None => Some(a.clone()),
            }
        }
        (_, Node::Branch { bitmap, children }) => {
            match branch_index(*bitmap, a.leaf_hash(), shift) {
                Some(idx) => difference_node(shift + BITS_PER_SUBKEY, a, &children[idx], removed),
                None => Some(a.clone()),
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha == hb && ea.key == eb.key {
                *removed += 1;
                None
            } else {
                Some(a.clone())
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Collision { hash: hb, tree: tb }) => {
            if ha == hb && shale_tree::lookup(tb, &ea.key).is_some() {
                *removed += 1;
                None
            } else {
                Some(a.clone())
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha != hb {
                return Some(a.clone());
            }
            let (t, was_present) = shale_tree::remove(ta, &eb.key);
            if !was_present {
                return Some(a.clone());
            }
            *removed += 1;
            if shale_tree::size(&t) == 1 {
                Some(new_leaf(*ha, single_entry(&t)))
            } else {
                Some(collision(*ha, t))
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Collision { hash: hb, tree: tb }) => {
            if ha != hb {
                return Some(a.clone());
            }
            let t = shale_tree::difference(ta, tb);
            if shale_tree::same_root(&t, ta) {
                return Some(a.clone());
            }
            let s = shale_tree::size(&t);
            *removed += shale_tree::size(ta) - s;
            match s {
                0 => None,
                1 => Some(new_leaf(*ha, single_entry(&t))),
                _ => Some(collision(*ha, t)),
            }
        }
    }
}

/// Apply `b` as an adjustment plan: for every key of `b`, the callback
/// decides the fate of the matching entry of `a`, receiving the current
/// value (if any), the plan value and the key. Keys only in `a` are
/// untouched. The returned count is the net number of entries removed
/// and goes negative when the plan inserts, so the result size is
/// always `size_a - count`.
pub fn adjust<K, V, W, P, F>(
    a: &Root<K, V, P>,
    b: &Root<K, W, P>,
    f: &mut F,
) -> (Root<K, V, P>, isize)
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    match (a, b) {
        (_, None) => (a.clone(), 0),
        (None, Some(bn)) => {
            let mut removed = 0;
            let node = plan_node(bn, f, &mut removed);
            (node, removed)
        }
        (Some(an), Some(bn)) => {
            let mut removed = 0;
            let node = adjust_node(0, an, bn, f, &mut removed);
            (node, removed)
        }
    }
}

// Materialize the additions a plan subtree makes against nothing: keys
// the callback answers with an update reuse the plan's placement, the
// rest vanish.
fn plan_node<K, V, W, P, F>(
    b: &NodeRef<K, W, P>,
    f: &mut F,
    removed: &mut isize,
) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    match &**b {
        Node::Leaf { hash, entry } => match f(None, &entry.value, &entry.key) {
            Change::Update(v) => {
                *removed -= 1;
                let entry = SharedPointer::new(Entry::new(entry.key.clone(), v));
                Some(new_leaf(*hash, entry))
            }
            Change::Keep | Change::Remove => None,
        },
        Node::Collision { hash, tree } => {
            let t = shale_tree::adjust(&None, tree, f);
            let s = shale_tree::size(&t);
            *removed -= s as isize;
            match s {
                0 => None,
                1 => Some(new_leaf(*hash, single_entry(&t))),
                _ => Some(collision(*hash, t)),
            }
        }
        Node::Branch { bitmap, children } => {
            let mut new_children = Vec::with_capacity(children.len());
            let mut new_bitmap = 0u32;
            let mut pos = 0;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if bitmap & bit == 0 {
                    continue;
                }
                let child = &children[pos];
                pos += 1;
                if let Some(c) = plan_node(child, f, removed) {
                    new_bitmap |= bit;
                    new_children.push(c);
                }
            }
            match new_children.len() {
                0 => None,
                1 if new_children[0].is_leaf_like() => {
                    Some(new_children.pop().expect("length checked"))
                }
                _ => Some(branch(new_bitmap, new_children)),
            }
        }
    }
}

fn adjust_node<K, V, W, P, F>(
    shift: u32,
    a: &NodeRef<K, V, P>,
    b: &NodeRef<K, W, P>,
    f: &mut F,
    removed: &mut isize,
) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    match (&**a, &**b) {
        (
            Node::Branch { bitmap: ba, children: ca },
            Node::Branch { bitmap: bb, children: cb },
        ) => {
            let combined = ba | bb;
            let mut children = Vec::with_capacity(combined.count_ones() as usize);
            let mut new_bitmap = 0u32;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if combined & bit == 0 {
                    continue;
                }
                let child = match (ba & bit != 0, bb & bit != 0) {
                    (true, true) => adjust_node(
                        shift + BITS_PER_SUBKEY,
                        &ca[sparse_index(*ba, bit)],
                        &cb[sparse_index(*bb, bit)],
                        f,
                        removed,
                    ),
                    (true, false) => Some(ca[sparse_index(*ba, bit)].clone()),
                    (false, true) => plan_node(&cb[sparse_index(*bb, bit)], f, removed),
                    (false, false) => unreachable!("bit outside the combined bitmap"),
                };
                if let Some(c) = child {
                    new_bitmap |= bit;
                    children.push(c);
                }
            }
            match children.len() {
                0 => None,
                1 if children[0].is_leaf_like() => Some(children.pop().expect("length checked")),
                _ => {
                    if new_bitmap == *ba
                        && children.iter().zip(ca.iter()).all(|(x, y)| same_node(x, y))
                    {
                        Some(a.clone())
                    } else {
                        Some(branch(new_bitmap, children))
                    }
                }
            }
        }
        (Node::Branch { bitmap, children }, _) => {
            let hash = b.leaf_hash();
            match branch_index(*bitmap, hash, shift) {
                Some(idx) => {
                    match adjust_node(shift + BITS_PER_SUBKEY, &children[idx], b, f, removed) {
                        Some(c) if same_node(&c, &children[idx]) => Some(a.clone()),
                        Some(c) => Some(branch_with_child(*bitmap, children, idx, c)),
                        None => branch_without_child(*bitmap, children, idx, mask(hash, shift)),
                    }
                }
                None => match plan_node(b, f, removed) {
                    Some(c) => {
                        let bit = mask(hash, shift);
                        let idx = sparse_index(*bitmap, bit);
                        Some(branch(bitmap | bit, copy_and_insert(children, idx, c)))
                    }
                    None => Some(a.clone()),
                },
            }
        }
        (_, Node::Branch { bitmap, children }) => {
            // The trie holds a single leaf-like node where the plan
            // spans a whole branch: adjust it in place and graft the
            // plan's other additions around it.
            let a_hash = a.leaf_hash();
            let a_bit = mask(a_hash, shift);
            let combined = bitmap | a_bit;
            let mut new_children = Vec::with_capacity(children.len() + 1);
            let mut new_bitmap = 0u32;
            for i in 0..MAX_CHILDREN as u32 {
                let bit = 1u32 << i;
                if combined & bit == 0 {
                    continue;
                }
                let child = if bit == a_bit {
                    match branch_index(*bitmap, a_hash, shift) {
                        Some(idx) => {
                            adjust_node(shift + BITS_PER_SUBKEY, a, &children[idx], f, removed)
                        }
                        None => Some(a.clone()),
                    }
                } else {
                    plan_node(&children[sparse_index(*bitmap, bit)], f, removed)
                };
                if let Some(c) = child {
                    new_bitmap |= bit;
                    new_children.push(c);
                }
            }
            match new_children.len() {
                0 => None,
                1 if new_children[0].is_leaf_like() => {
                    Some(new_children.pop().expect("length checked"))
                }
                _ => Some(branch(new_bitmap, new_children)),
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha == hb && ea.key == eb.key {
                match f(Some(&ea.value), &eb.value, &ea.key) {
                    Change::Keep => Some(a.clone()),
                    Change::Update(v) => {
                        let entry = SharedPointer::new(Entry::new(ea.key.clone(), v));
                        Some(new_leaf(*ha, entry))
                    }
                    Change::Remove => {
                        *removed += 1;
                        None
                    }
                }
            } else {
                match f(None, &eb.value, &eb.key) {
                    Change::Update(v) => {
                        *removed -= 1;
                        let entry = SharedPointer::new(Entry::new(eb.key.clone(), v));
                        if ha == hb {
                            let tree =
                                Some(shale_tree::from_two_entries(ea.clone(), entry));
                            Some(collision(*ha, tree))
                        } else {
                            Some(two(shift, a.clone(), new_leaf(*hb, entry)))
                        }
                    }
                    Change::Keep | Change::Remove => Some(a.clone()),
                }
            }
        }
        (Node::Leaf { hash: ha, entry: ea }, Node::Collision { hash: hb, tree: tb }) => {
            if ha == hb {
                let single = Some(shale_tree::from_entry(ea.clone()));
                let t = shale_tree::adjust(&single, tb, f);
                if shale_tree::same_root(&t, &single) {
                    return Some(a.clone());
                }
                let s = shale_tree::size(&t);
                *removed += 1 - s as isize;
                match s {
                    0 => None,
                    1 => Some(new_leaf(*ha, single_entry(&t))),
                    _ => Some(collision(*ha, t)),
                }
            } else {
                match plan_node(b, f, removed) {
                    Some(addition) => Some(two(shift, a.clone(), addition)),
                    None => Some(a.clone()),
                }
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Leaf { hash: hb, entry: eb }) => {
            if ha == hb {
                let single = Some(shale_tree::from_entry(eb.clone()));
                let t = shale_tree::adjust(ta, &single, f);
                if shale_tree::same_root(&t, ta) {
                    return Some(a.clone());
                }
                let s = shale_tree::size(&t);
                *removed += shale_tree::size(ta) as isize - s as isize;
                match s {
                    0 => None,
                    1 => Some(new_leaf(*ha, single_entry(&t))),
                    _ => Some(collision(*ha, t)),
                }
            } else {
                match plan_node(b, f, removed) {
                    Some(addition) => Some(two(shift, a.clone(), addition)),
                    None => Some(a.clone()),
                }
            }
        }
        (Node::Collision { hash: ha, tree: ta }, Node::Collision { hash: hb, tree: tb }) => {
            if ha == hb {
                let t = shale_tree::adjust(ta, tb, f);
                if shale_tree::same_root(&t, ta) {
                    return Some(a.clone());
                }
                let s = shale_tree::size(&t);
                *removed += shale_tree::size(ta) as isize - s as isize;
                match s {
                    0 => None,
                    1 => Some(new_leaf(*ha, single_entry(&t))),
                    _ => Some(collision(*ha, t)),
                }
            } else {
                match plan_node(b, f, removed) {
                    Some(addition) => Some(two(shift, a.clone(), addition)),
                    None => Some(a.clone()),
                }
            }
        }
    }
}
