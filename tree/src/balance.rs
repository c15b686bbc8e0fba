// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Weight-balancing combinators.
//!
//! A node is balanced when neither child outweighs the other by more
//! than a factor of [`DELTA`]. The combinators below each accept a
//! pivot entry and two individually balanced subtrees and rebuild a
//! balanced node; they differ only in how far out of bounds the inputs
//! are allowed to be. [`RATIO`] decides between a single and a double
//! rotation once a side is found too heavy.

use archery::{SharedPointer, SharedPointerKind};

use crate::entry::EntryRef;
use crate::node::{join, size, Node, NodeRef, Root};

/// Maximum allowed weight ratio between siblings.
pub(crate) const DELTA: usize = 3;
/// Single-versus-double rotation threshold.
pub(crate) const RATIO: usize = 2;

/// Rebuild a node whose left subtree may have grown (or whose right
/// subtree may have shrunk) by at most one unit.
pub(crate) fn combine_after_left_increase<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let ls = size(&left);
    let rs = size(&right);
    if ls + rs > 1 && ls > DELTA * rs {
        let left = left.expect("left-heavy tree has a left child");
        rotate_right(entry, left, right)
    } else {
        join(entry, left, right)
    }
}

/// Mirror image of [`combine_after_left_increase`].
pub(crate) fn combine_after_right_increase<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let ls = size(&left);
    let rs = size(&right);
    if ls + rs > 1 && rs > DELTA * ls {
        let right = right.expect("right-heavy tree has a right child");
        rotate_left(entry, left, right)
    } else {
        join(entry, left, right)
    }
}

/// Rebuild a node after either subtree changed by at most one unit in
/// either direction.
pub(crate) fn combine_after_insert_or_remove<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let ls = size(&left);
    let rs = size(&right);
    if ls + rs <= 1 {
        join(entry, left, right)
    } else if rs > DELTA * ls {
        let right = right.expect("right-heavy tree has a right child");
        rotate_left(entry, left, right)
    } else if ls > DELTA * rs {
        let left = left.expect("left-heavy tree has a left child");
        rotate_right(entry, left, right)
    } else {
        join(entry, left, right)
    }
}

/// Join two balanced subtrees of arbitrary relative size around a pivot
/// entry that orders between them.
///
/// Descends along the heavier side until the remainder is within the
/// pivot's weight bound, then rebalances on the way out.
pub(crate) fn combine_different_sizes<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let ls = size(&left);
    let rs = size(&right);
    if ls + rs > 1 && rs > DELTA * ls {
        let r = right.expect("right-heavy tree has a right child");
        let combined = combine_different_sizes(entry, left, r.left.clone());
        combine_after_left_increase(r.entry.clone(), Some(combined), r.right.clone())
    } else if ls + rs > 1 && ls > DELTA * rs {
        let l = left.expect("left-heavy tree has a left child");
        let combined = combine_different_sizes(entry, l.right.clone(), right);
        combine_after_right_increase(l.entry.clone(), l.left.clone(), Some(combined))
    } else {
        join(entry, left, right)
    }
}

/// Glue two subtrees of comparable weight with no pivot: pop a boundary
/// entry off the heavier side and use it as the new pivot.
pub(crate) fn glue_size_balanced<K, V, P: SharedPointerKind>(
    left: &Root<K, V, P>,
    right: &Root<K, V, P>,
) -> Root<K, V, P> {
    match (left, right) {
        (None, _) => right.clone(),
        (_, None) => left.clone(),
        (Some(l), Some(r)) => {
            if l.size > r.size {
                let (entry, rest) = pop_max(l);
                Some(combine_after_right_increase(entry, rest, right.clone()))
            } else {
                let (entry, rest) = pop_min(r);
                Some(combine_after_left_increase(entry, left.clone(), rest))
            }
        }
    }
}

/// Glue two balanced subtrees of arbitrary relative size with no pivot.
pub(crate) fn glue_different_sizes<K, V, P: SharedPointerKind>(
    left: &Root<K, V, P>,
    right: &Root<K, V, P>,
) -> Root<K, V, P> {
    match (left, right) {
        (None, _) => right.clone(),
        (_, None) => left.clone(),
        (Some(l), Some(r)) => {
            if DELTA * l.size < r.size {
                Some(combine_after_left_increase(
                    r.entry.clone(),
                    glue_different_sizes(left, &r.left),
                    r.right.clone(),
                ))
            } else if DELTA * r.size < l.size {
                Some(combine_after_right_increase(
                    l.entry.clone(),
                    l.left.clone(),
                    glue_different_sizes(&l.right, right),
                ))
            } else {
                glue_size_balanced(left, right)
            }
        }
    }
}

/// Detach the smallest entry of a non-empty subtree.
pub(crate) fn pop_min<K, V, P: SharedPointerKind>(
    node: &Node<K, V, P>,
) -> (EntryRef<K, V, P>, Root<K, V, P>) {
    match &node.left {
        None => (node.entry.clone(), node.right.clone()),
        Some(l) => {
            let (entry, rest) = pop_min(l);
            let rebuilt = combine_after_right_increase(node.entry.clone(), rest, node.right.clone());
            (entry, Some(rebuilt))
        }
    }
}

/// Detach the largest entry of a non-empty subtree.
pub(crate) fn pop_max<K, V, P: SharedPointerKind>(
    node: &Node<K, V, P>,
) -> (EntryRef<K, V, P>, Root<K, V, P>) {
    match &node.right {
        None => (node.entry.clone(), node.left.clone()),
        Some(r) => {
            let (entry, rest) = pop_max(r);
            let rebuilt = combine_after_left_increase(node.entry.clone(), node.left.clone(), rest);
            (entry, Some(rebuilt))
        }
    }
}

fn rotate_left<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    right: NodeRef<K, V, P>,
) -> NodeRef<K, V, P> {
    let r = &*right;
    if size(&r.left) < RATIO * size(&r.right) {
        single_left(entry, left, r)
    } else {
        double_left(entry, left, r)
    }
}

fn rotate_right<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: NodeRef<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let l = &*left;
    if size(&l.right) < RATIO * size(&l.left) {
        single_right(entry, l, right)
    } else {
        double_right(entry, l, right)
    }
}

// (e, l, (re, rl, rr))  ->  (re, (e, l, rl), rr)
fn single_left<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    r: &Node<K, V, P>,
) -> NodeRef<K, V, P> {
    join(
        r.entry.clone(),
        Some(join(entry, left, r.left.clone())),
        r.right.clone(),
    )
}

// (e, (le, ll, lr), r)  ->  (le, ll, (e, lr, r))
fn single_right<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    l: &Node<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    join(
        l.entry.clone(),
        l.left.clone(),
        Some(join(entry, l.right.clone(), right)),
    )
}

// (e, l, (re, (rle, rll, rlr), rr))  ->  (rle, (e, l, rll), (re, rlr, rr))
fn double_left<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    left: Root<K, V, P>,
    r: &Node<K, V, P>,
) -> NodeRef<K, V, P> {
    let rl = r.left.as_deref().expect("double rotation needs the inner grandchild");
    join(
        rl.entry.clone(),
        Some(join(entry, left, rl.left.clone())),
        Some(join(r.entry.clone(), rl.right.clone(), r.right.clone())),
    )
}

// (e, (le, ll, (lre, lrl, lrr)), r)  ->  (lre, (le, ll, lrl), (e, lrr, r))
fn double_right<K, V, P: SharedPointerKind>(
    entry: EntryRef<K, V, P>,
    l: &Node<K, V, P>,
    right: Root<K, V, P>,
) -> NodeRef<K, V, P> {
    let lr = l.right.as_deref().expect("double rotation needs the inner grandchild");
    join(
        lr.entry.clone(),
        Some(join(l.entry.clone(), l.left.clone(), lr.left.clone())),
        Some(join(entry, lr.right.clone(), right)),
    )
}

// In-place rotation variants for the bulk builders. They reuse the
// displaced child's allocation for the new inner node, so a build over
// uniquely owned nodes never copies.

pub(crate) fn mut_rebalance_after_left_growth<K, V, P: SharedPointerKind>(
    node_ref: &mut NodeRef<K, V, P>,
) {
    let (ls, rs) = {
        let n = &**node_ref;
        (size(&n.left), size(&n.right))
    };
    if ls + rs <= 1 || ls <= DELTA * rs {
        return;
    }
    let single = {
        let l = node_ref.left.as_deref().expect("left-heavy tree has a left child");
        size(&l.right) < RATIO * size(&l.left)
    };
    if single {
        mut_single_right(node_ref);
    } else {
        {
            let n = SharedPointer::make_mut(node_ref);
            let l = n.left.as_mut().expect("left-heavy tree has a left child");
            mut_single_left(l);
        }
        mut_single_right(node_ref);
    }
}

pub(crate) fn mut_rebalance_after_right_growth<K, V, P: SharedPointerKind>(
    node_ref: &mut NodeRef<K, V, P>,
) {
    let (ls, rs) = {
        let n = &**node_ref;
        (size(&n.left), size(&n.right))
    };
    if ls + rs <= 1 || rs <= DELTA * ls {
        return;
    }
    let single = {
        let r = node_ref.right.as_deref().expect("right-heavy tree has a right child");
        size(&r.left) < RATIO * size(&r.right)
    };
    if single {
        mut_single_left(node_ref);
    } else {
        {
            let n = SharedPointer::make_mut(node_ref);
            let r = n.right.as_mut().expect("right-heavy tree has a right child");
            mut_single_right(r);
        }
        mut_single_left(node_ref);
    }
}

fn mut_single_left<K, V, P: SharedPointerKind>(node_ref: &mut NodeRef<K, V, P>) {
    let n = SharedPointer::make_mut(node_ref);
    let mut r = n.right.take().expect("rotation needs a right child");
    {
        let rn = SharedPointer::make_mut(&mut r);
        core::mem::swap(&mut n.entry, &mut rn.entry);
        n.right = rn.right.take();
        rn.right = rn.left.take();
        rn.left = n.left.take();
        rn.size = 1 + size(&rn.left) + size(&rn.right);
    }
    n.left = Some(r);
    n.size = 1 + size(&n.left) + size(&n.right);
}

fn mut_single_right<K, V, P: SharedPointerKind>(node_ref: &mut NodeRef<K, V, P>) {
    let n = SharedPointer::make_mut(node_ref);
    let mut l = n.left.take().expect("rotation needs a left child");
    {
        let ln = SharedPointer::make_mut(&mut l);
        core::mem::swap(&mut n.entry, &mut ln.entry);
        n.left = ln.left.take();
        ln.left = ln.right.take();
        ln.right = n.right.take();
        ln.size = 1 + size(&ln.left) + size(&ln.right);
    }
    n.right = Some(l);
    n.size = 1 + size(&n.left) + size(&n.right);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::leaf_entry;
    use archery::RcK;

    fn entry(k: i32) -> EntryRef<i32, i32, RcK> {
        SharedPointer::new(crate::entry::Entry::new(k, k))
    }

    #[test]
    fn single_rotation_restores_balance() {
        // An empty left side against a two-node right side forces the
        // single rotation.
        let right = join(entry(3), None, Some(leaf_entry(4, 4)));
        let root = combine_after_right_increase(entry(1), None, Some(right));
        assert_eq!(root.size(), 3);
        crate::check(&Some(root)).unwrap();
    }

    #[test]
    fn double_rotation_restores_balance() {
        // Right child with a heavy inner grandchild forces the double form.
        let rl = join(entry(3), Some(leaf_entry(2, 2)), Some(leaf_entry(4, 4)));
        let r = join(entry(5), Some(rl), Some(leaf_entry(6, 6)));
        let root = combine_after_right_increase(entry(1), None, Some(r));
        crate::check(&Some(root)).unwrap();
    }

    #[test]
    fn combine_different_sizes_joins_lopsided_trees() {
        let mut big: Root<i32, i32, RcK> = None;
        for k in 10..60 {
            let (r, _) = crate::alter(&big, k, |_| crate::Change::Update(k));
            big = r;
        }
        let small = Some(leaf_entry(1, 1));
        let root = combine_different_sizes(entry(5), small, big);
        assert_eq!(root.size(), 52);
        crate::check(&Some(root)).unwrap();
    }

    #[test]
    fn glue_keeps_order_and_balance() {
        let mut left: Root<i32, i32, RcK> = None;
        let mut right: Root<i32, i32, RcK> = None;
        for k in 0..20 {
            let (r, _) = crate::alter(&left, k, |_| crate::Change::Update(k));
            left = r;
            let (r, _) = crate::alter(&right, 100 + k, |_| crate::Change::Update(k));
            right = r;
        }
        let glued = glue_different_sizes(&left, &right);
        assert_eq!(size(&glued), 40);
        crate::check(&glued).unwrap();
        let keys: Vec<i32> = crate::Iter::new(&glued).map(|(k, _)| *k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
