// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Bulk set-algebraic operations.
//!
//! All of them walk the left operand's structure and carve the right
//! operand up with [`split`], so unchanged subtrees of the left operand
//! survive by reference. Whenever the result would be structurally equal
//! to the left operand, the left root itself is returned.

use core::cmp::Ordering;

use archery::{SharedPointer, SharedPointerKind};

use crate::balance::{
    combine_after_left_increase, combine_after_right_increase, combine_different_sizes,
    glue_different_sizes,
};
use crate::build::from_sorted_entries;
use crate::change::{Change, Merged};
use crate::entry::{same_entry, Entry, EntryRef};
use crate::node::{leaf, replace_entry, same_root, Root};
use crate::ops::split;

/// Merge two trees, resolving keys present in both through `merge`,
/// which receives the left value, the right value and the key.
pub fn union<K, V, P, F>(a: &Root<K, V, P>, b: &Root<K, V, P>, merge: &mut F) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (a, b) {
        (None, _) => b.clone(),
        (_, None) => a.clone(),
        (Some(an), Some(bn)) => {
            // A single-node operand degenerates to one insertion.
            if bn.size == 1 {
                return insert_entry(a, &bn.entry, merge, true);
            }
            if an.size == 1 {
                return insert_entry(b, &an.entry, merge, false);
            }
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            let new_left = union(&an.left, &bl, merge);
            let new_right = union(&an.right, &bg, merge);
            let entry = match bmatch {
                None => an.entry.clone(),
                Some(be) => match merge(&an.entry.value, &be.value, &an.entry.key) {
                    Merged::Left => an.entry.clone(),
                    Merged::Right => be,
                    Merged::New(v) => SharedPointer::new(Entry::new(an.entry.key.clone(), v)),
                },
            };
            if same_entry(&entry, &an.entry)
                && same_root(&new_left, &an.left)
                && same_root(&new_right, &an.right)
            {
                a.clone()
            } else {
                Some(combine_different_sizes(entry, new_left, new_right))
            }
        }
    }
}

/// Keep only the keys present in both trees, resolving each through
/// `merge` as in [`union`].
pub fn intersection<K, V, P, F>(a: &Root<K, V, P>, b: &Root<K, V, P>, merge: &mut F) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(an), Some(_)) => {
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            let new_left = intersection(&an.left, &bl, merge);
            let new_right = intersection(&an.right, &bg, merge);
            match bmatch {
                Some(be) => {
                    let entry = match merge(&an.entry.value, &be.value, &an.entry.key) {
                        Merged::Left => an.entry.clone(),
                        Merged::Right => be,
                        Merged::New(v) => SharedPointer::new(Entry::new(an.entry.key.clone(), v)),
                    };
                    if same_entry(&entry, &an.entry)
                        && same_root(&new_left, &an.left)
                        && same_root(&new_right, &an.right)
                    {
                        a.clone()
                    } else {
                        Some(combine_different_sizes(entry, new_left, new_right))
                    }
                }
                None => glue_different_sizes(&new_left, &new_right),
            }
        }
    }
}

/// Remove from `a` every key present in `b`. The right operand's values
/// are never read, so it may store a different value type.
pub fn difference<K, V, W, P>(a: &Root<K, V, P>, b: &Root<K, W, P>) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
{
    match (a, b) {
        (None, _) => None,
        (_, None) => a.clone(),
        (Some(an), Some(_)) => {
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            let new_left = difference(&an.left, &bl);
            let new_right = difference(&an.right, &bg);
            if bmatch.is_none() {
                if same_root(&new_left, &an.left) && same_root(&new_right, &an.right) {
                    a.clone()
                } else {
                    Some(combine_different_sizes(an.entry.clone(), new_left, new_right))
                }
            } else {
                glue_different_sizes(&new_left, &new_right)
            }
        }
    }
}

/// Keep the keys present in exactly one of the two trees.
pub fn symmetric_difference<K, V, P>(a: &Root<K, V, P>, b: &Root<K, V, P>) -> Root<K, V, P>
where
    K: Ord,
    P: SharedPointerKind,
{
    match (a, b) {
        (None, _) => b.clone(),
        (_, None) => a.clone(),
        (Some(an), Some(_)) => {
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            let new_left = symmetric_difference(&an.left, &bl);
            let new_right = symmetric_difference(&an.right, &bg);
            if bmatch.is_none() {
                if same_root(&new_left, &an.left) && same_root(&new_right, &an.right) {
                    a.clone()
                } else {
                    Some(combine_different_sizes(an.entry.clone(), new_left, new_right))
                }
            } else {
                glue_different_sizes(&new_left, &new_right)
            }
        }
    }
}

/// Apply an adjustment plan: for every key of `b`, decide the fate of
/// the corresponding entry of `a`. The callback receives the current
/// value (if any), the plan value and the key; keys only in `a` are
/// left untouched.
pub fn adjust<K, V, W, P, F>(a: &Root<K, V, P>, b: &Root<K, W, P>, f: &mut F) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    match (a, b) {
        (_, None) => a.clone(),
        (None, Some(_)) => plan(b, f),
        (Some(an), Some(_)) => {
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            let new_left = adjust(&an.left, &bl, f);
            let center = match bmatch {
                None => Change::Keep,
                Some(be) => f(Some(&an.entry.value), &be.value, &an.entry.key),
            };
            let new_right = adjust(&an.right, &bg, f);
            match center {
                Change::Keep => {
                    if same_root(&new_left, &an.left) && same_root(&new_right, &an.right) {
                        a.clone()
                    } else {
                        Some(combine_different_sizes(an.entry.clone(), new_left, new_right))
                    }
                }
                Change::Update(v) => {
                    let entry = SharedPointer::new(Entry::new(an.entry.key.clone(), v));
                    Some(combine_different_sizes(entry, new_left, new_right))
                }
                Change::Remove => glue_different_sizes(&new_left, &new_right),
            }
        }
    }
}

// Materialize the additions an adjustment plan makes against an empty
// tree. Plan keys arrive in ascending order, so the result builds
// directly from the sorted run.
fn plan<K, V, W, P, F>(b: &Root<K, W, P>, f: &mut F) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    let mut entries: Vec<EntryRef<K, V, P>> = Vec::new();
    collect_plan(b, f, &mut entries);
    from_sorted_entries(&entries)
}

fn collect_plan<K, V, W, P, F>(b: &Root<K, W, P>, f: &mut F, out: &mut Vec<EntryRef<K, V, P>>)
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(Option<&V>, &W, &K) -> Change<V>,
{
    if let Some(n) = b {
        collect_plan(&n.left, f, out);
        if let Change::Update(v) = f(None, &n.entry.value, &n.entry.key) {
            out.push(SharedPointer::new(Entry::new(n.entry.key.clone(), v)));
        }
        collect_plan(&n.right, f, out);
    }
}

/// Split the tree into the entries satisfying the predicate and those
/// that do not. Both results are balanced.
pub fn partition<K, V, P, F>(root: &Root<K, V, P>, f: &mut F) -> (Root<K, V, P>, Root<K, V, P>)
where
    P: SharedPointerKind,
    F: FnMut(&K, &V) -> bool,
{
    match root {
        None => (None, None),
        Some(n) => {
            let (lt, lf) = partition(&n.left, f);
            let takes = f(&n.entry.key, &n.entry.value);
            let (rt, rf) = partition(&n.right, f);
            if takes {
                let kept = if same_root(&lt, &n.left) && same_root(&rt, &n.right) {
                    root.clone()
                } else {
                    Some(combine_different_sizes(n.entry.clone(), lt, rt))
                };
                (kept, glue_different_sizes(&lf, &rf))
            } else {
                let kept = if same_root(&lf, &n.left) && same_root(&rf, &n.right) {
                    root.clone()
                } else {
                    Some(combine_different_sizes(n.entry.clone(), lf, rf))
                };
                (glue_different_sizes(&lt, &rt), kept)
            }
        }
    }
}

/// Whether every key of `a` also occurs in `b`.
pub fn is_key_subset<K, V, W, P>(a: &Root<K, V, P>, b: &Root<K, W, P>) -> bool
where
    K: Ord,
    P: SharedPointerKind,
{
    match (a, b) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(an), Some(bn)) => {
            if an.size > bn.size {
                return false;
            }
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            bmatch.is_some() && is_key_subset(&an.left, &bl) && is_key_subset(&an.right, &bg)
        }
    }
}

/// Whether the two trees share no key.
pub fn is_disjoint<K, V, W, P>(a: &Root<K, V, P>, b: &Root<K, W, P>) -> bool
where
    K: Ord,
    P: SharedPointerKind,
{
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(an), Some(_)) => {
            let (bl, bmatch, bg) = split(b, &an.entry.key);
            bmatch.is_none() && is_disjoint(&an.left, &bl) && is_disjoint(&an.right, &bg)
        }
    }
}

// Insert a ready-made entry into a tree, resolving a key clash through
// the union merge callback. `tree_is_left` records which union operand
// the tree was, so the callback sees its arguments in operand order.
fn insert_entry<K, V, P, F>(
    tree: &Root<K, V, P>,
    entry: &EntryRef<K, V, P>,
    merge: &mut F,
    tree_is_left: bool,
) -> Root<K, V, P>
where
    K: Ord + Clone,
    P: SharedPointerKind,
    F: FnMut(&V, &V, &K) -> Merged<V>,
{
    match tree {
        None => Some(leaf(entry.clone())),
        Some(n) => match entry.key.cmp(&n.entry.key) {
            Ordering::Less => {
                let new_left = insert_entry(&n.left, entry, merge, tree_is_left);
                if same_root(&new_left, &n.left) {
                    tree.clone()
                } else {
                    Some(combine_after_left_increase(
                        n.entry.clone(),
                        new_left,
                        n.right.clone(),
                    ))
                }
            }
            Ordering::Greater => {
                let new_right = insert_entry(&n.right, entry, merge, tree_is_left);
                if same_root(&new_right, &n.right) {
                    tree.clone()
                } else {
                    Some(combine_after_right_increase(
                        n.entry.clone(),
                        n.left.clone(),
                        new_right,
                    ))
                }
            }
            Ordering::Equal => {
                let merged = if tree_is_left {
                    merge(&n.entry.value, &entry.value, &n.entry.key)
                } else {
                    merge(&entry.value, &n.entry.value, &n.entry.key)
                };
                let chosen = match merged {
                    Merged::Left => {
                        if tree_is_left {
                            return tree.clone();
                        }
                        entry.clone()
                    }
                    Merged::Right => {
                        if !tree_is_left {
                            return tree.clone();
                        }
                        entry.clone()
                    }
                    Merged::New(v) => SharedPointer::new(Entry::new(n.entry.key.clone(), v)),
                };
                Some(replace_entry(n, chosen))
            }
        },
    }
}
