// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Persistent size-balanced binary search tree.
//!
//! The tree is an ordered map with structural sharing: every operation
//! returns a new root and leaves the input untouched, sharing all
//! unmodified subtrees with it. Balance is maintained by subtree weight
//! (sibling sizes may differ by at most a factor of three), which also
//! gives O(log n) rank and select queries for free since every node
//! carries the size of its subtree.
//!
//! The module exposes two layers:
//!
//! * the core functions operating on raw roots (`lookup`, `alter`,
//!   `split`, `union`, ...), which is what the HAMT uses for its
//!   collision buckets, and
//! * [`TreeMap`], a `(root, size)` wrapper with a conventional map API.
//!
//! Unchanged results are signalled by pointer identity: whenever an
//! operation would produce a tree equal to its (left) input, the input
//! root is returned as-is and callers can detect this with [`same_root`].

mod balance;
mod build;
mod change;
mod entry;
mod error;
mod index;
mod map;
mod node;
mod ops;
mod setops;
mod traverse;

pub use self::build::{build, from_entries, from_entries_with, mutate_insert};
pub use self::change::{Change, Merged};
pub use self::entry::{same_entry, Entry, EntryRef};
pub use self::error::{check, InvariantError};
pub use self::index::{alter_by_index, drop, index_of, lookup_by_index, take};
pub use self::map::{TreeMap, TreeMapSync};
pub use self::node::{from_entry, from_two_entries, same_root, size, Node, NodeRef, Root};
pub use self::ops::{
    alter, insert, lookup, lookup_entry, lookup_max, lookup_min, max_view, min_view, remove,
    split,
};
pub use self::setops::{
    adjust, difference, intersection, is_disjoint, is_key_subset, partition,
    symmetric_difference, union,
};
pub use self::traverse::{collect_values, fold, map_values, Iter};
