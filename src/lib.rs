// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Persistent associative containers with structural sharing.
//!
//! Two cores, each usable on its own:
//!
//! * [`tree`] is a weight-balanced ordered map with rank/select
//!   queries and split-based bulk set algebra;
//! * [`hamt`] is a hash array mapped trie, which reuses the ordered
//!   tree for its hash-collision buckets.
//!
//! The wrapper types [`TreeMap`] and [`TrieMap`] carry a root and a
//! cached entry count; all mutation is persistent and unchanged
//! results are returned pointer-identical.

pub use shale_hamt as hamt;
pub use shale_tree as tree;

pub use shale_hamt::{DefaultBuildHasher, TrieMap, TrieMapSync};
pub use shale_tree::{Change, Entry, EntryRef, Merged, TreeMap, TreeMapSync};
