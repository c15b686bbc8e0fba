// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! Persistent hash array mapped trie.
//!
//! Keys are placed by successive five-bit chunks of a 32-bit hash.
//! Interior branches store only their populated slots behind a bitmap;
//! a lone entry is a leaf carrying its full hash, and keys whose hashes
//! collide entirely share a collision bucket, which is an ordered tree
//! from [`shale_tree`] keyed by the keys themselves.
//!
//! All operations are persistent: they return a new root sharing every
//! untouched node with the input, and hand the input root back
//! pointer-identical when nothing changed. Bulk merges additionally
//! report the entry-count bookkeeping (matched or removed entries) so a
//! wrapper can maintain its cached size without recounting.

mod bitmap;
mod build;
mod error;
mod hash;
mod map;
mod node;
mod setops;
mod traverse;

pub use shale_tree::{same_entry, Change, Entry, EntryRef, Merged};

pub use self::bitmap::{
    chunk, full_index, mask, sparse_index, BITS_PER_SUBKEY, FULL_BITMAP, MAX_CHILDREN, SUBKEY_MASK,
};
pub use self::build::{build, from_entries, from_entries_with, mutate_insert};
pub use self::error::{check, InvariantError};
pub use self::hash::hash_key;
pub use self::map::{DefaultBuildHasher, TrieMap, TrieMapSync};
pub use self::node::{alter, insert, lookup, lookup_with, remove, same_root, Node, NodeRef, Root};
pub use self::setops::{adjust, difference, intersection, union};
pub use self::traverse::{collect_values, fold, map_values, Iter};
