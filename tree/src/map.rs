// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FromIterator;
use core::ops::Index;

use archery::{ArcK, RcK, SharedPointerKind};

use crate::change::{Change, Merged};
use crate::entry::EntryRef;
use crate::error::InvariantError;
use crate::node::{same_root, size, Root};
use crate::traverse::Iter;
use crate::{build, index, ops, setops, traverse};

/// Persistent ordered map: a root plus its cached entry count.
///
/// Every modifying method returns a new map sharing structure with the
/// receiver; a call that changes nothing hands the root back untouched,
/// which [`TreeMap::ptr_eq`] detects in O(1).
pub struct TreeMap<K, V, P: SharedPointerKind = RcK> {
    root: Root<K, V, P>,
    size: usize,
}

/// A [`TreeMap`] whose nodes are shared through atomic reference
/// counts, so the map is `Send + Sync` for suitable `K`/`V`.
pub type TreeMapSync<K, V> = TreeMap<K, V, ArcK>;

impl<K, V> TreeMap<K, V> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> TreeMap<K, V> {
        TreeMap::new_with_ptr_kind()
    }
}

impl<K, V> TreeMapSync<K, V> {
    /// Create an empty map backed by atomic reference counts.
    #[must_use]
    pub fn new_sync() -> TreeMapSync<K, V> {
        TreeMap::new_with_ptr_kind()
    }
}

impl<K, V, P: SharedPointerKind> TreeMap<K, V, P> {
    /// Create an empty map with an explicit pointer kind.
    #[must_use]
    pub fn new_with_ptr_kind() -> TreeMap<K, V, P> {
        TreeMap { root: None, size: 0 }
    }

    fn wrap(root: Root<K, V, P>) -> TreeMap<K, V, P> {
        let size = size(&root);
        TreeMap { root, size }
    }

    /// Number of entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the map holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The underlying root, for callers driving the core functions
    /// directly.
    pub fn root(&self) -> &Root<K, V, P> {
        &self.root
    }

    /// Whether both maps share the same root. Implies equal content.
    #[must_use]
    pub fn ptr_eq(&self, other: &TreeMap<K, V, P>) -> bool {
        same_root(&self.root, &other.root)
    }

    /// Iterate in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter::new(&self.root)
    }

    /// Iterate over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate over the values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Fold over the entries in ascending key order.
    pub fn fold<B, F: FnMut(B, &K, &V) -> B>(&self, init: B, f: F) -> B {
        traverse::fold(&self.root, init, f)
    }

    /// Validate the structural invariants, including the cached size.
    pub fn check(&self) -> Result<(), InvariantError>
    where
        K: Ord,
    {
        crate::error::check(&self.root)?;
        let computed = size(&self.root);
        if computed != self.size {
            return Err(InvariantError::SizeMismatch { stored: self.size, computed });
        }
        Ok(())
    }
}

impl<K: Ord, V, P: SharedPointerKind> TreeMap<K, V, P> {
    /// Look up the value stored for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        ops::lookup(&self.root, key)
    }

    /// Look up the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        ops::lookup_entry(&self.root, key).map(|e| (&e.key, &e.value))
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// The smallest entry.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        ops::lookup_min(&self.root)
    }

    /// The largest entry.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        ops::lookup_max(&self.root)
    }

    /// Return a map with `key` bound to `value`.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> TreeMap<K, V, P> {
        self.alter(key, |_| Change::Update(value))
    }

    /// Bind `key` to `value` in place.
    pub fn insert_mut(&mut self, key: K, value: V) {
        let inserted =
            build::mutate_insert(&mut self.root, key, value, &mut |_, incoming, _| incoming);
        if inserted {
            self.size += 1;
        }
    }

    /// Return a map without `key`. Absent keys return a map sharing
    /// this map's root.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> TreeMap<K, V, P>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = ops::remove(&self.root, key);
        TreeMap { root, size: self.size - usize::from(removed) }
    }

    /// Delete `key` in place; returns whether it was present.
    pub fn remove_mut<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = ops::remove(&self.root, key);
        if removed {
            self.root = root;
            self.size -= 1;
        }
        removed
    }

    /// Insert, update or delete the entry for `key` through a callback
    /// receiving the current value.
    #[must_use]
    pub fn alter<F>(&self, key: K, f: F) -> TreeMap<K, V, P>
    where
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let (root, delta) = ops::alter(&self.root, key, f);
        TreeMap { root, size: (self.size as isize + delta) as usize }
    }

    /// Partition around `key` into the entries below, the matching
    /// entry and the entries above.
    #[must_use]
    pub fn split<Q>(&self, key: &Q) -> (TreeMap<K, V, P>, Option<EntryRef<K, V, P>>, TreeMap<K, V, P>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (below, matched, above) = ops::split(&self.root, key);
        (TreeMap::wrap(below), matched, TreeMap::wrap(above))
    }

    /// Merge with `other`; `merge` resolves keys present in both.
    #[must_use]
    pub fn union<F>(&self, other: &TreeMap<K, V, P>, mut merge: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnMut(&V, &V, &K) -> Merged<V>,
    {
        TreeMap::wrap(setops::union(&self.root, &other.root, &mut merge))
    }

    /// Keep the keys present in both maps.
    #[must_use]
    pub fn intersection<F>(&self, other: &TreeMap<K, V, P>, mut merge: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnMut(&V, &V, &K) -> Merged<V>,
    {
        TreeMap::wrap(setops::intersection(&self.root, &other.root, &mut merge))
    }

    /// Remove every key present in `other`.
    #[must_use]
    pub fn difference<W>(&self, other: &TreeMap<K, W, P>) -> TreeMap<K, V, P> {
        TreeMap::wrap(setops::difference(&self.root, &other.root))
    }

    /// Keep the keys present in exactly one of the maps.
    #[must_use]
    pub fn symmetric_difference(&self, other: &TreeMap<K, V, P>) -> TreeMap<K, V, P> {
        TreeMap::wrap(setops::symmetric_difference(&self.root, &other.root))
    }

    /// Apply `other` as an adjustment plan; see [`crate::adjust`].
    #[must_use]
    pub fn adjust<W, F>(&self, other: &TreeMap<K, W, P>, mut f: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnMut(Option<&V>, &W, &K) -> Change<V>,
    {
        TreeMap::wrap(setops::adjust(&self.root, &other.root, &mut f))
    }

    /// Transform every value; `Change::Keep` preserves sharing.
    #[must_use]
    pub fn map_values<F>(&self, mut f: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Change<V>,
    {
        TreeMap::wrap(traverse::map_values(&self.root, &mut f))
    }

    /// Transform and filter every value.
    #[must_use]
    pub fn collect_values<F>(&self, mut f: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Change<V>,
    {
        TreeMap::wrap(traverse::collect_values(&self.root, &mut f))
    }

    /// Split into the entries satisfying the predicate and the rest.
    #[must_use]
    pub fn partition<F>(&self, mut f: F) -> (TreeMap<K, V, P>, TreeMap<K, V, P>)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let (yes, no) = setops::partition(&self.root, &mut f);
        (TreeMap::wrap(yes), TreeMap::wrap(no))
    }

    /// Rank of `key` among the stored keys.
    #[must_use]
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        index::index_of(&self.root, key)
    }

    /// The entry at rank `index`.
    #[must_use]
    pub fn get_by_index(&self, idx: usize) -> Option<(&K, &V)> {
        index::lookup_by_index(&self.root, idx)
    }

    /// The first `n` entries in key order.
    #[must_use]
    pub fn take(&self, n: usize) -> TreeMap<K, V, P> {
        TreeMap::wrap(index::take(&self.root, n))
    }

    /// Everything but the first `n` entries in key order.
    #[must_use]
    pub fn skip(&self, n: usize) -> TreeMap<K, V, P> {
        TreeMap::wrap(index::drop(&self.root, n))
    }

    /// Update or delete the entry at rank `index`.
    #[must_use]
    pub fn alter_by_index<F>(&self, idx: usize, f: F) -> TreeMap<K, V, P>
    where
        K: Clone,
        F: FnOnce(&K, &V) -> Change<V>,
    {
        let (root, delta) = index::alter_by_index(&self.root, idx, f);
        TreeMap { root, size: (self.size as isize + delta) as usize }
    }

    /// Whether every key of this map occurs in `other`.
    #[must_use]
    pub fn is_key_subset<W>(&self, other: &TreeMap<K, W, P>) -> bool {
        setops::is_key_subset(&self.root, &other.root)
    }

    /// Whether this map shares no key with `other`.
    #[must_use]
    pub fn is_disjoint<W>(&self, other: &TreeMap<K, W, P>) -> bool {
        setops::is_disjoint(&self.root, &other.root)
    }
}

impl<K, V, P: SharedPointerKind> Clone for TreeMap<K, V, P> {
    fn clone(&self) -> TreeMap<K, V, P> {
        TreeMap { root: self.root.clone(), size: self.size }
    }
}

impl<K, V, P: SharedPointerKind> Default for TreeMap<K, V, P> {
    fn default() -> TreeMap<K, V, P> {
        TreeMap::new_with_ptr_kind()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P: SharedPointerKind> fmt::Debug for TreeMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, P, PO> PartialEq<TreeMap<K, V, PO>> for TreeMap<K, V, P>
where
    P: SharedPointerKind,
    PO: SharedPointerKind,
{
    fn eq(&self, other: &TreeMap<K, V, PO>) -> bool {
        self.size == other.size
            && self
                .iter()
                .zip(other.iter())
                .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

impl<K: Eq, V: Eq, P: SharedPointerKind> Eq for TreeMap<K, V, P> {}

impl<K: Ord, V, P: SharedPointerKind> FromIterator<(K, V)> for TreeMap<K, V, P> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(items: I) -> TreeMap<K, V, P> {
        TreeMap::wrap(build::from_entries(items))
    }
}

impl<K: Ord, V, P: SharedPointerKind> Extend<(K, V)> for TreeMap<K, V, P> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, items: I) {
        for (k, v) in items {
            self.insert_mut(k, v);
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> IntoIterator for &'a TreeMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}

impl<'a, K, Q, V, P> Index<&'a Q> for TreeMap<K, V, P>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
    P: SharedPointerKind,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

mod serde_impls {
    use super::*;
    use core::marker::PhantomData;
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, Serializer};

    impl<K, V, P> Serialize for TreeMap<K, V, P>
    where
        K: Ord + Serialize,
        V: Serialize,
        P: SharedPointerKind,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self)
        }
    }

    impl<'de, K, V, P> Deserialize<'de> for TreeMap<K, V, P>
    where
        K: Ord + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<TreeMap<K, V, P>, D::Error> {
            deserializer.deserialize_map(TreeMapVisitor { _phantom: PhantomData })
        }
    }

    struct TreeMapVisitor<K, V, P> {
        _phantom: PhantomData<(K, V, P)>,
    }

    impl<'de, K, V, P> Visitor<'de> for TreeMapVisitor<K, V, P>
    where
        K: Ord + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
    {
        type Value = TreeMap<K, V, P>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TreeMap<K, V, P>, A::Error> {
            let mut tree_map = TreeMap::new_with_ptr_kind();
            while let Some((k, v)) = map.next_entry()? {
                tree_map.insert_mut(k, v);
            }
            Ok(tree_map)
        }
    }
}
