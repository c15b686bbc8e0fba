// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, BuildHasherDefault, Hash};
use core::iter::FromIterator;
use core::ops::Index;

use archery::{ArcK, RcK, SharedPointerKind};

use shale_tree::{Change, Merged};

use crate::error::InvariantError;
use crate::hash::hash_key;
use crate::node::{same_root, Root};
use crate::traverse::Iter;
use crate::{build, node, setops, traverse};

/// The default hasher config: SipHash with fixed keys, so placement is
/// deterministic across processes.
pub type DefaultBuildHasher = BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

/// Persistent hash map: a trie root, its cached entry count and the
/// hasher config the trie was built with.
///
/// Every modifying method returns a new map sharing structure with the
/// receiver; a call that changes nothing hands the root back untouched,
/// which [`TrieMap::ptr_eq`] detects in O(1). Binary operations
/// (`union` and friends) require both operands to carry the same
/// hasher config, since key placement depends on it.
pub struct TrieMap<K, V, P: SharedPointerKind = RcK, H: BuildHasher = DefaultBuildHasher> {
    root: Root<K, V, P>,
    size: usize,
    hasher: H,
}

/// A [`TrieMap`] whose nodes are shared through atomic reference
/// counts, so the map is `Send + Sync` for suitable `K`/`V`.
pub type TrieMapSync<K, V, H = DefaultBuildHasher> = TrieMap<K, V, ArcK, H>;

impl<K, V> TrieMap<K, V> {
    /// Create an empty map with the default hasher config.
    #[must_use]
    pub fn new() -> TrieMap<K, V> {
        TrieMap::new_with_hasher_and_ptr_kind(DefaultBuildHasher::default())
    }
}

impl<K, V> TrieMapSync<K, V> {
    /// Create an empty map backed by atomic reference counts.
    #[must_use]
    pub fn new_sync() -> TrieMapSync<K, V> {
        TrieMap::new_with_hasher_and_ptr_kind(DefaultBuildHasher::default())
    }
}

impl<K, V, P: SharedPointerKind, H: BuildHasher> TrieMap<K, V, P, H> {
    /// Create an empty map with an explicit hasher config and pointer
    /// kind.
    #[must_use]
    pub fn new_with_hasher_and_ptr_kind(hasher: H) -> TrieMap<K, V, P, H> {
        TrieMap { root: None, size: 0, hasher }
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

    /// The hasher config this map places its keys with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Whether both maps share the same root. Implies equal content.
    #[must_use]
    pub fn ptr_eq(&self, other: &TrieMap<K, V, P, H>) -> bool {
        same_root(&self.root, &other.root)
    }

    /// Iterate over the entries. The order is unspecified but stable
    /// for a given map.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter::new(&self.root)
    }

    /// Iterate over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Fold over every entry.
    pub fn fold<B, F: FnMut(B, &K, &V) -> B>(&self, init: B, f: F) -> B {
        traverse::fold(&self.root, init, f)
    }

    /// Validate the structural invariants, including the cached size.
    pub fn check(&self) -> Result<(), InvariantError>
    where
        K: Ord,
    {
        crate::error::check(&self.root)?;
        let computed = traverse::fold(&self.root, 0usize, |acc, _, _| acc + 1);
        if computed != self.size {
            return Err(InvariantError::WrongSize { stored: self.size, computed });
        }
        Ok(())
    }
}

impl<K, V, P, H> TrieMap<K, V, P, H>
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
{
    /// Look up the value stored for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + ?Sized,
    {
        node::lookup(&self.root, key, hash_key(key, &self.hasher))
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + Hash + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Return a map with `key` bound to `value`.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> TrieMap<K, V, P, H> {
        self.alter(key, |_| Change::Update(value))
    }

    /// Bind `key` to `value` in place.
    pub fn insert_mut(&mut self, key: K, value: V) {
        let hash = hash_key(&key, &self.hasher);
        let mut merge = |_: &V, incoming: V, _: &K| incoming;
        if build::mutate_insert(&mut self.root, key, hash, value, &mut merge) {
            self.size += 1;
        }
    }

    /// Return a map without `key`. Absent keys return a map sharing
    /// this map's root.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> TrieMap<K, V, P, H>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + ?Sized,
    {
        let hash = hash_key(key, &self.hasher);
        let (root, removed) = node::remove(&self.root, key, hash);
        TrieMap {
            root,
            size: self.size - usize::from(removed),
            hasher: self.hasher.clone(),
        }
    }

    /// Delete `key` in place; returns whether it was present.
    pub fn remove_mut<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + Hash + ?Sized,
    {
        let hash = hash_key(key, &self.hasher);
        let (root, removed) = node::remove(&self.root, key, hash);
        if removed {
            self.root = root;
            self.size -= 1;
        }
        removed
    }

    /// Insert, update or delete the entry for `key` through a callback
    /// receiving the current value.
    #[must_use]
    pub fn alter<F>(&self, key: K, f: F) -> TrieMap<K, V, P, H>
    where
        F: FnOnce(Option<&V>) -> Change<V>,
    {
        let hash = hash_key(&key, &self.hasher);
        let (root, delta) = node::alter(&self.root, key, hash, f);
        TrieMap {
            root,
            size: (self.size as isize + delta) as usize,
            hasher: self.hasher.clone(),
        }
    }

    /// Merge with `other`; `merge` resolves keys present in both.
    #[must_use]
    pub fn union<F>(&self, other: &TrieMap<K, V, P, H>, mut merge: F) -> TrieMap<K, V, P, H>
    where
        K: Clone,
        F: FnMut(&V, &V, &K) -> Merged<V>,
    {
        let (root, matched) = setops::union(&self.root, &other.root, &mut merge);
        TrieMap {
            root,
            size: self.size + other.size - matched,
            hasher: self.hasher.clone(),
        }
    }

    /// Keep the keys present in both maps.
    #[must_use]
    pub fn intersection<F>(&self, other: &TrieMap<K, V, P, H>, mut merge: F) -> TrieMap<K, V, P, H>
    where
        K: Clone,
        F: FnMut(&V, &V, &K) -> Merged<V>,
    {
        let (root, matched) = setops::intersection(&self.root, &other.root, &mut merge);
        TrieMap { root, size: matched, hasher: self.hasher.clone() }
    }

    /// Remove every key present in `other`.
    #[must_use]
    pub fn difference<W>(&self, other: &TrieMap<K, W, P, H>) -> TrieMap<K, V, P, H> {
        let (root, removed) = setops::difference(&self.root, &other.root);
        TrieMap { root, size: self.size - removed, hasher: self.hasher.clone() }
    }

    /// Apply `other` as an adjustment plan; see [`crate::adjust`].
    #[must_use]
    pub fn adjust<W, F>(&self, other: &TrieMap<K, W, P, H>, mut f: F) -> TrieMap<K, V, P, H>
    where
        K: Clone,
        F: FnMut(Option<&V>, &W, &K) -> Change<V>,
    {
        let (root, removed) = setops::adjust(&self.root, &other.root, &mut f);
        TrieMap {
            root,
            size: (self.size as isize - removed) as usize,
            hasher: self.hasher.clone(),
        }
    }

    /// Transform every value; `Change::Keep` preserves sharing.
    #[must_use]
    pub fn map_values<F>(&self, f: F) -> TrieMap<K, V, P, H>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Change<V>,
    {
        self.collect_values(f)
    }

    /// Transform and filter every value.
    #[must_use]
    pub fn collect_values<F>(&self, mut f: F) -> TrieMap<K, V, P, H>
    where
        K: Clone,
        F: FnMut(&K, &V) -> Change<V>,
    {
        let (root, removed) = traverse::collect_values(&self.root, &mut f);
        TrieMap { root, size: self.size - removed, hasher: self.hasher.clone() }
    }
}

impl<K, V, P: SharedPointerKind, H: BuildHasher + Clone> Clone for TrieMap<K, V, P, H> {
    fn clone(&self) -> TrieMap<K, V, P, H> {
        TrieMap { root: self.root.clone(), size: self.size, hasher: self.hasher.clone() }
    }
}

impl<K, V, P: SharedPointerKind, H: BuildHasher + Default> Default for TrieMap<K, V, P, H> {
    fn default() -> TrieMap<K, V, P, H> {
        TrieMap::new_with_hasher_and_ptr_kind(H::default())
    }
}

impl<K, V, P, H> fmt::Debug for TrieMap<K, V, P, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: SharedPointerKind,
    H: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, P, PO, H> PartialEq<TrieMap<K, V, PO, H>> for TrieMap<K, V, P, H>
where
    K: Ord + Hash,
    V: PartialEq,
    P: SharedPointerKind,
    PO: SharedPointerKind,
    H: BuildHasher + Clone,
{
    fn eq(&self, other: &TrieMap<K, V, PO, H>) -> bool {
        self.size == other.size
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V, P, H> Eq for TrieMap<K, V, P, H>
where
    K: Ord + Hash,
    V: Eq,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
{
}

impl<K, V, P, H> FromIterator<(K, V)> for TrieMap<K, V, P, H>
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(items: I) -> TrieMap<K, V, P, H> {
        let hasher = H::default();
        let (root, size) = build::from_entries(&hasher, items);
        TrieMap { root, size, hasher }
    }
}

impl<K, V, P, H> Extend<(K, V)> for TrieMap<K, V, P, H>
where
    K: Ord + Hash,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, items: I) {
        for (k, v) in items {
            self.insert_mut(k, v);
        }
    }
}

impl<'a, K, V, P: SharedPointerKind, H: BuildHasher> IntoIterator for &'a TrieMap<K, V, P, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}

impl<'a, K, Q, V, P, H> Index<&'a Q> for TrieMap<K, V, P, H>
where
    K: Ord + Hash + Borrow<Q>,
    Q: Ord + Hash + ?Sized,
    P: SharedPointerKind,
    H: BuildHasher + Clone,
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

    impl<K, V, P, H> Serialize for TrieMap<K, V, P, H>
    where
        K: Serialize,
        V: Serialize,
        P: SharedPointerKind,
        H: BuildHasher,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self)
        }
    }

    impl<'de, K, V, P, H> Deserialize<'de> for TrieMap<K, V, P, H>
    where
        K: Ord + Hash + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<TrieMap<K, V, P, H>, D::Error> {
            deserializer.deserialize_map(TrieMapVisitor { _phantom: PhantomData })
        }
    }

    struct TrieMapVisitor<K, V, P, H> {
        _phantom: PhantomData<(K, V, P, H)>,
    }

    impl<'de, K, V, P, H> Visitor<'de> for TrieMapVisitor<K, V, P, H>
    where
        K: Ord + Hash + Deserialize<'de>,
        V: Deserialize<'de>,
        P: SharedPointerKind,
        H: BuildHasher + Clone + Default,
    {
        type Value = TrieMap<K, V, P, H>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TrieMap<K, V, P, H>, A::Error> {
            let mut trie_map = TrieMap::new_with_hasher_and_ptr_kind(H::default());
            while let Some((k, v)) = map.next_entry()? {
                trie_map.insert_mut(k, v);
            }
            Ok(trie_map)
        }
    }
}
