// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

use archery::RcK;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use shale_hamt::{Change, Merged, Node, TrieMap};

/// Hashes everything to zero: every key collides.
#[derive(Default)]
struct ConstHasher;

impl Hasher for ConstHasher {
    fn finish(&self) -> u64 {
        0
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

type ConstBuildHasher = BuildHasherDefault<ConstHasher>;
type CollidingMap<K, V> = TrieMap<K, V, RcK, ConstBuildHasher>;

/// Crams all keys into seven hash buckets.
#[derive(Default)]
struct NarrowHasher(u64);

impl Hasher for NarrowHasher {
    fn finish(&self) -> u64 {
        self.0 % 7
    }

    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(*b));
        }
    }
}

type NarrowBuildHasher = BuildHasherDefault<NarrowHasher>;

fn map_of(range: std::ops::Range<u32>) -> TrieMap<u32, u32> {
    range.map(|k| (k, k * 10)).collect()
}

#[test]
fn first_insert_makes_a_singleton() {
    let map: TrieMap<&str, i32> = TrieMap::new();
    let map = map.insert("a", 1);
    assert_eq!(map.size(), 1);
    assert_eq!(map.get("a"), Some(&1));
    map.check().unwrap();
}

#[test]
fn removal_keeps_the_rest() {
    let map: TrieMap<&str, i32> =
        vec![("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
    let smaller = map.remove("b");
    smaller.check().unwrap();
    assert_eq!(smaller.size(), 2);
    assert_eq!(smaller.get("b"), None);
    assert_eq!(smaller.get("a"), Some(&1));
    assert_eq!(smaller.get("c"), Some(&3));
    // The original is untouched.
    assert_eq!(map.size(), 3);
    assert_eq!(map.get("b"), Some(&2));
}

#[test]
fn union_of_equal_maps_with_left_bias_is_identity() {
    let a = map_of(0..32);
    let b = map_of(0..32);
    assert!(!a.ptr_eq(&b));
    let joined = a.union(&b, |_, _, _| Merged::Left);
    assert_eq!(joined.size(), 32);
    assert!(joined.ptr_eq(&a));
}

#[test]
fn union_merges_disjoint_and_overlapping_keys() {
    let a = map_of(0..48);
    let b = map_of(32..96);
    let joined = a.union(&b, |va, _, _| Merged::New(va + 1));
    joined.check().unwrap();
    assert_eq!(joined.size(), 96);
    // Overlap resolved through the callback, left value as the base.
    assert_eq!(joined.get(&40), Some(&401));
    // Sole-side keys keep their values.
    assert_eq!(joined.get(&5), Some(&50));
    assert_eq!(joined.get(&90), Some(&900));
}

#[test]
fn union_with_empty_is_identity() {
    let map = map_of(0..64);
    let empty = TrieMap::new();
    assert!(map.union(&empty, |_, _, _| Merged::Left).ptr_eq(&map));
    assert!(empty.union(&map, |_, _, _| Merged::Left).ptr_eq(&map));
}

#[test]
fn fold_sums_mapped_values() {
    let map = map_of(0..64);
    let ones = map.map_values(|_, _| Change::Update(1));
    let total = ones.fold(0u32, |acc, _, v| acc + v);
    assert_eq!(total, 64);
}

#[test]
fn self_intersection_with_left_bias_is_identity() {
    let map = map_of(0..100);
    let other = map.clone();
    let meet = map.intersection(&other, |_, _, _| Merged::Left);
    assert!(meet.ptr_eq(&map));
    assert_eq!(meet.size(), 100);
}

#[test]
fn intersection_keeps_shared_keys_only() {
    let a = map_of(0..20);
    let b = map_of(10..30);
    let meet = a.intersection(&b, |va, vb, _| Merged::New(va + vb));
    meet.check().unwrap();
    assert_eq!(meet.size(), 10);
    assert_eq!(meet.get(&15), Some(&300));
    assert_eq!(meet.get(&5), None);
    assert_eq!(meet.get(&25), None);
}

#[test]
fn difference_removes_the_right_operands_keys() {
    let a = map_of(0..20);
    let b = map_of(10..30);
    let rest = a.difference(&b);
    rest.check().unwrap();
    assert_eq!(rest.size(), 10);
    assert!((0..10).all(|k| rest.contains_key(&k)));
    assert!((10..20).all(|k| !rest.contains_key(&k)));

    assert!(a.difference(&a).is_empty());
    // The right operand's value type is irrelevant.
    let plan: TrieMap<u32, &str> = vec![(1, "x")].into_iter().collect();
    let rest = a.difference(&plan);
    assert_eq!(rest.size(), 19);
}

#[test]
fn difference_after_union_recovers_left_only_keys() {
    let a = map_of(0..10);
    let b = map_of(5..15);
    let joined = a.union(&b, |_, _, _| Merged::Left);
    let left_only = joined.difference(&b);
    left_only.check().unwrap();
    let mut keys: Vec<u32> = left_only.keys().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);
}

#[test]
fn difference_without_overlap_is_identity() {
    let a = map_of(0..10);
    let b = map_of(100..110);
    assert!(a.difference(&b).ptr_eq(&a));
}

#[test]
fn adjust_applies_a_plan() {
    let base = map_of(0..10);
    let plan: TrieMap<u32, &str> = vec![
        (3, "bump"),
        (7, "delete"),
        (42, "insert"),
        (1000, "skip"),
    ]
    .into_iter()
    .collect();

    let adjusted = base.adjust(&plan, |current, action, _| match *action {
        "bump" => Change::Update(current.unwrap() + 1),
        "delete" => Change::Remove,
        "insert" => Change::Update(5),
        _ => Change::Keep,
    });
    adjusted.check().unwrap();
    // One removed, one inserted: the size is back where it started.
    assert_eq!(adjusted.size(), 10);
    assert_eq!(adjusted.get(&3), Some(&31));
    assert_eq!(adjusted.get(&7), None);
    assert_eq!(adjusted.get(&42), Some(&5));
    assert_eq!(adjusted.get(&1000), None);
    assert_eq!(adjusted.get(&0), Some(&0));
}

#[test]
fn adjust_with_a_keep_only_plan_is_identity() {
    let base = map_of(0..10);
    let plan = map_of(2..5);
    assert!(base.adjust(&plan, |_, _, _| Change::Keep).ptr_eq(&base));
}

#[test]
fn map_values_keep_is_identity() {
    let map = map_of(0..50);
    assert!(map.map_values(|_, _| Change::Keep).ptr_eq(&map));
    assert!(map.collect_values(|_, _| Change::Keep).ptr_eq(&map));
}

#[test]
fn collect_values_drops_entries_and_collapses() {
    let map = map_of(0..100);
    let kept = map.collect_values(|k, v| {
        if k % 3 == 0 {
            Change::Remove
        } else {
            Change::Update(v + 1)
        }
    });
    kept.check().unwrap();
    assert_eq!(kept.size(), 66);
    assert_eq!(kept.get(&3), None);
    assert_eq!(kept.get(&4), Some(&41));
}

#[test]
fn colliding_keys_share_a_bucket_and_collapse_back() {
    let mut map: CollidingMap<u32, u32> = TrieMap::default();
    map.insert_mut(1, 10);
    map.insert_mut(2, 20);
    map.check().unwrap();
    assert_eq!(map.size(), 2);
    assert!(matches!(map.root().as_deref(), Some(Node::Collision { .. })));
    assert_eq!(map.get(&1), Some(&10));
    assert_eq!(map.get(&2), Some(&20));

    let map = map.remove(&1);
    map.check().unwrap();
    assert!(matches!(map.root().as_deref(), Some(Node::Leaf { .. })));
    assert_eq!(map.get(&2), Some(&20));

    let map = map.remove(&2);
    assert!(map.root().is_none());
    assert!(map.is_empty());
}

#[test]
fn collision_buckets_survive_bulk_operations() {
    let a: CollidingMap<u32, u32> = (0..20).map(|k| (k, k)).collect();
    let b: CollidingMap<u32, u32> = (10..30).map(|k| (k, k * 2)).collect();

    let joined = a.union(&b, |_, _, _| Merged::Left);
    joined.check().unwrap();
    assert_eq!(joined.size(), 30);
    assert_eq!(joined.get(&15), Some(&15));
    assert_eq!(joined.get(&25), Some(&50));

    let meet = a.intersection(&b, |_, vb, _| Merged::New(*vb));
    meet.check().unwrap();
    assert_eq!(meet.size(), 10);
    assert_eq!(meet.get(&12), Some(&24));

    let rest = a.difference(&b);
    rest.check().unwrap();
    assert_eq!(rest.size(), 10);
    assert!(rest.contains_key(&5));
    assert!(!rest.contains_key(&15));
}

#[test]
fn narrow_hashing_agrees_with_the_standard_map() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut reference: HashMap<u16, u16> = HashMap::new();
    let mut map: TrieMap<u16, u16, RcK, NarrowBuildHasher> = TrieMap::default();

    let mut ops: Vec<(u16, bool)> = (0..1500u16).map(|i| (i % 211, i % 3 == 0)).collect();
    ops.shuffle(&mut rng);

    for (key, is_removal) in ops {
        if is_removal {
            reference.remove(&key);
            map.remove_mut(&key);
        } else {
            reference.insert(key, key.wrapping_add(7));
            map.insert_mut(key, key.wrapping_add(7));
        }
    }

    map.check().unwrap();
    assert_eq!(map.size(), reference.len());
    for (k, v) in &reference {
        assert_eq!(map.get(k), Some(v));
    }
    assert_eq!(map.iter().count(), reference.len());
}

#[test]
fn random_ops_agree_with_the_standard_map() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut reference: HashMap<u32, u32> = HashMap::new();
    let mut map: TrieMap<u32, u32> = TrieMap::new();

    let mut ops: Vec<(u32, bool)> = (0..4000u32).map(|i| (i % 977, i % 4 == 0)).collect();
    ops.shuffle(&mut rng);

    for (key, is_removal) in ops {
        if is_removal {
            reference.remove(&key);
            map.remove_mut(&key);
        } else {
            reference.insert(key, key ^ 0xdead);
            map.insert_mut(key, key ^ 0xdead);
        }
    }

    map.check().unwrap();
    assert_eq!(map.size(), reference.len());
    for (k, v) in &reference {
        assert_eq!(map.get(k), Some(v));
    }
}

#[test]
fn alter_round_trips_through_all_outcomes() {
    let map = map_of(0..10);
    assert!(map.alter(5, |_| Change::Keep).ptr_eq(&map));
    assert!(map.alter(99, |_| Change::Remove).ptr_eq(&map));

    let bumped = map.alter(5, |v| Change::Update(v.unwrap() + 1));
    assert_eq!(bumped.get(&5), Some(&51));
    assert_eq!(bumped.size(), 10);

    let grown = map.alter(99, |v| {
        assert!(v.is_none());
        Change::Update(0)
    });
    assert_eq!(grown.size(), 11);

    let shrunk = map.alter(5, |_| Change::Remove);
    assert_eq!(shrunk.size(), 9);
    shrunk.check().unwrap();
}

#[test]
fn iteration_covers_every_entry_exactly_once() {
    let map = map_of(0..500);
    let mut seen: Vec<u32> = map.keys().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..500).collect::<Vec<u32>>());
}

#[test]
fn serde_round_trip() {
    let map = map_of(0..40);
    let encoded = serde_json::to_string(&map).unwrap();
    let decoded: TrieMap<u32, u32> = serde_json::from_str(&encoded).unwrap();
    assert_eq!(map, decoded);
    decoded.check().unwrap();
}

#[test]
fn sync_maps_cross_threads() {
    let map: shale_hamt::TrieMapSync<u32, u32> = (0..64).map(|k| (k, 1)).collect();
    let handle = std::thread::spawn(move || map.fold(0u32, |acc, _, v| acc + v));
    assert_eq!(handle.join().unwrap(), 64);
}
