// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use shale_tree::{Change, Merged, TreeMap};

fn map_of(range: std::ops::RangeInclusive<u32>) -> TreeMap<u32, u32> {
    range.map(|k| (k, k * 10)).collect()
}

#[test]
fn shuffled_inserts_iterate_in_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut keys: Vec<u32> = (1..=100).collect();
    keys.shuffle(&mut rng);

    let mut map = TreeMap::new();
    for k in &keys {
        map.insert_mut(*k, k * 2);
        map.check().unwrap();
    }

    assert_eq!(map.size(), 100);
    let seen: Vec<u32> = map.keys().copied().collect();
    let expected: Vec<u32> = (1..=100).collect();
    assert_eq!(seen, expected);
}

#[test]
fn persistent_insert_leaves_the_original_alone() {
    let map = map_of(1..=20);
    let bigger = map.insert(999, 0);
    assert_eq!(map.size(), 20);
    assert_eq!(bigger.size(), 21);
    assert_eq!(map.get(&999), None);
    assert_eq!(bigger.get(&999), Some(&0));
}

#[test]
fn insert_then_remove_restores_content() {
    let map = map_of(1..=50);
    let back = map.insert(777, 1).remove(&777);
    assert_eq!(map, back);
    back.check().unwrap();
}

#[test]
fn noop_alterations_are_identity() {
    let map = map_of(1..=30);
    // Deleting an absent key.
    assert!(map.remove(&1000).ptr_eq(&map));
    // Keeping an existing value.
    assert!(map.alter(7, |_| Change::Keep).ptr_eq(&map));
    // Keeping an absent key absent.
    assert!(map.alter(1000, |_| Change::Keep).ptr_eq(&map));
    assert!(map.alter(1000, |_| Change::Remove).ptr_eq(&map));
}

#[test]
fn union_with_empty_is_identity() {
    let map = map_of(1..=40);
    let empty = TreeMap::new();
    assert!(map.union(&empty, |_, _, _| Merged::Left).ptr_eq(&map));
    assert!(empty.union(&map, |_, _, _| Merged::Left).ptr_eq(&map));
}

#[test]
fn self_intersection_with_left_bias_is_identity() {
    let map = map_of(1..=40);
    let other = map.clone();
    let meet = map.intersection(&other, |_, _, _| Merged::Left);
    assert!(meet.ptr_eq(&map));
}

#[test]
fn union_resolves_overlaps() {
    let a = map_of(1..=10);
    let b = map_of(5..=15);
    let joined = a.union(&b, |va, vb, _| Merged::New(va + vb));
    joined.check().unwrap();
    assert_eq!(joined.size(), 15);
    assert_eq!(joined.get(&3), Some(&30));
    assert_eq!(joined.get(&7), Some(&140));
    assert_eq!(joined.get(&12), Some(&120));
}

#[test]
fn difference_of_a_union_recovers_the_left_only_keys() {
    let a = map_of(1..=10);
    let b = map_of(5..=15);
    let joined = a.union(&b, |_, _, _| Merged::Left);
    let left_only = joined.difference(&b);
    left_only.check().unwrap();
    let keys: Vec<u32> = left_only.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 4]);
    assert!(a.difference(&a).is_empty());
}

#[test]
fn difference_without_overlap_is_identity() {
    let a = map_of(1..=10);
    let b = map_of(100..=110);
    assert!(a.difference(&b).ptr_eq(&a));
}

#[test]
fn symmetric_difference_of_overlapping_ranges() {
    let a = map_of(1..=10);
    let b = map_of(5..=15);
    let sym = a.symmetric_difference(&b);
    sym.check().unwrap();
    let keys: Vec<u32> = sym.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 11, 12, 13, 14, 15]);
    assert_eq!(sym, b.symmetric_difference(&a));
}

#[test]
fn intersection_keeps_only_shared_keys() {
    let a = map_of(1..=10);
    let b = map_of(5..=15);
    let meet = a.intersection(&b, |_, vb, _| Merged::New(vb + 1));
    meet.check().unwrap();
    let keys: Vec<u32> = meet.keys().copied().collect();
    assert_eq!(keys, vec![5, 6, 7, 8, 9, 10]);
    assert_eq!(meet.get(&5), Some(&51));
}

#[test]
fn adjust_applies_a_plan() {
    let base = map_of(1..=10);
    // The plan bumps 3, deletes 7, inserts 42 and leaves 1000 alone.
    let plan: TreeMap<u32, &str> = vec![
        (3, "bump"),
        (7, "delete"),
        (42, "insert"),
        (1000, "skip"),
    ]
    .into_iter()
    .collect();

    let adjusted = base.adjust(&plan, |current, action, _k| match *action {
        "bump" => Change::Update(current.unwrap() + 1),
        "delete" => Change::Remove,
        "insert" => Change::Update(5),
        _ => Change::Keep,
    });
    adjusted.check().unwrap();
    assert_eq!(adjusted.size(), 10);
    assert_eq!(adjusted.get(&3), Some(&31));
    assert_eq!(adjusted.get(&7), None);
    assert_eq!(adjusted.get(&42), Some(&5));
    assert_eq!(adjusted.get(&1000), None);
    // Untouched keys survive.
    assert_eq!(adjusted.get(&1), Some(&10));
}

#[test]
fn adjust_with_a_keep_only_plan_is_identity() {
    let base = map_of(1..=10);
    let plan: TreeMap<u32, u32> = map_of(3..=6);
    assert!(base.adjust(&plan, |_, _, _| Change::Keep).ptr_eq(&base));
}

#[test]
fn map_values_keep_is_identity() {
    let map = map_of(1..=25);
    assert!(map.map_values(|_, _| Change::Keep).ptr_eq(&map));
    assert!(map.collect_values(|_, _| Change::Keep).ptr_eq(&map));
}

#[test]
fn collect_values_filters_and_rebalances() {
    let map = map_of(1..=100);
    let odd = map.collect_values(|k, v| {
        if k % 2 == 0 {
            Change::Remove
        } else {
            Change::Update(v + 1)
        }
    });
    odd.check().unwrap();
    assert_eq!(odd.size(), 50);
    assert_eq!(odd.get(&2), None);
    assert_eq!(odd.get(&3), Some(&31));
}

#[test]
fn partition_splits_and_balances() {
    let map = map_of(1..=60);
    let (small, large) = map.partition(|k, _| *k <= 30);
    small.check().unwrap();
    large.check().unwrap();
    assert_eq!(small.size(), 30);
    assert_eq!(large.size(), 30);
    assert!(small.keys().all(|k| *k <= 30));
    assert!(large.keys().all(|k| *k > 30));
    // An all-accepting predicate keeps the original root.
    let (everything, nothing) = map.partition(|_, _| true);
    assert!(everything.ptr_eq(&map));
    assert!(nothing.is_empty());
}

#[test]
fn rank_and_select_agree() {
    let map = map_of(10..=50);
    for k in 10..=50 {
        let rank = map.index_of(&k).unwrap();
        let (k2, v2) = map.get_by_index(rank).unwrap();
        assert_eq!(*k2, k);
        assert_eq!(v2, map.get(&k).unwrap());
    }
    assert_eq!(map.index_of(&9), None);
    assert_eq!(map.get_by_index(map.size()), None);
}

#[test]
fn take_and_skip_cut_by_rank() {
    let map = map_of(1..=30);
    let front = map.take(10);
    let back = map.skip(10);
    front.check().unwrap();
    back.check().unwrap();
    assert_eq!(front.keys().copied().collect::<Vec<u32>>(), (1..=10).collect::<Vec<u32>>());
    assert_eq!(back.keys().copied().collect::<Vec<u32>>(), (11..=30).collect::<Vec<u32>>());
    assert!(map.take(map.size()).ptr_eq(&map));
    assert!(map.skip(0).ptr_eq(&map));
    assert!(map.skip(map.size()).is_empty());
}

#[test]
fn alter_by_index_edits_in_rank_order() {
    let map = map_of(1..=10);
    let bumped = map.alter_by_index(0, |_, v| Change::Update(v + 1));
    assert_eq!(bumped.get(&1), Some(&11));
    let shorter = map.alter_by_index(9, |_, _| Change::Remove);
    shorter.check().unwrap();
    assert_eq!(shorter.size(), 9);
    assert_eq!(shorter.get(&10), None);
    assert!(map.alter_by_index(10, |_, _| Change::Remove).ptr_eq(&map));
}

#[test]
fn subset_and_disjointness() {
    let a = map_of(3..=6);
    let b = map_of(1..=10);
    let c = map_of(20..=30);
    assert!(a.is_key_subset(&b));
    assert!(!b.is_key_subset(&a));
    assert!(a.is_disjoint(&c));
    assert!(!a.is_disjoint(&b));
    assert!(TreeMap::<u32, u32>::new().is_key_subset(&a));
}

#[test]
fn split_partitions_around_the_key() {
    let map = map_of(1..=20);
    let (below, matched, above) = map.split(&10);
    below.check().unwrap();
    above.check().unwrap();
    assert_eq!(below.size(), 9);
    assert_eq!(above.size(), 10);
    let entry = matched.unwrap();
    assert_eq!(entry.key, 10);
    assert_eq!(entry.value, 100);

    let (_, missing, _) = map.split(&1000);
    assert!(missing.is_none());
}

#[test]
fn min_and_max_views() {
    let map = map_of(5..=15);
    assert_eq!(map.first(), Some((&5, &50)));
    assert_eq!(map.last(), Some((&15, &150)));

    let (entry, rest) = shale_tree::min_view(map.root()).unwrap();
    assert_eq!(entry.key, 5);
    assert_eq!(shale_tree::size(&rest), 10);
    shale_tree::check(&rest).unwrap();

    let (entry, rest) = shale_tree::max_view(map.root()).unwrap();
    assert_eq!(entry.key, 15);
    assert_eq!(shale_tree::size(&rest), 10);
    shale_tree::check(&rest).unwrap();
}

#[test]
fn fold_accumulates_in_key_order() {
    let map = map_of(1..=10);
    let keys = map.fold(Vec::new(), |mut acc, k, _| {
        acc.push(*k);
        acc
    });
    assert_eq!(keys, (1..=10).collect::<Vec<u32>>());
}

#[test]
fn random_ops_agree_with_the_standard_map() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut reference: BTreeMap<u16, u16> = BTreeMap::new();
    let mut map: TreeMap<u16, u16> = TreeMap::new();

    let mut ops: Vec<(u16, bool)> = (0..2000u16)
        .map(|i| (i % 331, i % 3 == 0))
        .collect();
    ops.shuffle(&mut rng);

    for (key, is_removal) in ops {
        if is_removal {
            reference.remove(&key);
            map.remove_mut(&key);
        } else {
            reference.insert(key, key.wrapping_mul(3));
            map.insert_mut(key, key.wrapping_mul(3));
        }
    }

    map.check().unwrap();
    assert_eq!(map.size(), reference.len());
    for (k, v) in &reference {
        assert_eq!(map.get(k), Some(v));
    }
    let collected: Vec<(u16, u16)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u16, u16)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(collected, expected);
}

#[test]
fn serde_round_trip() {
    let map = map_of(1..=20);
    let encoded = serde_json::to_string(&map).unwrap();
    let decoded: TreeMap<u32, u32> = serde_json::from_str(&encoded).unwrap();
    assert_eq!(map, decoded);
    decoded.check().unwrap();
}

#[test]
fn sync_maps_cross_threads() {
    let map: shale_tree::TreeMapSync<u32, u32> = (1..=64).map(|k| (k, k)).collect();
    let handle = std::thread::spawn(move || map.fold(0u32, |acc, _, v| acc + v));
    assert_eq!(handle.join().unwrap(), (1..=64).sum::<u32>());
}
