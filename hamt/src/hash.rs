// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use core::hash::{BuildHasher, Hash, Hasher};

/// Hash a key down to the 32 bits the trie consumes.
///
/// The hasher config is a value owned by the map wrapper, so two maps
/// only agree on key placement when built with the same config.
pub fn hash_key<K, H>(key: &K, hasher: &H) -> u32
where
    K: Hash + ?Sized,
    H: BuildHasher,
{
    let mut state = hasher.build_hasher();
    key.hash(&mut state);
    state.finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::DefaultBuildHasher;

    #[test]
    fn default_hasher_is_deterministic() {
        let hasher = DefaultBuildHasher::default();
        assert_eq!(hash_key("abcd", &hasher), hash_key("abcd", &hasher));
        assert_ne!(hash_key("abcd", &hasher), hash_key("abce", &hasher));
    }
}
