// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

/// Outcome of a value-level callback.
///
/// `Keep` is the explicit form of "return the value you were given":
/// the containing entry, and therefore every node on the path to it,
/// is reused by reference and the root comes back pointer-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<V> {
    /// Leave the entry exactly as it is (a no-op for an absent key).
    Keep,
    /// Insert or replace the value for the key.
    Update(V),
    /// Delete the entry (a no-op for an absent key).
    Remove,
}

/// Resolution of a key present in both operands of a bulk merge.
///
/// `Left` and `Right` reuse the corresponding operand's entry without
/// allocating, so a merge that always answers `Left` leaves the left
/// operand's subtrees shared wherever possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merged<V> {
    /// Keep the left operand's value.
    Left,
    /// Take the right operand's value.
    Right,
    /// Store a freshly computed value.
    New(V),
}
