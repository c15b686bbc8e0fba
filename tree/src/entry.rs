// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use archery::{SharedPointer, SharedPointerKind};

/// A key/value pair behind a single shared pointer.
///
/// Nodes hold entries by pointer, so path copies move one reference and
/// never clone the key or the value.
#[derive(Debug)]
pub struct Entry<K, V> {
    /// The key; immutable for the lifetime of the entry.
    pub key: K,
    /// The stored value.
    pub value: V,
}

impl<K, V> Entry<K, V> {
    /// Create an entry.
    pub fn new(key: K, value: V) -> Self {
        Entry { key, value }
    }
}

/// Shared handle to an [`Entry`].
pub type EntryRef<K, V, P> = SharedPointer<Entry<K, V>, P>;

/// Pointer identity of two entry handles.
pub fn same_entry<K, V, P: SharedPointerKind>(
    a: &EntryRef<K, V, P>,
    b: &EntryRef<K, V, P>,
) -> bool {
    core::ptr::eq::<Entry<K, V>>(&**a, &**b)
}
