//! Small map with inline storage and a one-way spill to a hash map
//!
//! Up to `N` entries live inline in a `SmallVec`, newest first, so the
//! common case of a handful of keys (and repeated hits on the most recent
//! one) is a short linear scan with no allocation. Inserting the `N + 1`th
//! distinct key moves every entry into an `FxHashMap`; from then on all
//! lookups are hashed. The map never moves back inline.
//!
//! There is no removal. `clear` drops every value and starts over inline.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::hash::Hash;

enum Repr<K, V, const N: usize> {
    Inline(SmallVec<[(K, V); N]>),
    Spilled(FxHashMap<K, V>),
}

/// Insert/lookup map tuned for very small key counts
pub struct SmallMap<K, V, const N: usize> {
    repr: Repr<K, V, N>,
}

impl<K, V, const N: usize> SmallMap<K, V, N>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty map
    pub fn new() -> Self {
        SmallMap {
            repr: Repr::Inline(SmallVec::new()),
        }
    }

    /// Insert `value` under `key`.
    ///
    /// Returns `Some(value)` untouched if `key` is already present; the
    /// existing entry is kept.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.repr {
            Repr::Spilled(map) => {
                if map.contains_key(&key) {
                    return Some(value);
                }
                map.insert(key, value);
                None
            }
            Repr::Inline(entries) => {
                if entries.iter().any(|(k, _)| *k == key) {
                    return Some(value);
                }
                if entries.len() < N {
                    entries.insert(0, (key, value));
                    return None;
                }
                let mut map = FxHashMap::with_capacity_and_hasher(N * 2 + 1, Default::default());
                map.extend(entries.drain(..));
                map.insert(key, value);
                self.repr = Repr::Spilled(map);
                None
            }
        }
    }

    /// Whether `key` is present
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        match &self.repr {
            Repr::Inline(entries) => entries.iter().any(|(k, _)| k == key),
            Repr::Spilled(map) => map.contains_key(key),
        }
    }

    /// Value stored under `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.repr {
            Repr::Inline(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Repr::Spilled(map) => map.get(key),
        }
    }

    /// Number of distinct keys
    #[inline]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline(entries) => entries.len(),
            Repr::Spilled(map) => map.len(),
        }
    }

    /// True if no key was inserted since creation or the last `clear`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the map has moved to hashed storage
    #[inline]
    pub fn is_spilled(&self) -> bool {
        matches!(self.repr, Repr::Spilled(_))
    }

    /// Iterate over keys. Inline order is newest first; spilled order is
    /// unspecified.
    pub fn keys(&self) -> Box<dyn Iterator<Item = K> + '_> {
        match &self.repr {
            Repr::Inline(entries) => Box::new(entries.iter().map(|(k, _)| *k)),
            Repr::Spilled(map) => Box::new(map.keys().copied()),
        }
    }

    /// Drop every entry and return to inline storage
    pub fn clear(&mut self) {
        self.repr = Repr::Inline(SmallVec::new());
    }
}

impl<K, V, const N: usize> Default for SmallMap<K, V, N>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const N: usize> std::fmt::Debug for SmallMap<K, V, N>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmallMap")
            .field("spilled", &self.is_spilled())
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
