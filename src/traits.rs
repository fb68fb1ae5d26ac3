//! Capability traits for the two containers.
//!
//! - [`Dictionary`]: keyed lookup with a read-only `get` that fails on a
//!   missing key and an auto-vivifying `get_or_default`.
//! - [`PriorityQueue`]: min-first queue access (`peek`, `enqueue`,
//!   `dequeue`).
//!
//! Code that only needs one of these capabilities can be written against
//! the trait instead of the concrete type.

use crate::error::Error;
use crate::indexed_queue::IndexedPriorityQueue;
use crate::probe_hash_map::ProbeHashMap;
use core::hash::{BuildHasher, Hash};

/// A set of unique keys, each with an associated value.
///
/// # Example
///
/// ```rust
/// use newsfeed::{Dictionary, ProbeHashMap};
///
/// fn tally<D: Dictionary<String, u32>>(d: &mut D, words: &[&str]) {
///     for w in words {
///         *d.get_or_default(w.to_string()) += 1;
///     }
/// }
///
/// let mut m = ProbeHashMap::new();
/// tally(&mut m, &["a", "b", "a"]);
/// assert_eq!(Dictionary::get(&m, &"a".to_string()), Ok(&2));
/// ```
pub trait Dictionary<K, V> {
    /// True iff `key` is currently present.
    fn has(&self, key: &K) -> bool;

    /// Value for `key`; `Err(Error::NotFound)` when absent. Never inserts.
    fn get(&self, key: &K) -> Result<&V, Error>;

    /// Modifiable value for `key`, inserting `V::default()` first when
    /// absent.
    fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default;

    /// Associate `value` with `key`, discarding any prior value.
    fn add(&mut self, key: K, value: V);

    /// Make `key` absent. Removing a missing key does nothing.
    fn remove(&mut self, key: &K);
}

impl<K, V, S> Dictionary<K, V> for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn has(&self, key: &K) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &K) -> Result<&V, Error> {
        ProbeHashMap::get(self, key)
    }

    fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        ProbeHashMap::get_or_default(self, key)
    }

    fn add(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn remove(&mut self, key: &K) {
        ProbeHashMap::remove(self, key);
    }
}

/// Min-first queue of keys carrying a payload and an ordered weight.
///
/// Only the entry with the smallest weight is reachable through the
/// trait; ties are broken arbitrarily.
pub trait PriorityQueue {
    type Key;
    type Payload;
    type Weight: Ord;

    /// Key with the smallest weight; `Err(Error::EmptyQueue)` when empty.
    fn peek(&self) -> Result<&Self::Key, Error>;

    fn enqueue(
        &mut self,
        key: Self::Key,
        payload: Self::Payload,
        weight: Self::Weight,
    ) -> Result<(), Error>;

    /// Remove and return the entry with the smallest weight.
    fn dequeue(&mut self) -> Result<(Self::Key, Self::Payload, Self::Weight), Error>;

    fn is_empty(&self) -> bool;

    /// Dequeue everything.
    fn clear(&mut self);
}

impl<K, V, W, S> PriorityQueue for IndexedPriorityQueue<K, V, W, S>
where
    K: Eq + Hash + Clone,
    W: Ord + Copy,
    S: BuildHasher + Clone,
{
    type Key = K;
    type Payload = V;
    type Weight = W;

    fn peek(&self) -> Result<&K, Error> {
        IndexedPriorityQueue::peek(self)
    }

    fn enqueue(&mut self, key: K, payload: V, weight: W) -> Result<(), Error> {
        IndexedPriorityQueue::enqueue(self, key, payload, weight)
    }

    fn dequeue(&mut self) -> Result<(K, V, W), Error> {
        IndexedPriorityQueue::dequeue(self)
    }

    fn is_empty(&self) -> bool {
        IndexedPriorityQueue::is_empty(self)
    }

    fn clear(&mut self) {
        IndexedPriorityQueue::clear(self)
    }
}
