//! IndexedPriorityQueue: binary min-heap with O(1) key lookup and
//! O(log n) reweight-by-key.
//!
//! The heap array holds keys only. Three `ProbeHashMap`s keyed by the
//! same keys hold the payload, the current weight and the heap position
//! of every enqueued key. Positions are 1-based (root is 1, children of
//! p are 2p and 2p+1); position p lives at `heap[p - 1]`.
//!
//! Invariants, checked by the property tests after every operation:
//! - heap property: `weight(parent) <= weight(child)` for every child.
//! - location consistency: `locations[heap[p]] == p` for every position,
//!   so every enqueued key is in the heap exactly once.
//! - the three maps and the heap hold the same key set.
//!
//! Every exchange of two heap positions goes through `swap`, which
//! rewrites both keys' locations together with the array.

use crate::error::Error;
use crate::probe_hash_map::{Keys, ProbeHashMap};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use tracing::{debug, trace};

/// Unique key of a news item.
pub type Headline = String;
/// Payload text of a news item.
pub type Story = String;
/// Priority of a news item; lower values dequeue first.
pub type Staleness = i32;

/// The news-feed instantiation: headlines ordered by staleness.
///
/// # Example
///
/// ```rust
/// use newsfeed::NewsFeed;
///
/// let mut feed: NewsFeed = NewsFeed::new();
/// feed.enqueue("Flash".into(), "story of a fast dude".into(), 1).unwrap();
/// feed.enqueue("L".into(), "LLL story".into(), -1).unwrap();
/// assert_eq!(feed.peek().unwrap(), "L");
///
/// feed.reweight("L", 4).unwrap();
/// assert_eq!(feed.peek().unwrap(), "Flash");
/// assert_eq!(feed.get("Flash").unwrap(), "story of a fast dude");
/// ```
pub type NewsFeed<S = DefaultHashBuilder> = IndexedPriorityQueue<Headline, Story, Staleness, S>;

const ROOT: usize = 1;

#[inline]
fn parent(child: usize) -> usize {
    child / 2
}

#[inline]
fn left(p: usize) -> usize {
    p * 2
}

#[inline]
fn right(p: usize) -> usize {
    left(p) + 1
}

/// Min-heap over keys `K` ordered by weights `W`, carrying payloads `V`.
pub struct IndexedPriorityQueue<K, V, W, S = DefaultHashBuilder> {
    heap: Vec<K>,
    // Logical storage size; grows to 2 * capacity + 17 when full.
    capacity: usize,
    payloads: ProbeHashMap<K, V, S>,
    weights: ProbeHashMap<K, W, S>,
    locations: ProbeHashMap<K, usize, S>,
}

impl<K, V, W> IndexedPriorityQueue<K, V, W>
where
    K: Eq + Hash + Clone,
    W: Ord + Copy,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, W, S> Default for IndexedPriorityQueue<K, V, W, S>
where
    K: Eq + Hash + Clone,
    W: Ord + Copy,
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, W, S> IndexedPriorityQueue<K, V, W, S>
where
    K: Eq + Hash + Clone,
    W: Ord + Copy,
    S: BuildHasher + Clone,
{
    /// Empty queue whose three maps all hash with clones of `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            heap: Vec::new(),
            capacity: 0,
            payloads: ProbeHashMap::with_hasher(hasher.clone()),
            weights: ProbeHashMap::with_hasher(hasher.clone()),
            locations: ProbeHashMap::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// True iff `key` is currently enqueued.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locations.contains_key(key)
    }

    /// Add `key` with `payload` at `weight`.
    ///
    /// If `key` is already enqueued its payload is replaced and it is
    /// reweighted in place; the queue never holds a key twice.
    pub fn enqueue(&mut self, key: K, payload: V, weight: W) -> Result<(), Error> {
        if self.locations.contains_key(&key) {
            trace!("enqueue of a live key; replacing payload and reweighting");
            self.payloads.insert(key.clone(), payload);
            return self.reweight(&key, weight);
        }
        if self.heap.len() == self.capacity {
            self.grow();
        }
        let pos = self.heap.len() + 1;
        self.payloads.insert(key.clone(), payload);
        self.weights.insert(key.clone(), weight);
        self.locations.insert(key.clone(), pos);
        self.heap.push(key);
        self.bubble(pos)?;
        Ok(())
    }

    /// Key with the smallest weight. O(1).
    pub fn peek(&self) -> Result<&K, Error> {
        self.heap.first().ok_or(Error::EmptyQueue)
    }

    /// Remove the key with the smallest weight and return it with its
    /// payload and weight.
    pub fn dequeue(&mut self) -> Result<(K, V, W), Error> {
        let last = self.heap.len();
        if last == 0 {
            return Err(Error::EmptyQueue);
        }
        self.swap(ROOT, last);
        let key = self.heap.pop().ok_or(Error::EmptyQueue)?;
        self.locations.remove(&key);
        let weight = self.weights.remove(&key).ok_or(Error::NotFound)?;
        let payload = self.payloads.remove(&key).ok_or(Error::NotFound)?;
        if !self.heap.is_empty() {
            self.percolate(ROOT)?;
        }
        Ok((key, payload, weight))
    }

    /// Current weight of an enqueued key.
    pub fn weight<Q>(&self, key: &Q) -> Result<W, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.weights.get(key).copied()
    }

    /// Change the weight of an enqueued key and restore heap order.
    ///
    /// A heavier key can only violate the heap property towards its
    /// children, a lighter one only towards its parent, so one sift in
    /// the matching direction is enough.
    pub fn reweight<Q>(&mut self, key: &Q, weight: W) -> Result<(), Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = *self.locations.get(key)?;
        let slot = self.weights.get_mut(key)?;
        let old = core::mem::replace(slot, weight);

        let settled = if weight > old {
            trace!(from = pos, "reweight heavier; sifting down");
            self.percolate(pos)?
        } else {
            trace!(from = pos, "reweight lighter or equal; sifting up");
            self.bubble(pos)?
        };
        debug_assert_eq!(self.locations.get(key).ok(), Some(&settled));
        Ok(())
    }

    /// Payload of an enqueued key.
    pub fn get<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.payloads.get(key)
    }

    /// Enqueued keys in arbitrary order (not heap order).
    pub fn iter(&self) -> Keys<'_, K, V> {
        self.payloads.keys()
    }

    /// Dequeue everything. Storage capacity is kept.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.payloads.clear();
        self.weights.clear();
        self.locations.clear();
    }

    fn grow(&mut self) {
        let capacity = 2 * self.capacity + 17;
        self.heap.reserve_exact(capacity - self.heap.len());
        debug!(
            old_capacity = self.capacity,
            capacity, "growing heap storage"
        );
        self.capacity = capacity;
    }

    fn key_at(&self, pos: usize) -> &K {
        &self.heap[pos - 1]
    }

    fn value(&self, pos: usize) -> Result<W, Error> {
        self.weights.get(self.key_at(pos)).copied()
    }

    fn valid(&self, pos: usize) -> bool {
        pos >= ROOT && pos <= self.heap.len()
    }

    fn is_leaf(&self, pos: usize) -> bool {
        !self.valid(left(pos))
    }

    fn has_right(&self, pos: usize) -> bool {
        self.valid(right(pos))
    }

    /// Exchange two positions and record both keys' new locations.
    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i - 1, j - 1);
        self.set_location(i);
        self.set_location(j);
    }

    fn set_location(&mut self, pos: usize) {
        let key = &self.heap[pos - 1];
        let slot = self.locations.get_mut(key);
        debug_assert!(slot.is_ok(), "heap key missing from location map");
        if let Ok(slot) = slot {
            *slot = pos;
        }
    }

    /// Sift-up from `child`; returns the position it settles at.
    fn bubble(&mut self, mut child: usize) -> Result<usize, Error> {
        while child != ROOT && self.value(child)? < self.value(parent(child))? {
            let p = parent(child);
            self.swap(child, p);
            child = p;
        }
        Ok(child)
    }

    /// Sift-down from `p`; returns the position it settles at.
    fn percolate(&mut self, mut p: usize) -> Result<usize, Error> {
        while !self.is_leaf(p) {
            let mut child = left(p);
            if self.has_right(p) && self.value(right(p))? < self.value(child)? {
                child = right(p);
            }
            if self.value(p)? <= self.value(child)? {
                break;
            }
            self.swap(child, p);
            p = child;
        }
        Ok(p)
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let n = self.heap.len();
        assert!(n <= self.capacity, "heap overran its storage");
        assert_eq!(self.payloads.len(), n);
        assert_eq!(self.weights.len(), n);
        assert_eq!(self.locations.len(), n);
        for pos in ROOT..=n {
            let key = self.key_at(pos);
            assert_eq!(self.locations.get(key), Ok(&pos), "location out of sync");
            assert!(self.payloads.contains_key(key));
            if pos != ROOT {
                let (w, pw) = (self.value(pos).unwrap(), self.value(parent(pos)).unwrap());
                assert!(pw <= w, "heap property violated at position {pos}");
            }
        }
        self.payloads.assert_invariants();
        self.weights.assert_invariants();
        self.locations.assert_invariants();
    }
}

impl<'a, K, V, W, S> IntoIterator for &'a IndexedPriorityQueue<K, V, W, S>
where
    K: Eq + Hash + Clone,
    W: Ord + Copy,
    S: BuildHasher + Clone,
{
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, W, S> fmt::Debug for IndexedPriorityQueue<K, V, W, S>
where
    K: fmt::Debug,
{
    // Heap order, root first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedPriorityQueue")
            .field("heap", &self.heap)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn feed_with(items: &[(&str, Staleness)]) -> NewsFeed {
        let mut feed: NewsFeed = NewsFeed::new();
        for (h, w) in items {
            feed.enqueue((*h).to_string(), format!("{h} story"), *w)
                .unwrap();
        }
        feed.assert_invariants();
        feed
    }

    #[test]
    fn empty_queue_reports_empty() {
        let mut feed: NewsFeed = NewsFeed::new();
        assert!(feed.is_empty());
        assert_eq!(feed.peek(), Err(Error::EmptyQueue));
        assert_eq!(feed.dequeue(), Err(Error::EmptyQueue));
        assert_eq!(feed.weight("x"), Err(Error::NotFound));
        assert_eq!(feed.get("x"), Err(Error::NotFound));
        assert_eq!(feed.reweight("x", 1), Err(Error::NotFound));
    }

    /// Invariant: a key appended without any swap is recorded at its own
    /// position (n + 1), not at n.
    #[test]
    fn enqueue_without_swaps_records_location() {
        let feed = feed_with(&[("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(feed.locations.get("c"), Ok(&3));
        assert_eq!(feed.locations.get("b"), Ok(&2));
    }

    #[test]
    fn headline_scenario() {
        let mut feed = feed_with(&[("Flash", 1), ("J", 2), ("K", 3), ("L", -1)]);
        assert_eq!(feed.peek().unwrap(), "L");
        feed.reweight("L", 4).unwrap();
        feed.assert_invariants();

        let mut order = vec![];
        while let Ok(h) = feed.peek() {
            let h = h.clone();
            order.push((h.clone(), feed.weight(&h).unwrap()));
            feed.dequeue().unwrap();
            feed.assert_invariants();
        }
        assert_eq!(
            order,
            vec![
                ("Flash".to_string(), 1),
                ("J".to_string(), 2),
                ("K".to_string(), 3),
                ("L".to_string(), 4)
            ]
        );
        assert!(feed.is_empty());
    }

    /// Invariant: dequeue hands back the removed entry and forgets it in
    /// every map.
    #[test]
    fn dequeue_returns_and_forgets_entry() {
        let mut feed = feed_with(&[("a", 5), ("b", 1)]);
        let (h, story, w) = feed.dequeue().unwrap();
        assert_eq!((h.as_str(), story.as_str(), w), ("b", "b story", 1));
        assert!(!feed.contains("b"));
        assert_eq!(feed.get("b"), Err(Error::NotFound));
        assert_eq!(feed.weight("b"), Err(Error::NotFound));
        assert_eq!(feed.len(), 1);
        feed.assert_invariants();
    }

    #[test]
    fn reweight_lighter_moves_to_root() {
        let mut feed = feed_with(&[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);
        feed.reweight("e", 0).unwrap();
        feed.assert_invariants();
        assert_eq!(feed.peek().unwrap(), "e");
        assert_eq!(feed.weight("e"), Ok(0));
    }

    #[test]
    fn reweight_heavier_sinks_root() {
        let mut feed = feed_with(&[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);
        feed.reweight("a", 10).unwrap();
        feed.assert_invariants();
        assert_eq!(feed.peek().unwrap(), "b");
        assert_eq!(feed.weight("a"), Ok(10));
    }

    #[test]
    fn reweight_to_same_weight_is_stable() {
        let mut feed = feed_with(&[("a", 1), ("b", 1), ("c", 1)]);
        let before = feed.heap.clone();
        feed.reweight("c", 1).unwrap();
        assert_eq!(feed.heap, before, "equal weights never swap");
        feed.assert_invariants();
    }

    /// Invariant: enqueueing a live key updates it in place instead of
    /// adding a second heap slot.
    #[test]
    fn enqueue_existing_key_reweights_in_place() {
        let mut feed = feed_with(&[("a", 1), ("b", 2)]);
        feed.enqueue("a".to_string(), "new a story".to_string(), 7)
            .unwrap();
        feed.assert_invariants();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.get("a").map(String::as_str), Ok("new a story"));
        assert_eq!(feed.peek().unwrap(), "b");
    }

    /// Invariant: heap storage grows 0 -> 17 -> 51 and never below the
    /// number of entries.
    #[test]
    fn storage_grows_by_doubling_plus_seventeen() {
        let mut feed: NewsFeed = NewsFeed::new();
        assert_eq!(feed.capacity, 0);
        feed.enqueue("0".into(), String::new(), 0).unwrap();
        assert_eq!(feed.capacity, 17);
        for i in 1..18 {
            feed.enqueue(i.to_string(), String::new(), -i).unwrap();
        }
        assert_eq!(feed.capacity, 51);
        feed.assert_invariants();
    }

    #[test]
    fn iteration_lists_enqueued_headlines() {
        let mut feed = feed_with(&[("x", 3), ("y", 1), ("z", 2)]);
        feed.dequeue().unwrap();
        let seen: BTreeSet<&str> = feed.iter().map(String::as_str).collect();
        assert_eq!(seen, BTreeSet::from(["x", "z"]));
        assert_eq!((&feed).into_iter().count(), 2);
    }

    #[test]
    fn clear_empties_everything() {
        let mut feed = feed_with(&[("x", 3), ("y", 1)]);
        feed.clear();
        assert!(feed.is_empty());
        assert!(!feed.contains("x"));
        assert_eq!(feed.iter().count(), 0);
        feed.enqueue("z".into(), String::new(), 0).unwrap();
        feed.assert_invariants();
    }

    #[test]
    fn debug_shows_heap_order() {
        let feed = feed_with(&[("b", 2), ("a", 1)]);
        assert_eq!(
            format!("{feed:?}"),
            r#"IndexedPriorityQueue { heap: ["a", "b"], .. }"#
        );
    }
}
