//! ProbeHashMap: open-addressing table with linear probing, tombstones and
//! prime capacities.
//!
//! Each occupied slot keeps the key's precomputed hash, so growing the
//! table never calls back into the hash builder. Slots are tagged
//! EMPTY / ACTIVE / TOMBSTONE; `occupied` counts ACTIVE and TOMBSTONE
//! slots and the table grows before `occupied * 2 >= capacity` could be
//! observed by a caller.

use crate::error::Error;
use crate::reentrancy::ProbeGuard;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;
use tracing::debug;

/// Smallest non-zero table size.
const MIN_CAPACITY: usize = 7;

#[derive(Clone, Debug)]
enum Slot<K, V> {
    Empty,
    Active { key: K, value: V, hash: u64 },
    Tombstone,
}

/// Slot storage and occupancy bookkeeping. Knows nothing about hashing;
/// callers hand in the precomputed hash and an equality probe.
#[derive(Clone, Debug)]
struct Table<K, V> {
    slots: Vec<Slot<K, V>>,
    occupied: usize, // ACTIVE + TOMBSTONE
    len: usize,      // ACTIVE
}

impl<K, V> Table<K, V> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot holding the matching key, or the slot a new key should take.
    ///
    /// Scans from `hash % capacity` with wraparound and stops at the first
    /// ACTIVE match or the first EMPTY slot. When the scan ends on EMPTY
    /// the first TOMBSTONE passed on the way is returned instead.
    /// Requires a non-empty table with at least one EMPTY slot.
    fn locate(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> usize {
        let cap = self.slots.len();
        debug_assert!(cap > 0 && self.occupied < cap);
        let mut i = (hash % cap as u64) as usize;
        let mut tombstone = None;
        loop {
            match &self.slots[i] {
                Slot::Empty => return tombstone.unwrap_or(i),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(i);
                    }
                }
                Slot::Active { key, hash: h, .. } => {
                    if *h == hash && eq(key) {
                        return i;
                    }
                }
            }
            i += 1;
            if i == cap {
                i = 0;
            }
        }
    }

    fn find(&self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let i = self.locate(hash, eq);
        matches!(self.slots[i], Slot::Active { .. }).then_some(i)
    }

    /// Like `locate`, but first makes room: the table grows when it is
    /// unallocated, or when claiming the returned EMPTY slot would leave
    /// `occupied * 2 >= capacity`.
    fn reserve(&mut self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> usize {
        if self.slots.is_empty() {
            self.grow();
        }
        let i = self.locate(hash, &mut eq);
        if matches!(self.slots[i], Slot::Empty) && (self.occupied + 1) * 2 >= self.capacity() {
            self.grow();
            return self.locate(hash, eq);
        }
        i
    }

    /// Turn slot `i` ACTIVE unless it already is, and return its value.
    fn claim(&mut self, i: usize, hash: u64, key: K, make: impl FnOnce() -> V) -> &mut V {
        let slot = &mut self.slots[i];
        if !matches!(slot, Slot::Active { .. }) {
            // Reusing a tombstone does not change occupancy.
            if matches!(slot, Slot::Empty) {
                self.occupied += 1;
            }
            self.len += 1;
            *slot = Slot::Active {
                key,
                value: make(),
                hash,
            };
        }
        match slot {
            Slot::Active { value, .. } => value,
            _ => unreachable!("slot was filled above"),
        }
    }

    fn value(&self, i: usize) -> Option<&V> {
        match &self.slots[i] {
            Slot::Active { value, .. } => Some(value),
            _ => None,
        }
    }

    fn value_mut(&mut self, i: usize) -> Option<&mut V> {
        match &mut self.slots[i] {
            Slot::Active { value, .. } => Some(value),
            _ => None,
        }
    }

    fn remove(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<V> {
        let i = self.find(hash, eq)?;
        let Slot::Active { value, .. } = mem::replace(&mut self.slots[i], Slot::Tombstone) else {
            return None;
        };
        self.len -= 1;
        Some(value)
    }

    /// Reallocate at the next prime >= twice the current size and
    /// reinsert the live entries. Tombstones are dropped.
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let capacity = next_prime(old_capacity * 2);
        let mut fresh = Vec::with_capacity(capacity);
        fresh.resize_with(capacity, || Slot::Empty);
        let old = mem::replace(&mut self.slots, fresh);
        let tombstones = self.occupied - self.len;

        self.occupied = 0;
        for slot in old {
            if let Slot::Active { key, value, hash } = slot {
                // Keys are unique, so the first free slot is the right one.
                let i = self.locate(hash, |_| false);
                self.slots[i] = Slot::Active { key, value, hash };
                self.occupied += 1;
            }
        }
        debug_assert_eq!(self.occupied, self.len);
        debug!(
            old_capacity,
            capacity,
            live = self.len,
            tombstones,
            "rehashed probe table"
        );
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.occupied = 0;
        self.len = 0;
    }
}

/// Hash map with linear probing over a prime-sized slot array.
///
/// Lookups take any borrowed form of the key (`String` keys can be
/// queried with `&str`). The hash builder is injected with
/// [`ProbeHashMap::with_hasher`]; the default is hashbrown's.
#[derive(Clone)]
pub struct ProbeHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    table: Table<K, V>,
    guard: ProbeGuard,
}

impl<K, V> ProbeHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S> Default for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty map using `hasher`. Allocates nothing until the first insert.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: Table::new(),
            guard: ProbeGuard::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.table.len
    }

    pub fn is_empty(&self) -> bool {
        self.table.len == 0
    }

    /// Number of slots in the table (0 before the first insert).
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Occupied slots (live entries and tombstones) over capacity.
    pub fn load_factor(&self) -> f64 {
        if self.table.capacity() == 0 {
            return 0.0;
        }
        self.table.occupied as f64 / self.table.capacity() as f64
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("contains_key");
        let hash = self.make_hash(q);
        self.table.find(hash, |k| k.borrow() == q).is_some()
    }

    /// Read-only lookup. Never inserts.
    pub fn get<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get");
        let hash = self.make_hash(q);
        let i = self
            .table
            .find(hash, |k| k.borrow() == q)
            .ok_or(Error::NotFound)?;
        self.table.value(i).ok_or(Error::NotFound)
    }

    /// Mutable lookup of an existing entry. Never inserts.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get_mut");
        let hash = self.make_hash(q);
        let i = self
            .table
            .find(hash, |k| k.borrow() == q)
            .ok_or(Error::NotFound)?;
        self.table.value_mut(i).ok_or(Error::NotFound)
    }

    /// Mutable lookup that inserts `V::default()` when `key` is absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let _g = self.guard.enter("get_or_default");
        let hash = self.make_hash(&key);
        let i = self.table.reserve(hash, |k| *k == key);
        self.table.claim(i, hash, key, V::default)
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any;
    /// the stored key is kept on overwrite.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.guard.enter("insert");
        let hash = self.make_hash(&key);
        let i = self.table.reserve(hash, |k| *k == key);
        match self.table.value_mut(i) {
            Some(current) => Some(mem::replace(current, value)),
            None => {
                self.table.claim(i, hash, key, || value);
                None
            }
        }
    }

    /// Remove `q`, leaving a tombstone in its slot. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("remove");
        let hash = self.make_hash(q);
        self.table.remove(hash, |k| k.borrow() == q)
    }

    /// Drop every entry and tombstone; capacity is kept.
    pub fn clear(&mut self) {
        let _g = self.guard.enter("clear");
        self.table.clear();
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.table.slots.iter(),
            remaining: self.table.len,
        }
    }

    /// Live keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let t = &self.table;
        let active = t
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Active { .. }))
            .count();
        let tombstones = t
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Tombstone))
            .count();
        assert_eq!(t.len, active, "len must count ACTIVE slots");
        assert_eq!(t.occupied, active + tombstones, "occupied must count ACTIVE + TOMBSTONE");
        if t.capacity() > 0 {
            assert!(t.occupied * 2 < t.capacity(), "load factor above one half");
            assert!(is_prime(t.capacity()), "capacity {} is not prime", t.capacity());
        }
        for (i, slot) in t.slots.iter().enumerate() {
            if let Slot::Active { key, hash, .. } = slot {
                assert_eq!(*hash, self.make_hash(key), "stored hash is stale");
                assert_eq!(t.locate(*hash, |k| k == key), i, "probe chain does not reach key");
            }
        }
    }
}

impl<K, V, S> fmt::Debug for ProbeHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.table.slots.iter().filter_map(|s| match s {
            Slot::Active { key, value, .. } => Some((key, value)),
            _ => None,
        });
        f.debug_map().entries(entries).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over live `(key, value)` pairs in `ProbeHashMap`.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Active { key, value, .. } = slot {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over live keys in `ProbeHashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut f = 3;
    while f * f <= n {
        if n % f == 0 {
            return false;
        }
        f += 2;
    }
    true
}

/// Smallest prime >= `n`, never below `MIN_CAPACITY`.
fn next_prime(n: usize) -> usize {
    let mut n = n.max(MIN_CAPACITY);
    while !is_prime(n) {
        n += 1;
    }
    n
}
