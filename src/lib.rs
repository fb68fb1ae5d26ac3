//! newsfeed: a min-priority queue of string-keyed headlines whose
//! staleness can be changed after insertion, on top of a
//! linear-probing hash map.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a binary heap whose entries are addressable by key, so a
//!   key's weight can be read in O(1) and changed in O(log n).
//! - Layers:
//!   - ProbeHashMap<K, V, S>: open-addressing table with linear probing,
//!     tombstones on removal and prime capacities (7, 17, 37, 79, ...).
//!     Includes a debug-only reentrancy guard around probing.
//!   - IndexedPriorityQueue<K, V, W, S>: 1-indexed binary min-heap of
//!     keys plus three ProbeHashMaps keyed by the same keys: payload,
//!     weight and current heap position.
//!   - NewsFeed: IndexedPriorityQueue<Headline, Story, Staleness>.
//!
//! Constraints
//! - Single-threaded. The probe guard holds a `Cell`, so the map and the
//!   queue are `!Sync`.
//! - A key is enqueued at most once. Enqueueing a live key replaces its
//!   payload and reweights it.
//! - Ties between equal weights are broken by heap shape only; there is
//!   no FIFO guarantee.
//!
//! Location tracking
//! - The heap stores keys; `locations` maps each key to its position.
//!   Every exchange of two heap positions goes through a single swap
//!   primitive that updates both locations with the array, which keeps
//!   `heap[locations[k]] == k` for all enqueued keys.
//! - `reweight` sifts down when the weight grows and up otherwise. The
//!   sift routines return the final position, so no heap scan is needed.
//!
//! Load and growth
//! - The map never lets `occupied * 2 >= capacity` stand after a
//!   mutating call (`occupied` counts live entries and tombstones), so
//!   the load factor stays at or below one half and every probe chain
//!   ends at an EMPTY slot.
//! - Heap storage grows to `2 * capacity + 17` when full.
//!
//! Errors
//! - `Error::EmptyQueue` from `peek`/`dequeue` on an empty queue.
//! - `Error::NotFound` from read-only lookups of missing keys.
//!
//! Logging
//! - `tracing` events: `debug` on table and heap growth, `trace` on
//!   reweight direction. No subscriber is installed by the library.

pub mod error;
pub mod indexed_queue;
mod indexed_queue_proptest;
pub mod probe_hash_map;
mod probe_hash_map_proptest;
mod reentrancy;
pub mod traits;

// Public surface
pub use error::Error;
pub use indexed_queue::{Headline, IndexedPriorityQueue, NewsFeed, Staleness, Story};
pub use probe_hash_map::ProbeHashMap;
pub use traits::{Dictionary, PriorityQueue};
