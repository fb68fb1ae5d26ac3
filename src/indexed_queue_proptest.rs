#![cfg(test)]

// Property tests for IndexedPriorityQueue: random enqueue / dequeue /
// reweight sequences checked against a plain map model, with the heap
// and location invariants asserted after every step.

use crate::error::Error;
use crate::indexed_queue::IndexedPriorityQueue;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Enqueue(usize, i8),
    Dequeue,
    Reweight(usize, i8),
    Peek,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
    (1usize..=40).prop_flat_map(|pool| {
        let idx = 0..pool;
        let op = prop_oneof![
            5 => (idx.clone(), any::<i8>()).prop_map(|(i, w)| Op::Enqueue(i, w)),
            3 => Just(Op::Dequeue),
            4 => (idx.clone(), any::<i8>()).prop_map(|(i, w)| Op::Reweight(i, w)),
            1 => Just(Op::Peek),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..150).prop_map(move |ops| (pool, ops))
    })
}

fn fail(e: Error) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

fn headline(i: usize) -> String {
    format!("h{i}")
}

fn run<S: BuildHasher + Clone>(
    mut sut: IndexedPriorityQueue<String, String, i8, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    // headline -> (story, weight)
    let mut model: HashMap<String, (String, i8)> = HashMap::new();
    let mut last_min: Option<i8> = None;
    for op in ops {
        match op {
            Op::Enqueue(i, w) => {
                let h = headline(i);
                let story = format!("story {i} at {w}");
                sut.enqueue(h.clone(), story.clone(), w).map_err(fail)?;
                model.insert(h, (story, w));
                last_min = None;
            }
            Op::Dequeue => match sut.dequeue() {
                Ok((h, story, w)) => {
                    let min = model.values().map(|(_, w)| *w).min();
                    prop_assert_eq!(Some(w), min, "dequeue must remove a minimum");
                    if let Some(prev) = last_min {
                        prop_assert!(prev <= w, "dequeue stream went backwards");
                    }
                    last_min = Some(w);
                    let (ms, mw) = model.remove(&h).expect("dequeued key was enqueued");
                    prop_assert_eq!(story, ms);
                    prop_assert_eq!(w, mw);
                }
                Err(e) => {
                    prop_assert_eq!(e, Error::EmptyQueue);
                    prop_assert!(model.is_empty());
                }
            },
            Op::Reweight(i, w) => {
                let h = headline(i);
                match model.get_mut(&h) {
                    Some(entry) => {
                        sut.reweight(&h, w).map_err(fail)?;
                        entry.1 = w;
                        prop_assert_eq!(sut.weight(&h), Ok(w));
                    }
                    None => prop_assert_eq!(sut.reweight(&h, w), Err(Error::NotFound)),
                }
                last_min = None;
            }
            Op::Peek => match sut.peek() {
                Ok(h) => {
                    let w = model.get(h).map(|(_, w)| *w);
                    prop_assert_eq!(w, model.values().map(|(_, w)| *w).min());
                }
                Err(e) => {
                    prop_assert_eq!(e, Error::EmptyQueue);
                    prop_assert!(model.is_empty());
                }
            },
            Op::Iterate => {
                let s: BTreeSet<_> = sut.iter().cloned().collect();
                let m: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s, m);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        for (h, (story, w)) in &model {
            prop_assert_eq!(sut.get(h), Ok(story));
            prop_assert_eq!(sut.weight(h), Ok(*w));
        }
    }
    Ok(())
}

// Property: the queue agrees with a map model on every lookup, always
// exposes a minimum-weight key at the root, and keeps heap order and
// location consistency after every enqueue, dequeue and reweight.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_queue_matches_model((_pool, ops) in arb_scenario()) {
        run(IndexedPriorityQueue::new(), ops)?;
    }
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Same property with all three maps degenerated to a single probe chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_queue_matches_model_with_collisions((_pool, ops) in arb_scenario()) {
        run(IndexedPriorityQueue::with_hasher(ConstBuildHasher), ops)?;
    }
}

// Property: enqueue everything, then drain; the dequeued weights form a
// sorted permutation of the input weights.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_drain_is_sorted(weights in proptest::collection::vec(any::<i32>(), 0..200)) {
        let mut q: IndexedPriorityQueue<usize, (), i32> = IndexedPriorityQueue::new();
        for (i, w) in weights.iter().enumerate() {
            q.enqueue(i, (), *w).map_err(fail)?;
        }
        let mut out = Vec::with_capacity(weights.len());
        while let Ok((_, _, w)) = q.dequeue() {
            out.push(w);
        }
        let mut expected = weights.clone();
        expected.sort_unstable();
        prop_assert_eq!(out, expected);
    }
}
