#![cfg(test)]

// Property tests for ProbeHashMap kept inside the crate so they can check
// slot-level invariants after every operation.

use crate::error::Error;
use crate::probe_hash_map::ProbeHashMap;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves towards earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    GetOrDefault(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::GetOrDefault(i, d)),
            4 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run<S: BuildHasher>(
    mut sut: ProbeHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            Op::GetOrDefault(i, d) => {
                let k = key_from(&pool, i);
                let v = sut.get_or_default(k.clone());
                *v = v.wrapping_add(d);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(d);
                prop_assert_eq!(*v, *m);
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert!(!sut.contains_key(&k), "removed key still present");
            }
            Op::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k).ok_or(Error::NotFound));
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), model.len());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert!(sut.load_factor() <= 0.5);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// After every operation: len parity, load factor at most one half, prime
// capacity, and every live key reachable from its home slot.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(ProbeHashMap::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one probe
// chain, which stresses tombstone skipping and reuse.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(ProbeHashMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}
