#![cfg(test)]

// Property tests for OrderedStringMap kept inside the crate so they can call
// the internal invariant checker after every step.

use crate::error::Error;
use crate::map::OrderedStringMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    GetOrInsert(usize, i32),
    Remove(usize),
    RemoveFirst,
    RemoveLast,
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    GetIndex(usize),
    RetainEven,
    CursorRemoveFrom(usize),
    ShrinkToFit,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => Just(OpI::RemoveFirst),
            1 => Just(OpI::RemoveLast),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..48).prop_map(OpI::GetIndex),
            1 => Just(OpI::RetainEven),
            1 => (0usize..48).prop_map(OpI::CursorRemoveFrom),
            1 => Just(OpI::ShrinkToFit),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Insertion-ordered reference model.
#[derive(Default)]
struct Model(Vec<(String, i32)>);

impl Model {
    fn position(&self, k: &str) -> Option<usize> {
        self.0.iter().position(|(mk, _)| mk == k)
    }

    fn put(&mut self, k: &str, v: i32) -> Option<i32> {
        match self.position(k) {
            Some(i) => Some(std::mem::replace(&mut self.0[i].1, v)),
            None => {
                self.0.push((k.to_string(), v));
                None
            }
        }
    }

    fn remove(&mut self, k: &str) -> Option<i32> {
        self.position(k).map(|i| self.0.remove(i).1)
    }
}

// State-machine equivalence against the ordered model. After every op:
// - the probe invariant and the order list are intact (`check_invariants`);
// - iteration yields exactly the model's entries in the model's order,
//   forwards and backwards;
// - `len`/`is_empty` agree with the model.
fn run<S: BuildHasher>(
    mut sut: OrderedStringMap<i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model = Model::default();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = &pool[i];
                prop_assert_eq!(sut.put(k.as_str(), v), model.put(k, v));
            }
            OpI::GetOrInsert(i, v) => {
                let k = &pool[i];
                let got = *sut.get_or_insert_with(k.as_str(), || v);
                if model.position(k).is_none() {
                    model.put(k, v);
                }
                prop_assert_eq!(Some(got), model.position(k).map(|p| model.0[p].1));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
            }
            OpI::RemoveFirst => match sut.remove_first() {
                Ok(entry) => prop_assert_eq!(entry, model.0.remove(0)),
                Err(Error::NoSuchElement) => prop_assert!(model.0.is_empty()),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            },
            OpI::RemoveLast => match sut.remove_last() {
                Ok(entry) => prop_assert_eq!(Some(entry), model.0.pop()),
                Err(Error::NoSuchElement) => prop_assert!(model.0.is_empty()),
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            },
            OpI::Get(i) => {
                let k = &pool[i];
                let expected = model.position(k).map(|p| &model.0[p].1);
                prop_assert_eq!(sut.get(k), expected);
                prop_assert_eq!(sut.contains_key(k), expected.is_some());
                if let Some(h) = sut.handle(k) {
                    prop_assert_eq!(h.key(&sut), Some(k.as_str()));
                    prop_assert_eq!(h.value(&sut), expected);
                }
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.position(&s).is_some());
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(p) = model.position(k) {
                    model.0[p].1 = model.0[p].1.wrapping_add(d);
                }
            }
            OpI::GetIndex(i) => match sut.get_index(i) {
                Ok((k, v)) => {
                    let (mk, mv) = &model.0[i];
                    prop_assert_eq!((k, v), (mk.as_str(), mv));
                }
                Err(Error::IndexOutOfRange { index, len }) => {
                    prop_assert_eq!(index, i);
                    prop_assert_eq!(len, model.0.len());
                    prop_assert!(i >= model.0.len());
                }
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            },
            OpI::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                model.0.retain(|(_, v)| *v % 2 == 0);
            }
            OpI::CursorRemoveFrom(start) => {
                // Skip `start` entries, then remove every other one.
                {
                    let mut c = sut.cursor_mut();
                    c.skip(start);
                    let mut odd = false;
                    while c.next().is_some() {
                        if odd {
                            c.remove().map_err(|e| TestCaseError::fail(e.to_string()))?;
                        }
                        odd = !odd;
                    }
                }
                let mut odd = false;
                let mut idx = 0;
                model.0.retain(|_| {
                    let keep = if idx < start {
                        true
                    } else {
                        let keep = !odd;
                        odd = !odd;
                        keep
                    };
                    idx += 1;
                    keep
                });
            }
            OpI::ShrinkToFit => sut.shrink_to_fit(),
            OpI::Iterate => {
                let back: Vec<(&str, &i32)> = sut.iter().rev().collect();
                let m_back: Vec<(&str, &i32)> =
                    model.0.iter().rev().map(|(k, v)| (k.as_str(), v)).collect();
                prop_assert_eq!(back, m_back);
            }
        }

        sut.check_invariants();
        let s_items: Vec<(&str, &i32)> = sut.iter().collect();
        let m_items: Vec<(&str, &i32)> = model.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        prop_assert_eq!(s_items, m_items);
        prop_assert_eq!(sut.len(), model.0.len());
        prop_assert_eq!(sut.is_empty(), model.0.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(OrderedStringMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one probe run,
// so each removal shifts the whole tail of the run.
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
        run(OrderedStringMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Growth followed by bulk removal returns the table to a small size without
// disturbing the survivors' order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_grow_then_drain_keeps_order(n in 1usize..600, keep_every in 1usize..50) {
        let mut sut: OrderedStringMap<usize> = OrderedStringMap::new();
        for i in 0..n {
            sut.put(format!("k{i}"), i);
        }
        for i in (0..n).filter(|i| i % keep_every != 0) {
            prop_assert_eq!(sut.remove(&format!("k{i}")), Some(i));
        }
        sut.check_invariants();
        let survivors: Vec<usize> = sut.values().copied().collect();
        let expected: Vec<usize> = (0..n).step_by(keep_every).collect();
        prop_assert_eq!(survivors, expected);
    }
}
