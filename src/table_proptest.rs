#![cfg(test)]

// Property tests for Table kept inside the crate so they can reach the
// engine-internal storage layer directly.

use crate::config::Unlimited;
use crate::engine::Budget;
use crate::scalar::{KeyRef, Scalar};
use crate::table::Table;
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

// Pool-indexed operations: indices shrink to earlier keys, op lists
// shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Remove(usize),
    Get(usize),
    Walk,
    // Walk the table, removing the current key every `n`-th step.
    WalkRemoving(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => Just(OpI::Walk),
            1 => (1usize..=3).prop_map(OpI::WalkRemoving),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn text_of(s: &Scalar) -> String {
    s.as_text().map(str::to_string).unwrap_or_default()
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `get`/`len` parity with the model after every op.
// - A full walk from `next(None)` visits each live key exactly once.
// - Removing the current key mid-walk never breaks the walk: every key
//   live at the start is visited exactly once and removed keys are gone.
// - Interleaved inserts compact dead nodes without losing live entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_state_machine((pool, ops) in arb_scenario()) {
        let mut budget = Budget::new(Rc::new(Unlimited));
        let mut sut = Table::new(RandomState::new());
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Set(i, v) => {
                    let k = &pool[i];
                    sut.set(KeyRef::Text(k), Scalar::Integer(v as isize), &mut budget).unwrap();
                    model.insert(k.clone(), v);
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let removed = sut.remove(&KeyRef::Text(k));
                    prop_assert_eq!(removed, model.remove(k).is_some());
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    let got = sut.get(&KeyRef::Text(k)).cloned();
                    let expected = model.get(k).map(|v| Scalar::Integer(*v as isize));
                    prop_assert_eq!(got, expected);
                }
                OpI::Walk => {
                    let mut seen = Vec::new();
                    let mut cur = sut.next(None).unwrap();
                    while let Some((k, _)) = cur {
                        cur = sut.next(Some(&k.as_key())).unwrap();
                        seen.push(text_of(&k));
                    }
                    let unique: BTreeSet<_> = seen.iter().cloned().collect();
                    prop_assert_eq!(unique.len(), seen.len(), "walk repeated a key");
                    let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                    prop_assert_eq!(unique, m_keys);
                }
                OpI::WalkRemoving(n) => {
                    let before: BTreeSet<_> = model.keys().cloned().collect();
                    let mut seen = BTreeSet::new();
                    let mut step = 0usize;
                    let mut cur = sut.next(None).unwrap();
                    while let Some((k, _)) = cur {
                        let name = text_of(&k);
                        prop_assert!(seen.insert(name.clone()), "walk repeated a key");
                        if step % n == 0 {
                            prop_assert!(sut.remove(&k.as_key()));
                            model.remove(&name);
                        }
                        step += 1;
                        cur = sut.next(Some(&k.as_key())).unwrap();
                    }
                    prop_assert_eq!(seen, before);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
        }
    }
}
