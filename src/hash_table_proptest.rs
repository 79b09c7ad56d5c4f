#![cfg(test)]

// Property tests for HashTable kept inside the crate so every backend and
// the raw slot accessors are reachable without feature gates.

use crate::backend::Backend;
use crate::fully_separated::FullySeparated;
use crate::hash_separated::HashSeparated;
use crate::hash_table::HashTable;
use crate::interleaved::Interleaved;
use crate::policy::{KeyComparator, KeyHasher};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Reserve(usize),
    SetEntry(usize, i32),
    Remove(usize),
    RemoveEntry(usize),
    Get(usize),
    Rehash(usize),
    Enumerate,
}

fn key(pool: &[u32], i: usize) -> [u8; 4] {
    pool[i].to_le_bytes()
}

fn value_of(bytes: &[u8]) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    i32::from_le_bytes(word)
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u32>, Vec<OpI>)> {
    proptest::collection::vec(any::<u32>(), 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            idx.clone().prop_map(OpI::Reserve),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::SetEntry(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::RemoveEntry),
            idx.clone().prop_map(OpI::Get),
            (1usize..24).prop_map(OpI::Rehash),
            Just(OpI::Enumerate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against a model map where `None`
// stands for a key that was reserved but never written.
// Invariants exercised across random operation sequences:
// - `entry_for_key` reports creation exactly when the model lacks the key.
// - Reads through keys and entries match the model, `None` for reserved.
// - Removal of absent keys is a no-op; removal of present keys tombstones.
// - Rehash preserves the mapping; fresh entries resolve afterwards.
// - Forward and backward enumeration visit the same keys, which equal the
//   model's key set; `iter` yields exactly the written pairs.
// - `count`/`is_empty` parity with the model after each op.
fn run_scenario<B: Backend>(
    mut sut: HashTable<B>,
    pool: &[u32],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u32, Option<i32>> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                sut.set_value(&key(pool, i), &v.to_le_bytes())
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                model.insert(pool[i], Some(v));
            }
            OpI::Reserve(i) => {
                let already = model.contains_key(&pool[i]);
                let (entry, created) = sut
                    .entry_for_key(&key(pool, i))
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(created, !already);
                let entry = entry.expect("small tables address every slot");
                prop_assert_eq!(sut.get_key(entry), Some(&key(pool, i)[..]));
                model.entry(pool[i]).or_insert(None);
                prop_assert_eq!(
                    sut.entry_is_initialized(entry),
                    model[&pool[i]].is_some()
                );
            }
            OpI::SetEntry(i, v) => {
                let (entry, _) = sut
                    .entry_for_key(&key(pool, i))
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let entry = entry.expect("small tables address every slot");
                sut.set_entry(entry, &v.to_le_bytes());
                prop_assert_eq!(sut.get_entry(entry).map(value_of), Some(v));
                model.insert(pool[i], Some(v));
            }
            OpI::Remove(i) => {
                sut.remove_value(&key(pool, i));
                model.remove(&pool[i]);
                prop_assert!(sut.find_key(&key(pool, i)).is_none());
            }
            OpI::RemoveEntry(i) => {
                let found = sut.find_key(&key(pool, i));
                prop_assert_eq!(found.is_some(), model.contains_key(&pool[i]));
                if let Some(entry) = found {
                    sut.remove_entry(entry);
                    model.remove(&pool[i]);
                    prop_assert!(sut.get_key(entry).is_none());
                }
            }
            OpI::Get(i) => {
                let got = sut.get_value(&key(pool, i)).map(value_of);
                let expected = model.get(&pool[i]).copied().flatten();
                prop_assert_eq!(got, expected);
                if let Some(entry) = sut.find_key(&key(pool, i)) {
                    prop_assert_eq!(sut.get_entry(entry).map(value_of), expected);
                }
            }
            OpI::Rehash(n) => {
                sut.rehash(n)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(sut.bucket_count(), n);
                for (&k, &v) in &model {
                    let entry = sut.find_key(&k.to_le_bytes());
                    prop_assert!(entry.is_some());
                    let got = entry.and_then(|e| sut.get_entry(e)).map(value_of);
                    prop_assert_eq!(got, v);
                }
            }
            OpI::Enumerate => {
                let mut forward = Vec::new();
                let mut e = sut.key_enumerator();
                let mut cur = e.current();
                while let Some(k) = cur {
                    forward.push(k.to_vec());
                    cur = e.move_next();
                }
                let mut backward = Vec::new();
                let mut cur = e.to_tail();
                while let Some(k) = cur {
                    backward.push(k.to_vec());
                    cur = e.move_previous();
                }
                backward.reverse();
                prop_assert_eq!(&forward, &backward);

                let s_keys: BTreeSet<Vec<u8>> = forward.into_iter().collect();
                let m_keys: BTreeSet<Vec<u8>> =
                    model.keys().map(|k| k.to_le_bytes().to_vec()).collect();
                prop_assert_eq!(s_keys, m_keys);

                let s_pairs: BTreeMap<Vec<u8>, i32> =
                    sut.iter().map(|(k, v)| (k.to_vec(), value_of(v))).collect();
                let m_pairs: BTreeMap<Vec<u8>, i32> = model
                    .iter()
                    .filter_map(|(k, v)| v.map(|v| (k.to_le_bytes().to_vec(), v)))
                    .collect();
                prop_assert_eq!(s_pairs, m_pairs);
                prop_assert_eq!(sut.keys().len(), sut.values().len());
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.count(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

fn table<B: Backend>(hasher: KeyHasher) -> HashTable<B> {
    HashTable::builder(4, 4)
        .bucket_count(3)
        .hasher(hasher)
        .comparator(KeyComparator::Bytewise)
        .build()
        .expect("three buckets")
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_interleaved((pool, ops) in arb_scenario()) {
        run_scenario(table::<Interleaved>(KeyHasher::Structural), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_hash_separated((pool, ops) in arb_scenario()) {
        run_scenario(table::<HashSeparated>(KeyHasher::Structural), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_fully_separated((pool, ops) in arb_scenario()) {
        run_scenario(table::<FullySeparated>(KeyHasher::Structural), &pool, ops)?;
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every key lands in one bucket,
// which stresses key equality, tombstone reuse and cursor walks within a
// single chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(table::<Interleaved>(KeyHasher::custom(|_| 0)), &pool, ops.clone())?;
        run_scenario(table::<HashSeparated>(KeyHasher::custom(|_| 0)), &pool, ops.clone())?;
        run_scenario(table::<FullySeparated>(KeyHasher::custom(|_| 0)), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_seeded_hasher((pool, ops) in arb_scenario()) {
        run_scenario(table::<Interleaved>(KeyHasher::seeded()), &pool, ops)?;
    }
}
