#![cfg(test)]

// Property tests for FrequencyIndex kept inside the crate so they can reach
// the slot table and list links directly.

use crate::frequency_index::FrequencyIndex;
use hashbrown::HashMap;
use proptest::prelude::*;

// Tokens are drawn from a small pool so repeats (and promotions) are common,
// with an occasional fresh token to push the table through growth.
fn arb_tokens() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec("[a-z]{1,4}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let token = prop_oneof![
            4 => proptest::sample::select(idxs).prop_map(move |i| pool[i].clone()),
            1 => "[a-z0-9]{1,8}",
        ];
        proptest::collection::vec(token.prop_map(String::into_bytes), 1..300)
    })
}

fn snapshot<S>(m: &FrequencyIndex<S>) -> Vec<(Vec<u8>, u64)> {
    m.ordered_entries().map(|(k, c)| (k.to_vec(), c)).collect()
}

// Property: state-machine equivalence against a hashbrown count map.
// Invariants exercised after every record:
// - `check_invariants` holds (links, order, slot back-references, load).
// - The recorded token's count equals the model's count.
// - `len` equals the number of distinct tokens seen.
// - Enumeration is non-increasing and agrees with the model pairwise.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_count_model(tokens in arb_tokens()) {
        let mut sut = FrequencyIndex::new();
        let mut model: HashMap<Vec<u8>, u64> = HashMap::new();

        for token in &tokens {
            sut.record(token).unwrap();
            *model.entry(token.clone()).or_insert(0) += 1;

            if let Err(e) = sut.check_invariants() {
                prop_assert!(false, "{}", e);
            }
            prop_assert_eq!(sut.get(token), model.get(token).copied());
            prop_assert_eq!(sut.len(), model.len());
        }

        let listed = snapshot(&sut);
        prop_assert_eq!(listed.len(), model.len());
        for pair in listed.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1, "order broken: {:?}", pair);
        }
        for (key, count) in &listed {
            prop_assert_eq!(model.get(key), Some(count));
        }
    }

    // Property: growth is invisible to the ordering. A default index that
    // grows repeatedly lists exactly what a pre-sized one lists.
    #[test]
    fn prop_growth_transparency(tokens in arb_tokens()) {
        let mut growing = FrequencyIndex::new();
        let mut presized = FrequencyIndex::try_with_capacity(4096).unwrap();
        for token in &tokens {
            growing.record(token).unwrap();
            presized.record(token).unwrap();
        }
        prop_assert_eq!(presized.capacity(), 4096);
        prop_assert_eq!(snapshot(&growing), snapshot(&presized));
    }

    // Property: enumeration does not mutate and can be repeated.
    #[test]
    fn prop_enumeration_is_idempotent(tokens in arb_tokens()) {
        let mut m = FrequencyIndex::new();
        for token in &tokens {
            m.record(token).unwrap();
        }
        let first = snapshot(&m);
        let second = snapshot(&m);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(m.ordered_entries().len(), first.len());

        // A cloned iterator resumes from the same position independently.
        let mut it = m.ordered_entries();
        let _ = it.next();
        let rest: Vec<_> = it.clone().map(|(k, c)| (k.to_vec(), c)).collect();
        let rest_again: Vec<_> = it.map(|(k, c)| (k.to_vec(), c)).collect();
        prop_assert_eq!(rest, rest_again);
    }

    // Property: slot back-references survive arbitrary promotion chains:
    // every key resolves to the list node that holds it.
    #[test]
    fn prop_slots_track_payloads(tokens in arb_tokens()) {
        let mut m = FrequencyIndex::new();
        for token in &tokens {
            m.record(token).unwrap();
        }
        for (key, count) in snapshot(&m) {
            prop_assert_eq!(m.get(&key), Some(count));
        }
    }
}
