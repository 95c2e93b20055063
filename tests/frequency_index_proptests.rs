use proptest::prelude::*;
use std::collections::HashMap;
use wordrank::FrequencyIndex;

// Record random token sequences and compare against a plain count map.
proptest! {
    #[test]
    fn prop_counts_order_and_distinctness(ops in proptest::collection::vec(0usize..40usize, 0..400)) {
        let mut m = FrequencyIndex::new();
        let mut model: HashMap<String, u64> = HashMap::new();

        for raw in ops {
            let token = format!("w{}", raw);
            m.record(token.as_bytes()).unwrap();
            *model.entry(token).or_default() += 1;
        }

        // Distinctness
        prop_assert_eq!(m.len(), model.len());

        // Order and count correctness
        let mut last = u64::MAX;
        for (key, count) in m.ordered_entries() {
            prop_assert!(count <= last);
            last = count;
            let key = std::str::from_utf8(key).unwrap();
            prop_assert_eq!(model.get(key).copied(), Some(count));
        }
        prop_assert!(m.check_invariants().is_ok());
    }
}
