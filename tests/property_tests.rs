use proptest::prelude::*;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use krill::{
    BitVector, CompactDictionary, DoubleTrie, LookupResult, PatriciaTrie, PrefixTrie, Trie,
    TrieBuilder,
};

fn encode(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn naive_bit(words: &[u64], pos: usize) -> bool {
    words[pos / 64] >> (pos % 64) & 1 == 1
}

proptest! {
    #[test]
    fn test_bitvector_contract(
        words in prop::collection::vec(any::<u64>(), 1..50),
        trim in 0..64usize,
    ) {
        let len = (words.len() * 64).saturating_sub(trim);
        let bv = BitVector::new(words.clone(), len);

        let mut ones = 0;
        let mut zeros = 0;
        for pos in 0..len {
            if pos % 11 == 0 {
                prop_assert_eq!(bv.rank(pos, true), ones);
                prop_assert_eq!(bv.rank(pos, false), zeros);
            }
            if naive_bit(&words, pos) {
                ones += 1;
                prop_assert_eq!(bv.select(ones, true), Some(pos));
            } else {
                zeros += 1;
                prop_assert_eq!(bv.select(zeros, false), Some(pos));
            }
            prop_assert_eq!(bv.get(pos), naive_bit(&words, pos));
        }
        prop_assert_eq!(bv.rank(len, true), ones);
        prop_assert_eq!(bv.rank(len, false), zeros);
        prop_assert_eq!(bv.select(ones + 1, true), None);
        prop_assert_eq!(bv.select(zeros + 1, false), None);
        prop_assert_eq!(bv.select(0, true), None);

        for pos in (0..=len).step_by(7) {
            let expected = (pos..len).find(|&p| !naive_bit(&words, p)).unwrap_or(len);
            prop_assert_eq!(bv.next_clear_bit(pos), expected);
        }
        prop_assert!(!bv.get(len));
    }
}

proptest! {
    #[test]
    fn test_trie_round_trips(
        key_set in prop::collection::btree_set("[a-d]{1,8}", 1..40),
        probes in prop::collection::vec("[a-d]{0,10}", 0..20),
    ) {
        let words: Vec<String> = key_set.iter().cloned().collect();
        let keys: Vec<Vec<u16>> = words.iter().map(|w| encode(w)).collect();

        let (plain, nodes) = Trie::from_keys_with_nodes(&keys).unwrap();
        let (prefix, _) = PrefixTrie::from_keys_with_nodes(&keys).unwrap();
        let patricia = PatriciaTrie::from_keys(&keys).unwrap();
        let (double, _) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();

        let mut buf = vec![];
        for (key, &node) in keys.iter().zip(&nodes) {
            prop_assert_eq!(plain.lookup(key), Some(node));
            buf.clear();
            plain.reverse_lookup(node, &mut buf);
            prop_assert_eq!(&buf, key);
        }
        for key in &keys {
            let node = prefix.lookup(key).node();
            prop_assert!(node.is_some());
            buf.clear();
            prefix.reverse_lookup(node.unwrap(), &mut buf);
            prop_assert_eq!(&buf, key);

            let node = patricia.lookup(key).node();
            prop_assert!(node.is_some());
            buf.clear();
            patricia.reverse_lookup(node.unwrap(), &mut buf);
            prop_assert_eq!(&buf, key);

            let node = double.lookup(key).node();
            prop_assert!(node.is_some());
            buf.clear();
            double.reverse_lookup(node.unwrap(), &mut buf);
            prop_assert_eq!(&buf, key);
        }

        // The incremental builder agrees with the batch build.
        let mut builder = TrieBuilder::new();
        for key in &keys {
            builder.add(key).unwrap();
        }
        let built = builder.build();
        for (key, &node) in keys.iter().zip(&nodes) {
            prop_assert_eq!(built.lookup(key), Some(node));
        }

        // Sentinel distinction: a probe misses exactly when it prefixes no
        // stored key, and Found on a terminal node happens exactly for
        // stored keys.
        for probe in &probes {
            let probe_units = encode(probe);
            let is_prefix = words.iter().any(|w| w.starts_with(probe.as_str()));
            let is_key = key_set.contains(probe.as_str());
            prop_assert_eq!(plain.lookup(&probe_units).is_some(), is_prefix);
            for result in [
                prefix.lookup(&probe_units),
                patricia.lookup(&probe_units),
                double.lookup(&probe_units),
            ] {
                prop_assert_eq!(result == LookupResult::NotFound, !is_prefix);
            }
            let terminal_match = prefix
                .lookup(&probe_units)
                .node()
                .is_some_and(|n| prefix.is_terminal(n));
            prop_assert_eq!(terminal_match, is_key);
            let terminal_match = patricia
                .lookup(&probe_units)
                .node()
                .is_some_and(|n| patricia.is_terminal(n));
            prop_assert_eq!(terminal_match, is_key);
            let terminal_match = double
                .lookup(&probe_units)
                .node()
                .is_some_and(|n| double.is_terminal(n));
            prop_assert_eq!(terminal_match, is_key);
        }
    }
}

proptest! {
    #[test]
    fn test_dictionary_mapping(
        records in prop::collection::btree_map(
            "[a-c]{1,5}",
            prop::collection::vec("[a-e]{1,5}", 1..4),
            0..20,
        ),
    ) {
        let dict = CompactDictionary::from_records(
            records.iter().map(|(k, v)| (k.clone(), v.clone())),
        )
        .unwrap();

        // Mapping completeness: exact search yields exactly the record's
        // values, in record order.
        for (key, values) in &records {
            let mut found = vec![];
            dict.search(key, |v| found.push(v.to_string()));
            prop_assert_eq!(&found, values);
        }

        // Predictive search equals the union over matching keys.
        let prefixes: BTreeSet<String> = records
            .keys()
            .flat_map(|k| (1..=k.len()).map(|n| k[..n].to_string()))
            .collect();
        for prefix in &prefixes {
            let mut found = vec![];
            dict.predictive_search(prefix, |v| found.push(v.to_string()));
            found.sort_unstable();
            let mut expected: Vec<String> = records
                .iter()
                .filter(|(k, _)| k.starts_with(prefix.as_str()))
                .flat_map(|(_, v)| v.iter().cloned())
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(found, expected);
        }

        // The persisted form round-trips.
        let bytes = dict.serialize_to_vec();
        let restored = CompactDictionary::deserialize_from_slice(&bytes).unwrap();
        prop_assert_eq!(restored.node_counts(), dict.node_counts());
        for key in records.keys() {
            let mut found = vec![];
            restored.search(key, |v| found.push(v.to_string()));
            let mut expected = vec![];
            dict.search(key, |v| expected.push(v.to_string()));
            prop_assert_eq!(found, expected);
        }
    }
}

#[test]
fn test_dictionary_superset_fixture() {
    let dict = CompactDictionary::from_lines([
        "あい\t愛\t相",
        "あいさつ\t挨拶",
        "あお\t青",
    ])
    .unwrap();
    let mut found = vec![];
    dict.predictive_search("あい", |v| found.push(v.to_string()));
    found.sort_unstable();
    let mut expected = vec!["愛".to_string(), "相".to_string(), "挨拶".to_string()];
    expected.sort_unstable();
    assert_eq!(found, expected);

    let map: BTreeMap<String, Vec<String>> = [
        ("あい", vec!["愛", "相"]),
        ("あいさつ", vec!["挨拶"]),
        ("あお", vec!["青"]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
    .collect();
    for (key, values) in &map {
        let mut found = vec![];
        dict.search(key, |v| found.push(v.to_string()));
        assert_eq!(&found, values);
    }
}
