//! Property-Based Tests for the routing core
//!
//! Uses proptest to verify invariants of key construction, sharding, and
//! mapping regeneration across generated inputs.

use proptest::prelude::*;

use crate::backend::MemoryCluster;
use crate::mapping::{BinMapping, MemoryMappingStore};
use crate::routing::{BinResolver, KeySpace, NodePool};

proptest! {
    /// Full-key construction is a pure function: same inputs, same output.
    #[test]
    fn prop_build_key_deterministic(
        key in ".{0,64}",
        bin in "[a-z_]{0,32}",
        prefix in proptest::option::of("[a-z0-9]{1,16}"),
    ) {
        let ks = KeySpace::new(prefix.clone());
        let a = ks.build_key(&key, &bin);
        let b = ks.build_key(&key, &bin);
        prop_assert_eq!(a, b);
    }

    /// Encoded full keys never contain characters that collide with
    /// wire-protocol delimiters.
    #[test]
    fn prop_build_key_is_wire_safe(
        key in ".{0,64}",
        bin in "[a-z_]{1,32}",
    ) {
        let ks = KeySpace::new(None);
        let full = ks.build_key(&key, &bin);
        prop_assert!(!full.contains(' '));
        prop_assert!(!full.contains('\r'));
        prop_assert!(!full.contains('\n'));
        prop_assert!(!full.contains(':'));
    }

    /// Decoding an encoded full key recovers the raw namespaced form.
    #[test]
    fn prop_build_key_roundtrips_through_decode(
        key in "[a-zA-Z0-9 :*%]{0,64}",
        bin in "[a-z_]{1,32}",
    ) {
        let ks = KeySpace::new(None);
        let full = ks.build_key(&key, &bin);
        let decoded = urlencoding::decode(&full).unwrap();
        prop_assert_eq!(decoded.into_owned(), format!("{}:{}", bin, key));
    }

    /// Routing always lands inside the pool and is stable per key.
    #[test]
    fn prop_route_in_range_and_stable(
        keys in proptest::collection::vec("[a-zA-Z0-9%]{1,32}", 1..50),
        node_count in 1usize..8,
    ) {
        let cluster = MemoryCluster::new();
        let addresses: Vec<String> =
            (0..node_count).map(|i| format!("node{}:6379", i)).collect();
        let pool = NodePool::connect_all(&addresses, &cluster).unwrap();

        for key in &keys {
            let first = pool.route(key).unwrap().addr().to_string();
            let second = pool.route(key).unwrap().addr().to_string();
            prop_assert_eq!(&first, &second);
            prop_assert!(addresses.contains(&first));
        }
    }

    /// Regeneration assigns 1-based sorted rank regardless of input order,
    /// so any permutation of the same bin list produces the same mapping.
    #[test]
    fn prop_mapping_regeneration_order_independent(
        names in proptest::collection::btree_set("[a-z_]{1,16}", 1..12)
    ) {
        let sorted: Vec<String> = names.iter().cloned().collect();
        let mut shuffled: Vec<String> = names.iter().rev().cloned().collect();
        shuffled.rotate_left(sorted.len() / 2);

        let resolve_all = |canonical: Vec<String>| -> Vec<u32> {
            let resolver = BinResolver::new(
                Box::new(MemoryMappingStore::new()),
                canonical,
                BinMapping::new(),
                0,
            );
            sorted.iter().map(|bin| resolver.resolve(bin).unwrap()).collect()
        };

        let from_sorted = resolve_all(sorted.clone());
        let from_shuffled = resolve_all(shuffled);
        prop_assert_eq!(&from_sorted, &from_shuffled);

        // Sorted rank is 1-based and dense
        let expected: Vec<u32> = (1..=sorted.len() as u32).collect();
        prop_assert_eq!(from_sorted, expected);
    }
}
