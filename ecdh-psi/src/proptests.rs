//! Property-based tests for the masking engine
//!
//! Tests for:
//! - Commutativity: tokens agree whichever scalar is applied first
//! - Batch equivalence: a batch equals the same items masked one at a time
//! - Determinism: hash-to-curve and finalization are pure
//! - Round-trip: every masked point decodes back to itself
//! - Rejection: a corrupted entry is reported at its index, others untouched

use crate::{
    finalize_to_token, intersect, EcdhPsi, EngineConfig, MaskingCurve, PointError, PsiError,
    Ristretto255, Secp256k1,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

fn engine<C: MaskingCurve>() -> EcdhPsi<C> {
    EcdhPsi::<C>::with_config(EngineConfig::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property test: Commutativity
    /// For any item and two fresh scalars, both application orders agree
    #[test]
    fn prop_commutativity(item in vec(any::<u8>(), 0..64)) {
        let alice = engine::<Ristretto255>();
        let bob = engine::<Ristretto255>();

        let ab = bob.remask_and_finalize(&alice.mask_items(&[&item]).unwrap()).unwrap();
        let ba = alice.remask_and_finalize(&bob.mask_items(&[&item]).unwrap()).unwrap();
        prop_assert_eq!(ab, ba);
    }

    /// Property test: Commutativity on secp256k1
    #[test]
    fn prop_commutativity_secp256k1(item in vec(any::<u8>(), 0..64)) {
        let alice = engine::<Secp256k1>();
        let bob = engine::<Secp256k1>();

        let ab = bob.remask_and_finalize(&alice.mask_items(&[&item]).unwrap()).unwrap();
        let ba = alice.remask_and_finalize(&bob.mask_items(&[&item]).unwrap()).unwrap();
        prop_assert_eq!(ab, ba);
    }

    /// Property test: Intersection correctness
    /// Matches are exactly the shared items, indexed on both sides
    #[test]
    fn prop_intersection_exact(
        x in btree_set(0u16..200, 0..24),
        y in btree_set(0u16..200, 0..24),
    ) {
        let x: Vec<Vec<u8>> = x.into_iter().map(|v| v.to_be_bytes().to_vec()).collect();
        let y: Vec<Vec<u8>> = y.into_iter().map(|v| v.to_be_bytes().to_vec()).collect();
        let alice = engine::<Ristretto255>();
        let bob = engine::<Ristretto255>();

        let x_final = bob
            .remask_and_finalize_serialized(&alice.mask_items_serialized(&x).unwrap())
            .unwrap();
        let y_final = alice
            .remask_and_finalize_serialized(&bob.mask_items_serialized(&y).unwrap())
            .unwrap();

        let expected: Vec<(usize, usize)> = x
            .iter()
            .enumerate()
            .filter_map(|(i, item)| y.iter().position(|other| other == item).map(|j| (i, j)))
            .collect();
        prop_assert_eq!(intersect(&x_final, &y_final).pairs, expected);
    }

    /// Property test: Batch equivalence
    /// Parallel batches equal single-item calls on the same engine
    #[test]
    fn prop_batch_equivalence(items in vec(vec(any::<u8>(), 0..16), 0..40)) {
        let config = EngineConfig { parallel: true, parallel_threshold: 1 };
        let engine = EcdhPsi::<Ristretto255>::with_config(config).unwrap();

        let batch = engine.mask_items(&items).unwrap();
        let single: Vec<_> = items
            .iter()
            .map(|item| engine.mask_items(&[item]).unwrap()[0])
            .collect();
        prop_assert_eq!(batch, single);
    }

    /// Property test: Determinism
    #[test]
    fn prop_determinism(item in vec(any::<u8>(), 0..64)) {
        let curve = Ristretto255;
        prop_assert_eq!(curve.hash_to_curve(&item).unwrap(), curve.hash_to_curve(&item).unwrap());
        prop_assert_eq!(finalize_to_token(&item), finalize_to_token(&item));
    }

    /// Property test: Round-trip encoding of masked points
    #[test]
    fn prop_round_trip(items in vec(vec(any::<u8>(), 0..16), 1..8)) {
        let engine = engine::<Secp256k1>();
        for point in engine.mask_items(&items).unwrap() {
            let curve = engine.curve();
            prop_assert_eq!(curve.decode(&curve.encode(&point)).unwrap(), point);
        }
    }

    /// Property test: Rejection
    /// A corrupted entry fails at its own index and leaves the others intact
    #[test]
    fn prop_rejection_keeps_indices(len in 1usize..12, bad in any::<prop::sample::Index>()) {
        let alice = engine::<Ristretto255>();
        let bob = engine::<Ristretto255>();
        let items: Vec<String> = (0..len).map(|i| format!("item-{i}")).collect();
        let mut bytes = bob.mask_items_serialized(&items).unwrap();
        let expected = alice.remask_and_finalize_serialized(&bytes).unwrap();

        let bad = bad.index(len);
        bytes[bad] = vec![0u8; 32];
        let results = alice.remask_and_finalize_serialized_each(&bytes);
        for (index, result) in results.into_iter().enumerate() {
            if index == bad {
                prop_assert_eq!(result, Err(PsiError::InvalidPoint { index, source: PointError::Identity }));
            } else {
                prop_assert_eq!(result, Ok(expected[index]));
            }
        }
    }
}
