//! Property tests for the seeded MinHash sketch.

use proptest::prelude::*;

use mapfp_rs::fingerprints::minhash::MAX_HASH;
use mapfp_rs::MinHash;

fn items() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z()=|0-9]{1,12}", 0..40)
}

fn sketch(items: &[String], num_perm: usize, seed: u64) -> MinHash {
    let mut sketch = MinHash::new(num_perm, seed);
    sketch.update_batch(items.iter().map(String::as_bytes));
    sketch
}

#[test]
fn fresh_sketch_is_empty() {
    let sketch = MinHash::new(16, 7);
    assert!(sketch.is_empty());
    assert_eq!(sketch.num_perm(), 16);
    assert_eq!(sketch.seed(), 7);
    assert!(sketch.digest().iter().all(|&v| v == MAX_HASH));
}

#[test]
fn mismatched_sketches_cannot_be_compared() {
    let a = MinHash::new(16, 1);
    assert!(a.jaccard(&MinHash::new(16, 2)).is_err());
    assert!(a.jaccard(&MinHash::new(8, 1)).is_err());
    assert!(a.clone().merge(&MinHash::new(16, 2)).is_err());
}

proptest! {
    /// Property: insertion order and duplicates never change the digest
    #[test]
    fn prop_digest_is_a_set_function(items in items(), seed in any::<u64>()) {
        let forward = sketch(&items, 32, seed);

        let mut reversed: Vec<String> = items.iter().rev().cloned().collect();
        reversed.extend(items.iter().cloned());
        let backward = sketch(&reversed, 32, seed);

        prop_assert_eq!(forward.digest(), backward.digest());
    }

    /// Property: every slot stays within the 32-bit hash range
    #[test]
    fn prop_digest_values_are_bounded(items in items(), num_perm in 1usize..64) {
        let digest = sketch(&items, num_perm, 0).digest();
        prop_assert_eq!(digest.len(), num_perm);
        prop_assert!(digest.iter().all(|&v| v <= MAX_HASH));
    }

    /// Property: merging two sketches gives the sketch of the union
    #[test]
    fn prop_merge_is_union(left in items(), right in items(), seed in any::<u64>()) {
        let mut merged = sketch(&left, 24, seed);
        merged.merge(&sketch(&right, 24, seed)).unwrap();

        let union: Vec<String> = left.iter().chain(&right).cloned().collect();
        prop_assert_eq!(merged.digest(), sketch(&union, 24, seed).digest());
    }

    /// Property: a sketch is fully similar to itself
    #[test]
    fn prop_self_similarity_is_one(items in prop::collection::vec("[a-z]{1,8}", 1..20)) {
        let a = sketch(&items, 64, 3);
        prop_assert!((a.jaccard(&a).unwrap() - 1.0).abs() < f64::EPSILON);
    }
}
