//! Shingle hashing and folding into fixed-length vectors.

use crate::core::config::FingerprintVariant;
use crate::fingerprints::minhash::{sha1_hash32, MinHash};

/// Bucket of one shingle in a vector of length `fp_size`.
///
/// `fp_size` must be non-zero.
pub fn bucket_index(shingle: &[u8], fp_size: usize) -> usize {
    sha1_hash32(shingle) as usize % fp_size
}

/// Histogram of shingle buckets.
pub fn fold<B: AsRef<[u8]>>(shingles: &[B], fp_size: usize) -> Vec<u64> {
    let mut histogram = vec![0u64; fp_size];
    if fp_size == 0 {
        return histogram;
    }
    for shingle in shingles {
        histogram[bucket_index(shingle.as_ref(), fp_size)] += 1;
    }
    histogram
}

/// Encode a molecule's shingles as one fingerprint row of length `fp_size`.
///
/// `raw_hashes` returns the MinHash digest with `fp_size` permutations drawn
/// from `seed`; `bit` and `count` fold SHA-1 buckets, `bit` clipping every
/// bucket to 0 or 1. The seed only affects `raw_hashes`.
pub fn encode<B: AsRef<[u8]>>(
    shingles: &[B],
    fp_size: usize,
    variant: FingerprintVariant,
    seed: u64,
) -> Vec<u64> {
    match variant {
        FingerprintVariant::RawHashes => {
            let mut sketch = MinHash::new(fp_size, seed);
            sketch.update_batch(shingles);
            sketch.digest()
        }
        FingerprintVariant::Bit => fold(shingles, fp_size)
            .into_iter()
            .map(|count| u64::from(count > 0))
            .collect(),
        FingerprintVariant::Count => fold(shingles, fp_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprints::minhash::MAX_HASH;

    #[test]
    fn bucket_is_sha1_prefix_modulo_size() {
        // SHA-1("abc") prefix read little-endian is 0x363e99a9 = 910072233.
        assert_eq!(bucket_index(b"abc", 1000), 910_072_233 % 1000);
        assert_eq!(bucket_index(b"abc", 1), 0);
    }

    #[test]
    fn bit_clips_and_count_accumulates() {
        let shingles = [b"abc".to_vec(), b"abc".to_vec(), b"xyz".to_vec()];
        let count = encode(&shingles, 64, FingerprintVariant::Count, 0);
        let bit = encode(&shingles, 64, FingerprintVariant::Bit, 0);

        assert_eq!(count.len(), 64);
        assert_eq!(count.iter().sum::<u64>(), 3);
        assert!(count[bucket_index(b"abc", 64)] >= 2);
        assert!(bit.iter().all(|&v| v <= 1));
        for (b, c) in bit.iter().zip(&count) {
            assert_eq!(*b, u64::from(*c > 0));
        }
    }

    #[test]
    fn seed_only_changes_raw_hashes() {
        let shingles = [b"CC|1|CC".to_vec()];
        assert_eq!(
            encode(&shingles, 32, FingerprintVariant::Bit, 1),
            encode(&shingles, 32, FingerprintVariant::Bit, 2)
        );
        assert_ne!(
            encode(&shingles, 32, FingerprintVariant::RawHashes, 1),
            encode(&shingles, 32, FingerprintVariant::RawHashes, 2)
        );
    }

    #[test]
    fn no_shingles() {
        let none: [&[u8]; 0] = [];
        assert_eq!(encode(&none, 8, FingerprintVariant::Bit, 0), vec![0; 8]);
        assert_eq!(
            encode(&none, 8, FingerprintVariant::RawHashes, 0),
            vec![MAX_HASH; 8]
        );
    }
}
