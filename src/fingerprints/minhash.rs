//! Seeded MinHash sketch.
//!
//! Each permutation is a universal hash `((a * h + b) mod p) & (2^32 - 1)`
//! over the 32-bit SHA-1 value `h` of an item, with `p = 2^61 - 1` and the
//! product taken in wrapping 64-bit arithmetic. The `(a, b)` pairs are drawn
//! from a ChaCha8 stream seeded by the caller, so equal seeds give equal
//! sketches on every platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::core::errors::{MapFpError, Result};

/// Modulus of the permutation family, the Mersenne prime `2^61 - 1`.
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// Largest value a permuted hash can take; also the empty-slot value.
pub const MAX_HASH: u64 = (1 << 32) - 1;

/// First four bytes of the SHA-1 digest of `data`, read little-endian.
pub fn sha1_hash32(data: &[u8]) -> u32 {
    let digest = Sha1::digest(data);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// MinHash sketch over byte-string items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinHash {
    seed: u64,
    permutations: Vec<(u64, u64)>,
    hashvalues: Vec<u64>,
}

impl MinHash {
    /// Create an empty sketch with `num_perm` permutations chosen by `seed`
    pub fn new(num_perm: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let permutations = (0..num_perm)
            .map(|_| {
                let a = rng.gen_range(1..MERSENNE_PRIME);
                let b = rng.gen_range(0..MERSENNE_PRIME);
                (a, b)
            })
            .collect();

        Self {
            seed,
            permutations,
            hashvalues: vec![MAX_HASH; num_perm],
        }
    }

    /// Number of permutations
    pub fn num_perm(&self) -> usize {
        self.hashvalues.len()
    }

    /// Seed the permutations were drawn from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True when no item has been added
    pub fn is_empty(&self) -> bool {
        self.hashvalues.iter().all(|&v| v == MAX_HASH)
    }

    /// Add one item
    pub fn update(&mut self, item: &[u8]) {
        let hv = u64::from(sha1_hash32(item));
        for (slot, &(a, b)) in self.hashvalues.iter_mut().zip(&self.permutations) {
            let permuted = (a.wrapping_mul(hv).wrapping_add(b) % MERSENNE_PRIME) & MAX_HASH;
            if permuted < *slot {
                *slot = permuted;
            }
        }
    }

    /// Add every item of a collection
    pub fn update_batch<I, B>(&mut self, items: I)
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        for item in items {
            self.update(item.as_ref());
        }
    }

    /// Per-permutation minima
    pub fn digest(&self) -> Vec<u64> {
        self.hashvalues.clone()
    }

    /// Estimated Jaccard similarity of the two underlying sets
    pub fn jaccard(&self, other: &Self) -> Result<f64> {
        self.check_compatible(other)?;
        if self.hashvalues.is_empty() {
            return Ok(0.0);
        }

        let matching = self
            .hashvalues
            .iter()
            .zip(&other.hashvalues)
            .filter(|(a, b)| a == b)
            .count();

        Ok(matching as f64 / self.hashvalues.len() as f64)
    }

    /// Fold another sketch in, giving the sketch of the set union
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        for (slot, &theirs) in self.hashvalues.iter_mut().zip(&other.hashvalues) {
            *slot = (*slot).min(theirs);
        }
        Ok(())
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.seed != other.seed {
            return Err(MapFpError::Validation {
                message: "cannot compare MinHash sketches with different seeds".to_string(),
                field: Some("seed".to_string()),
                expected: Some(self.seed.to_string()),
                actual: Some(other.seed.to_string()),
            });
        }
        if self.num_perm() != other.num_perm() {
            return Err(MapFpError::Validation {
                message: "cannot compare MinHash sketches of different sizes".to_string(),
                field: Some("num_perm".to_string()),
                expected: Some(self.num_perm().to_string()),
                actual: Some(other.num_perm().to_string()),
            });
        }
        Ok(())
    }
}
