//! MinHashed Atom-Pair (MAP) fingerprint.
//!
//! For every atom the canonical SMILES of its neighborhoods at radii
//! `1..=radius` are computed ([`neighborhood`]). Every pair of atoms then
//! contributes one shingle per radius at which both neighborhoods exist,
//! joining the two strings with the bond distance between the atoms
//! ([`shingles`]). The shingle set is finally hashed into a fixed-length
//! vector ([`encoding`]):
//!
//! - `raw_hashes`: MinHash digest, one minimum per permutation
//! - `bit`: folded SHA-1 buckets clipped to presence
//! - `count`: folded SHA-1 bucket counts of `(shingle, occurrences)` pairs
//!
//! ```rust,no_run
//! use mapfp_rs::{FingerprintVariant, MapConfig, MapFingerprint};
//!
//! let config = MapConfig::default()
//!     .with_fp_size(2048)
//!     .with_variant(FingerprintVariant::Count)
//!     .with_n_jobs(-1);
//! let fp = MapFingerprint::new(config)?;
//! let matrix = fp.transform_smiles(&["CCO", "c1ccccc1O"])?;
//! assert_eq!(matrix.ncols(), 2048);
//! # Ok::<(), mapfp_rs::MapFpError>(())
//! ```

pub mod encoding;
pub mod neighborhood;
pub mod shingles;

use tracing::{debug, warn};

use crate::chem::molecule::{Molecule, MoleculeInput};
use crate::core::batch::{transform_batched, FingerprintTransformer};
use crate::core::config::{BatchConfig, MapConfig};
use crate::core::errors::Result;
use crate::core::matrix::FingerprintMatrix;

pub use encoding::{bucket_index, encode, fold};
pub use neighborhood::{neighborhoods, NeighborhoodTable};
pub use shingles::{atom_pair_shingles, distance_matrix, pair_shingle, DISCONNECTED_DISTANCE};

/// MAP fingerprint transformer.
#[derive(Debug, Clone, Default)]
pub struct MapFingerprint {
    config: MapConfig,
}

impl MapFingerprint {
    /// Create a transformer, rejecting invalid configuration up front
    pub fn new(config: MapConfig) -> Result<Self> {
        config.validate()?;
        if config.radius == 0 {
            warn!("MAP radius is 0: every molecule will produce an empty shingle set");
        }
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Length of every fingerprint row
    pub fn n_features_out(&self) -> usize {
        self.config.fp_size
    }

    /// MAP is purely topological
    pub fn requires_conformers(&self) -> bool {
        false
    }

    /// Shingles of one molecule under this configuration
    pub fn shingles(&self, mol: &Molecule) -> Vec<Vec<u8>> {
        let table = neighborhoods(mol, self.config.radius);
        atom_pair_shingles(
            mol,
            &table,
            self.config.radius,
            self.config.variant.counts_shingles(),
        )
    }

    /// Fingerprint row of one molecule, before narrowing to the variant's
    /// element type
    pub fn fingerprint(&self, mol: &Molecule) -> Vec<u64> {
        let shingles = self.shingles(mol);
        encode(
            &shingles,
            self.config.fp_size,
            self.config.variant,
            self.config.seed,
        )
    }

    /// Fingerprint a mixed batch of molecules and SMILES strings
    pub fn transform(&self, inputs: Vec<MoleculeInput>) -> Result<FingerprintMatrix> {
        FingerprintTransformer::transform(self, inputs)
    }

    /// Fingerprint a batch of SMILES strings
    pub fn transform_smiles(&self, smiles: &[&str]) -> Result<FingerprintMatrix> {
        self.transform(smiles.iter().map(|s| MoleculeInput::from(*s)).collect())
    }

    /// Fingerprint a batch of parsed molecules
    pub fn transform_mols(&self, mols: &[Molecule]) -> Result<FingerprintMatrix> {
        transform_batched(self, mols)
    }
}

impl FingerprintTransformer for MapFingerprint {
    fn n_features_out(&self) -> usize {
        self.config.fp_size
    }

    fn batch_config(&self) -> &BatchConfig {
        &self.config.batch
    }

    fn calculate_fingerprint(&self, mols: &[Molecule]) -> Result<FingerprintMatrix> {
        let rows: Vec<Vec<u64>> = mols.iter().map(|mol| self.fingerprint(mol)).collect();
        debug!(
            molecules = mols.len(),
            variant = %self.config.variant,
            "Computed MAP fingerprints"
        );
        FingerprintMatrix::from_rows(
            rows,
            self.config.fp_size,
            self.config.variant,
            self.config.sparse,
        )
    }
}

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;
