//! # mapfp-rs: MinHashed Atom-Pair Molecular Fingerprints
//!
//! Fixed-length fingerprint vectors for machine-learning on molecules. Every
//! atom is described by the canonical SMILES of its neighborhoods up to a
//! configured radius; pairs of atoms become shingles tagged with their
//! topological distance, and the shingle set is hashed into a vector:
//!
//! - **raw_hashes**: seeded MinHash digest
//! - **bit**: folded SHA-1 presence vector (`u8`)
//! - **count**: folded SHA-1 count vector (`u32`)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 MapFingerprint (transformer)                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Chemistry       │  MAP pipeline         │  Batch engine     │
//! │                  │                       │                   │
//! │ • SMILES reader  │ • Neighborhoods       │ • Worker pool     │
//! │ • Molecule graph │ • Atom-pair shingles  │ • Sub-batching    │
//! │ • Canonical form │ • Hashing & folding   │ • Dense / CSR     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapfp_rs::{FingerprintVariant, MapConfig, MapFingerprint};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MapConfig::default()
//!         .with_fp_size(1024)
//!         .with_radius(2)
//!         .with_variant(FingerprintVariant::Bit)
//!         .with_n_jobs(4);
//!
//!     let fp = MapFingerprint::new(config)?;
//!     let matrix = fp.transform_smiles(&["CCO", "c1ccccc1C(=O)O"])?;
//!
//!     println!("{} x {} fingerprint matrix", matrix.nrows(), matrix.ncols());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Memory allocator selection (mutually exclusive)
#[cfg(all(feature = "mimalloc", not(feature = "jemalloc")))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(all(feature = "jemalloc", not(feature = "mimalloc")))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

// Configuration, errors and batch plumbing
pub mod core {
    //! Configuration, errors, output matrices and batch orchestration.

    pub mod batch;
    pub mod config;
    pub mod errors;
    pub mod matrix;
}

// Molecule representation
pub mod chem {
    //! Molecular graphs, SMILES reading and canonical SMILES writing.

    pub mod canonical;
    pub mod elements;
    pub mod molecule;
    pub mod smiles;
}

// Fingerprint algorithms
pub mod fingerprints {
    //! Fingerprint algorithms.

    pub mod map;
    pub mod minhash;
}

// Re-export primary types for convenience
pub use chem::molecule::{Atom, BondOrder, Molecule, MoleculeInput};
pub use core::batch::FingerprintTransformer;
pub use core::config::{BatchConfig, FingerprintVariant, MapConfig};
pub use core::errors::{MapFpError, Result, ResultExt};
pub use core::matrix::{CsrMatrix, FingerprintMatrix, MatrixStorage};
pub use fingerprints::map::MapFingerprint;
pub use fingerprints::minhash::MinHash;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
