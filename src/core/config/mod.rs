//! Configuration types and management for mapfp-rs.
//!
//! [`MapConfig`] carries every option the MAP fingerprint accepts, including
//! the [`BatchConfig`] shared with the batch orchestrator. Values are checked
//! by [`MapConfig::validate`] before any molecule is processed.

pub mod validation;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{MapFpError, Result};

pub use validation::{validate_optional_positive_usize, validate_positive_usize};

/// Output encoding of a MAP fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintVariant {
    /// Raw MinHash digest, one value per permutation.
    RawHashes,
    /// Folded binary presence vector.
    #[default]
    Bit,
    /// Folded count vector.
    Count,
}

impl FingerprintVariant {
    /// All variants, in declaration order.
    pub const ALL: [FingerprintVariant; 3] = [Self::RawHashes, Self::Bit, Self::Count];

    /// Name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RawHashes => "raw_hashes",
            Self::Bit => "bit",
            Self::Count => "count",
        }
    }

    /// Whether shingles are aggregated into `(shingle, count)` identifiers.
    pub fn counts_shingles(self) -> bool {
        matches!(self, Self::Count)
    }
}

impl fmt::Display for FingerprintVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerprintVariant {
    type Err = MapFpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw_hashes" => Ok(Self::RawHashes),
            "bit" => Ok(Self::Bit),
            "count" => Ok(Self::Count),
            other => Err(MapFpError::config_field(
                format!("variant must be one of raw_hashes, bit, count (got '{other}')"),
                "variant",
            )),
        }
    }
}

/// Work distribution settings shared by every fingerprint transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of parallel workers. `None` runs sequentially; zero or negative
    /// values use every available processing unit.
    pub n_jobs: Option<i32>,

    /// Molecules per sub-batch. `None` splits the input evenly across workers.
    pub batch_size: Option<usize>,

    /// Show a progress bar while sub-batches complete.
    pub verbose: bool,
}

impl BatchConfig {
    /// Validate batch settings
    pub fn validate(&self) -> Result<()> {
        validate_optional_positive_usize(self.batch_size, "batch_size")
    }
}

/// MinHashed atom-pair fingerprint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Length of every output vector
    pub fp_size: usize,

    /// Maximum neighborhood radius around each atom
    pub radius: usize,

    /// Output encoding
    pub variant: FingerprintVariant,

    /// Return a compressed sparse row matrix instead of a dense one
    pub sparse: bool,

    /// Seed selecting the MinHash permutations
    pub seed: u64,

    /// Parallel work distribution
    pub batch: BatchConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fp_size: 1024,
            radius: 2,
            variant: FingerprintVariant::Bit,
            sparse: false,
            seed: 0,
            batch: BatchConfig::default(),
        }
    }
}

impl MapConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.fp_size, "fp_size")?;
        self.batch.validate()?;
        Ok(())
    }

    /// Set the output vector length
    pub fn with_fp_size(mut self, fp_size: usize) -> Self {
        self.fp_size = fp_size;
        self
    }

    /// Set the maximum neighborhood radius
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Set the output encoding
    pub fn with_variant(mut self, variant: FingerprintVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Request sparse output
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Set the MinHash seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of parallel workers
    pub fn with_n_jobs(mut self, n_jobs: i32) -> Self {
        self.batch.n_jobs = Some(n_jobs);
        self
    }

    /// Set an explicit sub-batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch.batch_size = Some(batch_size);
        self
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MapFpError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            MapFpError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }
}
