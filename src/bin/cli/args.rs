//! CLI Argument Structures
//!
//! Command definitions, argument groups and value enums used by the mapfp
//! binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use mapfp_rs::FingerprintVariant;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// MinHashed atom-pair molecular fingerprints
#[derive(Parser)]
#[command(name = "mapfp")]
#[command(version = VERSION)]
#[command(about = "mapfp - MinHashed atom-pair (MAP) molecular fingerprints")]
#[command(long_about = "
Compute fixed-length MAP fingerprints from SMILES for machine-learning features.

Common Usage:

  # Bit fingerprints (1024 bits, radius 2) for a SMILES file, one JSON object per line
  mapfp fingerprint molecules.smi

  # Count fingerprints on every core, written as CSV
  mapfp fingerprint --variant count --n-jobs -1 --format csv --out fps.csv molecules.smi

  # Raw MinHash digests with a fixed seed
  mapfp fingerprint --variant raw_hashes --fp-size 256 --seed 42 molecules.smi

  # Start from a configuration file
  mapfp init-config --output mapfp.yml
  mapfp fingerprint --config mapfp.yml molecules.smi
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute fingerprints for a file of SMILES
    Fingerprint(Box<FingerprintArgs>),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a mapfp configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct FingerprintArgs {
    /// File with one SMILES per line and an optional identifier column ("-" reads stdin)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Configuration file (YAML); flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fingerprint length
    #[arg(long)]
    pub fp_size: Option<usize>,

    /// Maximum neighborhood radius
    #[arg(long)]
    pub radius: Option<usize>,

    /// Output encoding
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Store rows sparsely (JSON/JSONL write index/value pairs)
    #[arg(long)]
    pub sparse: bool,

    /// Parallel workers; 0 or negative uses every core
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    pub n_jobs: Option<i32>,

    /// Molecules per worker batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// MinHash seed (raw_hashes only)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show a progress bar while batches complete
    #[arg(long)]
    pub progress: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = "mapfp.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "PATH")]
    pub config: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Raw MinHash digest
    #[value(name = "raw_hashes")]
    RawHashes,
    /// Binary presence vector
    Bit,
    /// Count vector
    Count,
}

impl From<VariantArg> for FingerprintVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::RawHashes => FingerprintVariant::RawHashes,
            VariantArg::Bit => FingerprintVariant::Bit,
            VariantArg::Count => FingerprintVariant::Count,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-delimited JSON, one molecule per line
    Jsonl,
    /// Single JSON document
    Json,
    /// Comma-separated values with a header row
    Csv,
}
