//! Command Execution Logic
//!
//! Configuration loading, SMILES list reading and the command handlers
//! dispatched from `main`.

use std::path::Path;

use anyhow::Context;
use mapfp_rs::{MapConfig, MapFingerprint, MoleculeInput};
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use super::args::{FingerprintArgs, InitConfigArgs, ValidateConfigArgs};
use super::output;

/// One molecule of an input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmilesRecord {
    pub smiles: String,
    pub id: Option<String>,
}

/// Parse a SMILES list: one molecule per line, an optional second column as
/// identifier, blank lines and `#` comments skipped.
pub fn parse_smiles_list(content: &str) -> Vec<SmilesRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let smiles = columns.next()?.to_string();
            let id = columns.next().map(str::to_string);
            Some(SmilesRecord { smiles, id })
        })
        .collect()
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .context("Failed to read SMILES from stdin")?;
        return Ok(content);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read SMILES file: {}", path.display()))
}

/// Load configuration from a file, or the defaults when no file is given
pub async fn load_configuration(path: Option<&Path>) -> anyhow::Result<MapConfig> {
    let Some(path) = path else {
        return Ok(MapConfig::default());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = MapConfig::from_yaml_str(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn apply_overrides(mut config: MapConfig, args: &FingerprintArgs) -> MapConfig {
    if let Some(fp_size) = args.fp_size {
        config.fp_size = fp_size;
    }
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    if let Some(variant) = args.variant {
        config.variant = variant.into();
    }
    if args.sparse {
        config.sparse = true;
    }
    if let Some(n_jobs) = args.n_jobs {
        config.batch.n_jobs = Some(n_jobs);
    }
    if let Some(batch_size) = args.batch_size {
        config.batch.batch_size = Some(batch_size);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.progress {
        config.batch.verbose = true;
    }
    config
}

/// Compute fingerprints for a SMILES list
pub async fn fingerprint_command(args: FingerprintArgs) -> anyhow::Result<()> {
    let config = apply_overrides(load_configuration(args.config.as_deref()).await?, &args);
    let fp = MapFingerprint::new(config)?;

    let records = parse_smiles_list(&read_input(&args.input).await?);
    info!(
        molecules = records.len(),
        fp_size = fp.config().fp_size,
        radius = fp.config().radius,
        variant = %fp.config().variant,
        "Computing MAP fingerprints"
    );

    let inputs: Vec<MoleculeInput> = records
        .iter()
        .map(|record| MoleculeInput::from(record.smiles.as_str()))
        .collect();
    let matrix = tokio::task::spawn_blocking(move || fp.transform(inputs))
        .await
        .context("Fingerprint task failed")??;

    let rendered = output::render(&matrix, &records, args.format)?;
    match &args.out {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!(
                "{} {} fingerprints written to {}",
                "✅".bright_green(),
                records.len(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default mapfp configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!(
        "{}",
        "# Usage: mapfp fingerprint --config your-config.yml molecules.smi".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&MapConfig::default())?;
    println!("{yaml_output}");

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        std::process::exit(1);
    }

    let yaml_content = serde_yaml::to_string(&MapConfig::default())?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Edit fp_size, radius and variant to suit your model");
    println!(
        "   2. Run: {}",
        format!("mapfp fingerprint --config {} <input.smi>", args.output.display()).cyan()
    );

    Ok(())
}

/// Validate a configuration file
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(&args.config)).await {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'mapfp print-default-config' to see valid format".dimmed()
            );
            std::process::exit(1);
        }
    };

    display_config_summary(&config);
    Ok(())
}

/// Print the effective settings as a table
pub fn display_config_summary(config: &MapConfig) {
    #[derive(Tabled)]
    struct ConfigRow {
        setting: String,
        value: String,
    }

    let workers = match config.batch.n_jobs {
        None => "1 (sequential)".to_string(),
        Some(n) if n > 0 => n.to_string(),
        Some(_) => "all cores".to_string(),
    };
    let batch_size = config
        .batch
        .batch_size
        .map_or_else(|| "auto".to_string(), |size| size.to_string());

    let rows = vec![
        ConfigRow {
            setting: "Fingerprint size".to_string(),
            value: config.fp_size.to_string(),
        },
        ConfigRow {
            setting: "Radius".to_string(),
            value: config.radius.to_string(),
        },
        ConfigRow {
            setting: "Variant".to_string(),
            value: config.variant.to_string(),
        },
        ConfigRow {
            setting: "Sparse output".to_string(),
            value: config.sparse.to_string(),
        },
        ConfigRow {
            setting: "Seed".to_string(),
            value: config.seed.to_string(),
        },
        ConfigRow {
            setting: "Workers".to_string(),
            value: workers,
        },
        ConfigRow {
            setting: "Batch size".to_string(),
            value: batch_size,
        },
    ];

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smiles_list_skips_blanks_and_comments() {
        let records = parse_smiles_list("# header\nCCO ethanol\n\n  c1ccccc1  \n#CC\nN\tammonia extra\n");
        assert_eq!(
            records,
            vec![
                SmilesRecord {
                    smiles: "CCO".to_string(),
                    id: Some("ethanol".to_string())
                },
                SmilesRecord {
                    smiles: "c1ccccc1".to_string(),
                    id: None
                },
                SmilesRecord {
                    smiles: "N".to_string(),
                    id: Some("ammonia".to_string())
                },
            ]
        );
    }
}
