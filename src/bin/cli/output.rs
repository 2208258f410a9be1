//! Fingerprint matrix rendering.

use mapfp_rs::FingerprintMatrix;
use serde::Serialize;

use super::args::OutputFormat;
use super::commands::SmilesRecord;

#[derive(Serialize)]
#[serde(untagged)]
enum FingerprintRow<'a> {
    Dense {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<&'a str>,
        smiles: &'a str,
        fingerprint: Vec<u64>,
    },
    Sparse {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<&'a str>,
        smiles: &'a str,
        indices: Vec<usize>,
        values: Vec<u64>,
    },
}

#[derive(Serialize)]
struct FingerprintDocument<'a> {
    variant: String,
    fp_size: usize,
    sparse: bool,
    molecules: Vec<FingerprintRow<'a>>,
}

fn rows<'a>(
    matrix: &FingerprintMatrix,
    records: &'a [SmilesRecord],
) -> anyhow::Result<Vec<FingerprintRow<'a>>> {
    anyhow::ensure!(
        matrix.nrows() == records.len(),
        "fingerprint matrix has {} rows for {} molecules",
        matrix.nrows(),
        records.len()
    );

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let id = record.id.as_deref();
            let smiles = record.smiles.as_str();
            let row = if matrix.is_sparse() {
                let (indices, values) = matrix
                    .row_entries(index)
                    .ok_or_else(|| anyhow::anyhow!("missing fingerprint row {index}"))?
                    .into_iter()
                    .unzip();
                FingerprintRow::Sparse {
                    index,
                    id,
                    smiles,
                    indices,
                    values,
                }
            } else {
                let fingerprint = matrix
                    .row_u64(index)
                    .ok_or_else(|| anyhow::anyhow!("missing fingerprint row {index}"))?;
                FingerprintRow::Dense {
                    index,
                    id,
                    smiles,
                    fingerprint,
                }
            };
            Ok(row)
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(matrix: &FingerprintMatrix, records: &[SmilesRecord]) -> anyhow::Result<String> {
    let mut out = String::from("id,smiles");
    for col in 0..matrix.ncols() {
        out.push_str(&format!(",f{col}"));
    }
    out.push('\n');

    let dense = matrix.to_dense_u64();
    for (record, row) in records.iter().zip(dense.rows()) {
        out.push_str(&csv_field(record.id.as_deref().unwrap_or("")));
        out.push(',');
        out.push_str(&csv_field(&record.smiles));
        for value in row {
            out.push_str(&format!(",{value}"));
        }
        out.push('\n');
    }
    Ok(out)
}

/// Render a fingerprint matrix with its source records in the requested format.
pub fn render(
    matrix: &FingerprintMatrix,
    records: &[SmilesRecord],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let document = FingerprintDocument {
                variant: matrix.variant().to_string(),
                fp_size: matrix.ncols(),
                sparse: matrix.is_sparse(),
                molecules: rows(matrix, records)?,
            };
            let mut out = serde_json::to_string_pretty(&document)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for row in rows(matrix, records)? {
                out.push_str(&serde_json::to_string(&row)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            anyhow::ensure!(
                matrix.nrows() == records.len(),
                "fingerprint matrix has {} rows for {} molecules",
                matrix.nrows(),
                records.len()
            );
            render_csv(matrix, records)
        }
    }
}
