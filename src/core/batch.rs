//! Batch orchestration shared by every fingerprint transformer.
//!
//! A transformer only knows how to fingerprint a slice of molecules. This
//! module validates inputs, splits them into contiguous sub-batches, runs the
//! sub-batches on a bounded worker pool and stacks the results back in
//! submission order.

use std::any::Any;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::chem::molecule::{ensure_mols, Molecule, MoleculeInput};
use crate::core::config::BatchConfig;
use crate::core::errors::{MapFpError, Result};
use crate::core::matrix::FingerprintMatrix;

/// Capability shared by fingerprint types: turn a slice of molecules into one
/// matrix row per molecule.
pub trait FingerprintTransformer: Sync {
    /// Length of every output row
    fn n_features_out(&self) -> usize;

    /// Work distribution settings
    fn batch_config(&self) -> &BatchConfig;

    /// Fingerprint one sub-batch. Must return `mols.len()` rows of
    /// `n_features_out()` columns.
    fn calculate_fingerprint(&self, mols: &[Molecule]) -> Result<FingerprintMatrix>;

    /// Validate a mixed batch of inputs and fingerprint it.
    fn transform(&self, inputs: Vec<MoleculeInput>) -> Result<FingerprintMatrix> {
        let mols = ensure_mols(inputs)?;
        transform_batched(self, &mols)
    }
}

/// Number of workers for a configured `n_jobs`.
///
/// `None` means one worker; zero or negative values mean every available
/// processing unit.
pub fn effective_n_jobs(n_jobs: Option<i32>) -> usize {
    match n_jobs {
        None => 1,
        Some(n) if n > 0 => n as usize,
        Some(_) => std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
    }
}

/// Worker threads to start for `batches` sub-batches.
///
/// Never more threads than sub-batches, and never more than the machine's
/// available parallelism.
pub fn pool_size(n_jobs: usize, batches: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    n_jobs.min(batches).min(cpus).max(1)
}

/// Contiguous sub-batch ranges covering `0..len`.
///
/// Without an explicit size every batch holds `max(len / n_jobs, 1)`
/// molecules; the last batch may be shorter.
pub fn partition_batches(len: usize, n_jobs: usize, batch_size: Option<usize>) -> Vec<Range<usize>> {
    let size = batch_size
        .unwrap_or_else(|| (len / n_jobs.max(1)).max(1))
        .max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Fingerprint already-validated molecules with the transformer's batch settings.
///
/// Runs in the calling thread when one worker is configured or the input is
/// empty. Otherwise sub-batches are fanned out over a dedicated rayon pool;
/// any worker error or panic fails the whole call.
pub fn transform_batched<T>(transformer: &T, mols: &[Molecule]) -> Result<FingerprintMatrix>
where
    T: FingerprintTransformer + ?Sized,
{
    let config = transformer.batch_config();
    let n_features = transformer.n_features_out();
    let n_jobs = effective_n_jobs(config.n_jobs);

    if n_jobs == 1 || mols.is_empty() {
        debug!(molecules = mols.len(), "Computing fingerprints sequentially");
        let matrix = transformer.calculate_fingerprint(mols)?;
        check_shape(&matrix, mols.len(), n_features, 0)?;
        return Ok(matrix);
    }

    let batches = partition_batches(mols.len(), n_jobs, config.batch_size);
    let workers = pool_size(n_jobs, batches.len());
    if workers < n_jobs.min(batches.len()) {
        warn!(
            requested = n_jobs,
            workers,
            "n_jobs exceeds available parallelism, clamping worker pool"
        );
    }
    info!(
        molecules = mols.len(),
        workers,
        batches = batches.len(),
        "Dispatching fingerprint batches"
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("mapfp-worker-{idx}"))
        .build()
        .map_err(|e| MapFpError::concurrency(format!("Failed to start worker pool: {e}")))?;

    let progress = config.verbose.then(|| batch_progress_bar(batches.len()));

    let outcomes: Vec<Result<FingerprintMatrix>> = pool.install(|| {
        batches
            .par_iter()
            .enumerate()
            .map(|(batch_idx, range)| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    transformer.calculate_fingerprint(&mols[range.clone()])
                }));
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                match outcome {
                    Ok(result) => result,
                    Err(payload) => Err(worker_panic(batch_idx, payload.as_ref())),
                }
            })
            .collect()
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut parts = Vec::with_capacity(outcomes.len());
    let mut processed = 0;
    for (outcome, range) in outcomes.into_iter().zip(&batches) {
        let part = outcome?;
        check_shape(&part, range.len(), n_features, processed)?;
        processed += range.len();
        parts.push(part);
    }

    let matrix = FingerprintMatrix::vstack(parts)?;
    debug!(
        rows = matrix.nrows(),
        cols = matrix.ncols(),
        "Reassembled fingerprint batches"
    );
    Ok(matrix)
}

fn check_shape(
    matrix: &FingerprintMatrix,
    rows: usize,
    cols: usize,
    processed: usize,
) -> Result<()> {
    if matrix.nrows() == rows && matrix.ncols() == cols {
        return Ok(());
    }
    Err(MapFpError::Pipeline {
        stage: "reassembly".to_string(),
        message: format!(
            "batch returned {}x{} matrix, expected {rows}x{cols}",
            matrix.nrows(),
            matrix.ncols()
        ),
        processed_count: Some(processed),
    })
}

fn worker_panic(batch_idx: usize, payload: &(dyn Any + Send)) -> MapFpError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    MapFpError::Concurrency {
        message: format!("worker panicked on batch {batch_idx}: {reason}"),
        thread_id: rayon::current_thread_index().map(|idx| format!("mapfp-worker-{idx}")),
    }
}

fn batch_progress_bar(batches: usize) -> ProgressBar {
    let pb = ProgressBar::new(batches as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} batches")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FingerprintVariant;

    /// Writes each molecule's atom count into every column.
    struct AtomCounter {
        batch: BatchConfig,
    }

    impl AtomCounter {
        fn new(n_jobs: Option<i32>, batch_size: Option<usize>) -> Self {
            Self {
                batch: BatchConfig {
                    n_jobs,
                    batch_size,
                    verbose: false,
                },
            }
        }
    }

    impl FingerprintTransformer for AtomCounter {
        fn n_features_out(&self) -> usize {
            2
        }

        fn batch_config(&self) -> &BatchConfig {
            &self.batch
        }

        fn calculate_fingerprint(&self, mols: &[Molecule]) -> Result<FingerprintMatrix> {
            if mols.iter().any(|mol| mol.atom_count() == 13) {
                panic!("unlucky molecule");
            }
            let rows = mols
                .iter()
                .map(|mol| vec![mol.atom_count() as u64; 2])
                .collect();
            FingerprintMatrix::from_rows(rows, 2, FingerprintVariant::Count, false)
        }
    }

    struct Truncating(BatchConfig);

    impl FingerprintTransformer for Truncating {
        fn n_features_out(&self) -> usize {
            1
        }

        fn batch_config(&self) -> &BatchConfig {
            &self.0
        }

        fn calculate_fingerprint(&self, _mols: &[Molecule]) -> Result<FingerprintMatrix> {
            FingerprintMatrix::from_rows(vec![vec![1]], 1, FingerprintVariant::Bit, false)
        }
    }

    fn chains(lengths: impl IntoIterator<Item = usize>) -> Vec<MoleculeInput> {
        lengths
            .into_iter()
            .map(|n| MoleculeInput::from("C".repeat(n)))
            .collect()
    }

    #[test]
    fn effective_n_jobs_resolution() {
        assert_eq!(effective_n_jobs(None), 1);
        assert_eq!(effective_n_jobs(Some(3)), 3);
        assert!(effective_n_jobs(Some(0)) >= 1);
        assert!(effective_n_jobs(Some(-1)) >= 1);
    }

    #[test]
    fn pool_never_outgrows_the_work() {
        assert_eq!(pool_size(100_000, 3), pool_size(3, 3));
        assert!(pool_size(100_000, 3) <= 3);
        assert_eq!(pool_size(8, 1), 1);
        assert_eq!(pool_size(1, 0), 1);
    }

    #[test]
    fn huge_n_jobs_on_small_batch_completes() {
        let sequential = AtomCounter::new(None, None).transform(chains([3, 1, 6])).unwrap();
        let parallel = AtomCounter::new(Some(i32::MAX), None)
            .transform(chains([3, 1, 6]))
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn progress_bar_does_not_change_rows() {
        let mut transformer = AtomCounter::new(Some(2), Some(1));
        transformer.batch.verbose = true;
        let with_progress = transformer.transform(chains([2, 5, 4])).unwrap();
        let plain = AtomCounter::new(None, None).transform(chains([2, 5, 4])).unwrap();
        assert_eq!(with_progress, plain);
    }

    #[test]
    fn default_partition_splits_evenly() {
        assert_eq!(partition_batches(10, 3, None), vec![0..3, 3..6, 6..9, 9..10]);
        assert_eq!(partition_batches(2, 8, None), vec![0..1, 1..2]);
        assert_eq!(partition_batches(5, 1, None), vec![0..5]);
        assert!(partition_batches(0, 4, None).is_empty());
    }

    #[test]
    fn explicit_batch_size_wins() {
        assert_eq!(partition_batches(7, 2, Some(3)), vec![0..3, 3..6, 6..7]);
        assert_eq!(partition_batches(3, 2, Some(10)), vec![0..3]);
    }

    #[test]
    fn parallel_rows_keep_input_order() {
        let lengths: Vec<usize> = (1..=40).map(|i| (i * 7) % 12 + 1).collect();
        let sequential = AtomCounter::new(None, None)
            .transform(chains(lengths.clone()))
            .unwrap();

        for (n_jobs, batch_size) in [(Some(2), None), (Some(4), Some(3)), (Some(-1), Some(1))] {
            let parallel = AtomCounter::new(n_jobs, batch_size)
                .transform(chains(lengths.clone()))
                .unwrap();
            assert_eq!(parallel, sequential);
        }

        for (row, &len) in lengths.iter().enumerate() {
            assert_eq!(sequential.row_u64(row), Some(vec![len as u64; 2]));
        }
    }

    #[test]
    fn empty_input_yields_empty_matrix() {
        let matrix = AtomCounter::new(Some(4), None).transform(Vec::new()).unwrap();
        assert_eq!(matrix.nrows(), 0);
        assert_eq!(matrix.ncols(), 2);
    }

    #[test]
    fn invalid_input_fails_before_any_work() {
        let mut inputs = chains([1, 2, 13]);
        inputs.push(MoleculeInput::from("C(("));
        let err = AtomCounter::new(Some(2), None).transform(inputs).unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
    }

    #[test]
    fn worker_panic_fails_whole_batch() {
        let err = AtomCounter::new(Some(2), Some(1))
            .transform(chains([1, 13, 2]))
            .unwrap_err();
        match err {
            MapFpError::Concurrency { message, .. } => {
                assert!(message.contains("unlucky molecule"), "{message}")
            }
            other => panic!("Expected Concurrency error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_batch_shape_is_a_pipeline_error() {
        let transformer = Truncating(BatchConfig {
            n_jobs: Some(2),
            batch_size: Some(2),
            verbose: false,
        });
        let err = transformer.transform(chains([1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, MapFpError::Pipeline { ref stage, .. } if stage == "reassembly"));
    }
}
