//! Output matrices for batch fingerprinting.
//!
//! Rows are molecules, columns are fingerprint positions. Storage is either a
//! dense [`ndarray::Array2`] or a compressed sparse row [`CsrMatrix`]; the
//! element type follows the fingerprint variant (`u8` bits, `u32` counts,
//! `u64` raw MinHash values).

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::core::config::FingerprintVariant;
use crate::core::errors::{MapFpError, Result};

/// Element types a fingerprint matrix can hold.
pub trait FingerprintValue:
    Copy + Default + PartialEq + Into<u64> + Send + Sync + std::fmt::Debug + 'static
{
    /// Convert a raw fingerprint value, saturating at the type's maximum.
    fn from_u64_saturating(value: u64) -> Self;
}

impl FingerprintValue for u8 {
    fn from_u64_saturating(value: u64) -> Self {
        u8::try_from(value).unwrap_or(u8::MAX)
    }
}

impl FingerprintValue for u32 {
    fn from_u64_saturating(value: u64) -> Self {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

impl FingerprintValue for u64 {
    fn from_u64_saturating(value: u64) -> Self {
        value
    }
}

/// Compressed Sparse Row (CSR) matrix.
///
/// For a matrix with `rows` rows and `nnz` stored entries:
/// - `row_ptr` has length `rows + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans `row_ptr[i]..row_ptr[i + 1]`, columns ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix<T> {
    /// Row pointers into `col_indices`/`values`
    pub row_ptr: Vec<usize>,
    /// Column index of each stored entry
    pub col_indices: Vec<usize>,
    /// Value of each stored entry
    pub values: Vec<T>,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl<T> CsrMatrix<T> {
    /// Matrix with no stored entries
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            row_ptr: vec![0; rows + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
            rows,
            cols,
        }
    }

    /// Number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of one row
    pub fn row(&self, row: usize) -> Option<(&[usize], &[T])> {
        if row >= self.rows {
            return None;
        }
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        Some((&self.col_indices[span.clone()], &self.values[span]))
    }
}

impl<T: Copy + Default + PartialEq> CsrMatrix<T> {
    /// Compress a dense matrix, dropping zero entries
    pub fn from_dense(dense: &Array2<T>) -> Self {
        let (rows, cols) = dense.dim();
        let zero = T::default();
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();

        row_ptr.push(0);
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if value != zero {
                    col_indices.push(col);
                    values.push(value);
                }
            }
            row_ptr.push(values.len());
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// Expand into a dense matrix
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.rows, self.cols), T::default());
        for row in 0..self.rows {
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                dense[[row, self.col_indices[idx]]] = self.values[idx];
            }
        }
        dense
    }

    /// Stack matrices with the same column count on top of each other
    pub fn vstack(parts: &[Self]) -> Result<Self> {
        let cols = parts.first().map_or(0, |part| part.cols);
        if let Some(bad) = parts.iter().find(|part| part.cols != cols) {
            return Err(MapFpError::pipeline(
                "reassembly",
                format!("cannot stack {} columns onto {cols}", bad.cols),
            ));
        }

        let mut stacked = Self::empty(0, cols);
        for part in parts {
            let offset = stacked.nnz();
            stacked
                .row_ptr
                .extend(part.row_ptr.iter().skip(1).map(|ptr| ptr + offset));
            stacked.col_indices.extend_from_slice(&part.col_indices);
            stacked.values.extend_from_slice(&part.values);
            stacked.rows += part.rows;
        }
        Ok(stacked)
    }
}

/// Dense or sparse storage of one fingerprint matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixStorage<T> {
    /// Row-major dense array
    Dense(Array2<T>),
    /// Compressed sparse rows
    Sparse(CsrMatrix<T>),
}

impl<T: FingerprintValue> MatrixStorage<T> {
    /// Wrap a dense array, compressing it when `sparse` is set
    pub fn from_dense(dense: Array2<T>, sparse: bool) -> Self {
        if sparse {
            Self::Sparse(CsrMatrix::from_dense(&dense))
        } else {
            Self::Dense(dense)
        }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        match self {
            Self::Dense(dense) => dense.nrows(),
            Self::Sparse(csr) => csr.rows,
        }
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        match self {
            Self::Dense(dense) => dense.ncols(),
            Self::Sparse(csr) => csr.cols,
        }
    }

    /// Whether the storage is compressed
    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    /// Logical contents as a dense array
    pub fn to_dense(&self) -> Array2<T> {
        match self {
            Self::Dense(dense) => dense.clone(),
            Self::Sparse(csr) => csr.to_dense(),
        }
    }

    /// Logical contents of one row
    pub fn row_values(&self, row: usize) -> Option<Vec<T>> {
        match self {
            Self::Dense(dense) => (row < dense.nrows()).then(|| dense.row(row).to_vec()),
            Self::Sparse(csr) => csr.row(row).map(|(cols, values)| {
                let mut dense_row = vec![T::default(); csr.cols];
                for (&col, &value) in cols.iter().zip(values) {
                    dense_row[col] = value;
                }
                dense_row
            }),
        }
    }

    /// Stack same-kind storages in order
    pub fn vstack(parts: Vec<Self>) -> Result<Self> {
        let sparse = match parts.first() {
            Some(first) => first.is_sparse(),
            None => return Err(MapFpError::pipeline("reassembly", "no batches to stack")),
        };
        if parts.iter().any(|part| part.is_sparse() != sparse) {
            return Err(MapFpError::pipeline(
                "reassembly",
                "cannot stack dense and sparse batches together",
            ));
        }

        if sparse {
            let csrs: Vec<CsrMatrix<T>> = parts
                .into_iter()
                .filter_map(|part| match part {
                    Self::Sparse(csr) => Some(csr),
                    Self::Dense(_) => None,
                })
                .collect();
            return CsrMatrix::vstack(&csrs).map(Self::Sparse);
        }

        let views: Vec<ArrayView2<'_, T>> = parts
            .iter()
            .filter_map(|part| match part {
                Self::Dense(dense) => Some(dense.view()),
                Self::Sparse(_) => None,
            })
            .collect();
        concatenate(Axis(0), &views)
            .map(Self::Dense)
            .map_err(|e| MapFpError::pipeline("reassembly", e.to_string()))
    }
}

/// Batch fingerprint output, typed by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintMatrix {
    /// Binary presence vectors
    Bit(MatrixStorage<u8>),
    /// Folded count vectors
    Count(MatrixStorage<u32>),
    /// Raw MinHash digests
    RawHashes(MatrixStorage<u64>),
}

macro_rules! each_storage {
    ($matrix:expr, $storage:ident => $body:expr) => {
        match $matrix {
            FingerprintMatrix::Bit($storage) => $body,
            FingerprintMatrix::Count($storage) => $body,
            FingerprintMatrix::RawHashes($storage) => $body,
        }
    };
}

impl FingerprintMatrix {
    /// Build a matrix from per-molecule rows of raw values.
    ///
    /// Every row must have exactly `ncols` entries.
    pub fn from_rows(
        rows: Vec<Vec<u64>>,
        ncols: usize,
        variant: FingerprintVariant,
        sparse: bool,
    ) -> Result<Self> {
        let nrows = rows.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != ncols) {
            return Err(MapFpError::pipeline(
                "reassembly",
                format!("row {idx} has {} values, expected {ncols}", row.len()),
            ));
        }
        let flat: Vec<u64> = rows.into_iter().flatten().collect();

        fn build<T: FingerprintValue>(
            flat: &[u64],
            shape: (usize, usize),
            sparse: bool,
        ) -> Result<MatrixStorage<T>> {
            let values = flat.iter().map(|&v| T::from_u64_saturating(v)).collect();
            let dense = Array2::from_shape_vec(shape, values)
                .map_err(|e| MapFpError::pipeline("reassembly", e.to_string()))?;
            Ok(MatrixStorage::from_dense(dense, sparse))
        }

        let shape = (nrows, ncols);
        Ok(match variant {
            FingerprintVariant::Bit => Self::Bit(build(&flat, shape, sparse)?),
            FingerprintVariant::Count => Self::Count(build(&flat, shape, sparse)?),
            FingerprintVariant::RawHashes => Self::RawHashes(build(&flat, shape, sparse)?),
        })
    }

    /// A matrix with zero rows
    pub fn empty(ncols: usize, variant: FingerprintVariant, sparse: bool) -> Self {
        fn storage<T: FingerprintValue>(ncols: usize, sparse: bool) -> MatrixStorage<T> {
            if sparse {
                MatrixStorage::Sparse(CsrMatrix::empty(0, ncols))
            } else {
                MatrixStorage::Dense(Array2::from_elem((0, ncols), T::default()))
            }
        }

        match variant {
            FingerprintVariant::Bit => Self::Bit(storage(ncols, sparse)),
            FingerprintVariant::Count => Self::Count(storage(ncols, sparse)),
            FingerprintVariant::RawHashes => Self::RawHashes(storage(ncols, sparse)),
        }
    }

    /// Encoding held by this matrix
    pub fn variant(&self) -> FingerprintVariant {
        match self {
            Self::Bit(_) => FingerprintVariant::Bit,
            Self::Count(_) => FingerprintVariant::Count,
            Self::RawHashes(_) => FingerprintVariant::RawHashes,
        }
    }

    /// Number of molecules
    pub fn nrows(&self) -> usize {
        each_storage!(self, storage => storage.nrows())
    }

    /// Fingerprint length
    pub fn ncols(&self) -> usize {
        each_storage!(self, storage => storage.ncols())
    }

    /// Whether rows are stored compressed
    pub fn is_sparse(&self) -> bool {
        each_storage!(self, storage => storage.is_sparse())
    }

    /// Logical contents widened to `u64`, for comparison and serialization
    pub fn to_dense_u64(&self) -> Array2<u64> {
        each_storage!(self, storage => storage.to_dense().mapv(Into::into))
    }

    /// One row widened to `u64`
    pub fn row_u64(&self, row: usize) -> Option<Vec<u64>> {
        each_storage!(self, storage => storage
            .row_values(row)
            .map(|values| values.into_iter().map(Into::into).collect()))
    }

    /// Stored `(column, value)` entries of one row, zero entries omitted
    pub fn row_entries(&self, row: usize) -> Option<Vec<(usize, u64)>> {
        self.row_u64(row).map(|values| {
            values
                .into_iter()
                .enumerate()
                .filter(|&(_, value)| value != 0)
                .collect()
        })
    }

    /// Stack per-batch matrices in order. All parts must share variant,
    /// storage kind and column count.
    pub fn vstack(parts: Vec<Self>) -> Result<Self> {
        let variant = match parts.first() {
            Some(first) => first.variant(),
            None => return Err(MapFpError::pipeline("reassembly", "no batches to stack")),
        };

        macro_rules! collect_parts {
            ($variant:ident) => {{
                let mut storages = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        Self::$variant(storage) => storages.push(storage),
                        other => {
                            return Err(MapFpError::pipeline(
                                "reassembly",
                                format!("cannot stack {} onto {}", other.variant(), variant),
                            ))
                        }
                    }
                }
                Self::$variant(MatrixStorage::vstack(storages)?)
            }};
        }

        Ok(match variant {
            FingerprintVariant::Bit => collect_parts!(Bit),
            FingerprintVariant::Count => collect_parts!(Count),
            FingerprintVariant::RawHashes => collect_parts!(RawHashes),
        })
    }
}
