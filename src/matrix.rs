// Dense row-major matrix used by every stage of the pipeline.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};

/// A dense, rectangular, row-major matrix of `f64`.
///
/// The backing store is an `ndarray::Array2<f64>` in standard (C) layout and always holds
/// exactly `rows * cols` elements. Every allocating constructor reserves its storage fallibly,
/// so running out of memory surfaces as [`SpectralError::AllocationFailure`] instead of an abort,
/// and no half-built matrix is ever handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Array2<f64>,
}

/// Reserves a zero-filled buffer of `rows * cols` elements, reporting failure instead of aborting.
fn try_alloc_zeroed(rows: usize, cols: usize) -> Result<Vec<f64>> {
    let len = rows
        .checked_mul(cols)
        .ok_or_else(|| SpectralError::allocation_failure(usize::MAX))?;
    let mut buffer: Vec<f64> = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SpectralError::allocation_failure(len))?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

impl Matrix {
    // --- Construction ---

    /// Allocates a zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let buffer = try_alloc_zeroed(rows, cols)?;
        Self::from_shape_vec(rows, cols, buffer)
    }

    /// Builds a matrix from a row-major buffer. The buffer length must equal `rows * cols`.
    pub fn from_shape_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let len = values.len();
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|_| SpectralError::dimension_mismatch("from_shape_vec", (rows, cols), (len, 1)))?;
        Ok(Self { data })
    }

    /// Builds a matrix from a slice of equally sized rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use spectral_kmeans::Matrix;
    /// let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.shape(), (2, 2));
    /// assert_eq!(m.get(1, 0), 3.0);
    /// ```
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |row| row.len());
        let mut matrix = Self::zeros(n_rows, n_cols)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(SpectralError::dimension_mismatch(
                    "from_rows",
                    (n_rows, n_cols),
                    (i, row.len()),
                ));
            }
            matrix
                .data
                .row_mut(i)
                .iter_mut()
                .zip(row.iter())
                .for_each(|(dst, &src)| *dst = src);
        }
        Ok(matrix)
    }

    /// Allocates the `dim x dim` identity matrix.
    pub fn identity(dim: usize) -> Result<Self> {
        let mut matrix = Self::zeros(dim, dim)?;
        matrix.data.diag_mut().fill(1.0);
        Ok(matrix)
    }

    /// Fallible deep copy; unlike `clone`, storage exhaustion is reported as an error.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::zeros(self.rows(), self.cols())?;
        copy.copy_from(self)?;
        Ok(copy)
    }

    /// Overwrites `self` with the contents of `source`. Shapes must be identical.
    pub fn copy_from(&mut self, source: &Matrix) -> Result<()> {
        if self.shape() != source.shape() {
            return Err(SpectralError::dimension_mismatch(
                "copy_from",
                self.shape(),
                source.shape(),
            ));
        }
        self.data.assign(&source.data);
        Ok(())
    }

    // --- Shape and element access ---

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// Reads entry `(row, col)`, or reports an out-of-range access.
    pub fn try_get(&self, row: usize, col: usize) -> Result<f64> {
        let (rows, cols) = self.shape();
        self.data
            .get((row, col))
            .copied()
            .ok_or(SpectralError::IndexOutOfBounds { row, col, rows, cols })
    }

    /// Writes entry `(row, col)`, or reports an out-of-range access.
    pub fn try_set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (rows, cols) = self.shape();
        let slot = self
            .data
            .get_mut((row, col))
            .ok_or(SpectralError::IndexOutOfBounds { row, col, rows, cols })?;
        *slot = value;
        Ok(())
    }

    /// Reads entry `(row, col)`.
    ///
    /// # Panics
    /// Panics with the offending index and the matrix shape if the access is out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self.try_get(row, col) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Writes entry `(row, col)`.
    ///
    /// # Panics
    /// Panics with the offending index and the matrix shape if the access is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if let Err(err) = self.try_set(row, col, value) {
            panic!("{}", err);
        }
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.column(index)
    }

    /// Iterates over the rows in order.
    pub fn row_views(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.data.rows().into_iter()
    }

    /// Copies out the main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        self.data.diag().to_vec()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    // --- Arithmetic ---

    /// Returns `self^T` in a newly allocated matrix.
    pub fn transpose(&self) -> Result<Matrix> {
        let mut output = Self::zeros(self.cols(), self.rows())?;
        output.data.assign(&self.data.t());
        Ok(output)
    }

    /// Returns `self * other` in a newly allocated matrix.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols() != other.rows() {
            return Err(SpectralError::dimension_mismatch(
                "matmul",
                self.shape(),
                other.shape(),
            ));
        }
        let mut output = Self::zeros(self.rows(), other.cols())?;
        general_mat_mul(1.0, &self.data, &other.data, 0.0, &mut output.data);
        Ok(output)
    }

    /// Computes `self * other` into `output` without allocating.
    ///
    /// `output` must already be `self.rows() x other.cols()`. Borrowing rules keep it distinct
    /// from both operands.
    pub fn matmul_into(&self, other: &Matrix, output: &mut Matrix) -> Result<()> {
        if self.cols() != other.rows() {
            return Err(SpectralError::dimension_mismatch(
                "matmul_into",
                self.shape(),
                other.shape(),
            ));
        }
        if output.shape() != (self.rows(), other.cols()) {
            return Err(SpectralError::dimension_mismatch(
                "matmul_into",
                output.shape(),
                (self.rows(), other.cols()),
            ));
        }
        general_mat_mul(1.0, &self.data, &other.data, 0.0, &mut output.data);
        Ok(())
    }

    /// Multiplies every entry by `scalar`.
    pub fn scale_in_place(&mut self, scalar: f64) {
        self.data.mapv_inplace(|value| value * scalar);
    }

    /// Returns `self + other` in a newly allocated matrix.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(SpectralError::dimension_mismatch("add", self.shape(), other.shape()));
        }
        let mut output = self.try_clone()?;
        output.add_assign(other)?;
        Ok(output)
    }

    /// Adds `other` into `self`. On a shape mismatch `self` is left untouched.
    pub fn add_assign(&mut self, other: &Matrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(SpectralError::dimension_mismatch(
                "add_assign",
                self.shape(),
                other.shape(),
            ));
        }
        self.data += &other.data;
        Ok(())
    }

    // --- Eigensolver helpers ---

    /// Sum of the squares of all off-diagonal entries.
    pub fn sum_squared_off_diagonal(&self) -> f64 {
        self.data
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, value)| value * value)
            .sum()
    }

    /// Position `(i, j)`, `i < j`, of the largest-magnitude off-diagonal entry.
    ///
    /// Only the upper triangle is scanned, so the matrix is assumed symmetric. The first maximum
    /// in row-major order wins. Returns `None` when the matrix has no off-diagonal entries.
    pub fn index_of_largest_off_diagonal(&self) -> Option<(usize, usize)> {
        let (rows, cols) = self.shape();
        let mut best: Option<(usize, usize)> = None;
        let mut best_magnitude = -1.0;
        for i in 0..rows {
            for j in (i + 1)..cols {
                let magnitude = self.data[[i, j]].abs();
                if magnitude > best_magnitude {
                    best_magnitude = magnitude;
                    best = Some((i, j));
                }
            }
        }
        best
    }

    /// True when the matrix is square and `|a_ij - a_ji| <= tolerance * max(1, |a_ij|, |a_ji|)`.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        for i in 0..n {
            for j in (i + 1)..n {
                let upper = self.data[[i, j]];
                let lower = self.data[[j, i]];
                let scale = 1.0_f64.max(upper.abs()).max(lower.abs());
                if (upper - lower).abs() > tolerance * scale {
                    return false;
                }
            }
        }
        true
    }

    /// Largest absolute entry-wise difference between two equally shaped matrices.
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<f64> {
        if self.shape() != other.shape() {
            return Err(SpectralError::dimension_mismatch(
                "max_abs_diff",
                self.shape(),
                other.shape(),
            ));
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(array: Array2<f64>) -> Self {
        if array.is_standard_layout() {
            Self { data: array }
        } else {
            Self {
                data: array.as_standard_layout().into_owned(),
            }
        }
    }
}
