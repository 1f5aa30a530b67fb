// Cyclic Jacobi eigenvalue algorithm for real symmetric matrices.

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{Result, SpectralError};
use crate::matrix::Matrix;

/// Rotation cap used when no configuration is supplied.
pub const DEFAULT_MAX_JACOBI_ITERATIONS: usize = 100;
/// Convergence threshold on the per-rotation decrease of the squared off-diagonal mass.
pub const DEFAULT_JACOBI_TOLERANCE: f64 = 1e-5;
/// Relative tolerance used when checking that the solver input is symmetric.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

// --- Configuration and output types ---

/// Convergence settings for the Jacobi eigensolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacobiConfig {
    /// Maximum number of rotations. Reaching it is a normal termination.
    pub max_iterations: usize,
    /// The solver stops once `off(A) - off(A')` drops to this value or below.
    pub tolerance: f64,
}

impl Default for JacobiConfig {
    fn default() -> Self {
        JacobiConfig {
            max_iterations: DEFAULT_MAX_JACOBI_ITERATIONS,
            tolerance: DEFAULT_JACOBI_TOLERANCE,
        }
    }
}

/// An eigenvalue tagged with the column of the rotation accumulator that holds its eigenvector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenPair {
    pub value: f64,
    pub column: usize,
}

/// Eigenvectors (as columns, `n x K`) and their eigenvalues (length `K`).
///
/// `eigenvectors.column(i)` corresponds to `eigenvalues[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenResult {
    pub eigenvectors: Matrix,
    pub eigenvalues: Vec<f64>,
}

impl EigenResult {
    /// Number of eigenpairs held.
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }
}

/// Why a Jacobi run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The largest off-diagonal entry was exactly zero.
    Diagonal,
    /// The off-diagonal mass decreased by no more than the tolerance.
    Converged,
    /// The configured rotation cap was reached.
    IterationCap,
}

/// How many leading eigenpairs to keep for a spectral embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSize {
    /// Choose K with the eigengap heuristic.
    Eigengap,
    /// Keep exactly this many eigenpairs (must be at least 1).
    Fixed(usize),
}

// --- Rotation primitives ---

/// Sign with the convention `sign(0) = +1`.
pub fn sign(value: f64) -> f64 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Returns `(c, s)` of the rotation that annihilates `a_ij`.
pub fn rotation_parameters(a_ii: f64, a_jj: f64, a_ij: f64) -> (f64, f64) {
    let theta = (a_jj - a_ii) / (2.0 * a_ij);
    let t = sign(theta) / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    (c, t * c)
}

/// Right-multiplies `v` by the rotation in place; only columns `i` and `j` change.
fn apply_rotation(v: &mut Matrix, i: usize, j: usize, c: f64, s: f64) {
    let array = v.as_array_mut();
    for row in 0..array.nrows() {
        let v_ri = array[[row, i]];
        let v_rj = array[[row, j]];
        array[[row, i]] = c * v_ri - s * v_rj;
        array[[row, j]] = s * v_ri + c * v_rj;
    }
}

/// Writes `P^T A P` into `next`, which must hold a copy of `current` on entry.
fn update_rotated(next: &mut Matrix, current: &Matrix, i: usize, j: usize, c: f64, s: f64) {
    let a = current.as_array();
    let out = next.as_array_mut();

    for r in 0..a.nrows() {
        if r == i || r == j {
            continue;
        }
        let a_ri = a[[r, i]];
        let a_rj = a[[r, j]];
        let new_ri = c * a_ri - s * a_rj;
        let new_rj = c * a_rj + s * a_ri;
        out[[r, i]] = new_ri;
        out[[i, r]] = new_ri;
        out[[r, j]] = new_rj;
        out[[j, r]] = new_rj;
    }

    let a_ii = a[[i, i]];
    let a_jj = a[[j, j]];
    let a_ij = a[[i, j]];
    out[[i, j]] = 0.0;
    out[[j, i]] = 0.0;
    out[[i, i]] = c * c * a_ii + s * s * a_jj - 2.0 * c * s * a_ij;
    out[[j, j]] = s * s * a_ii + c * c * a_jj + 2.0 * c * s * a_ij;
}

// --- Step-wise state machine ---

/// A single applied rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiStep {
    /// Upper-triangle position `(i, j)` that was annihilated.
    pub pivot: (usize, usize),
    pub off_before: f64,
    pub off_after: f64,
}

/// Result of calling [`JacobiIteration::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// A rotation was applied; more may follow.
    Rotated(JacobiStep),
    /// The run is over; further calls keep returning this.
    Finished(Termination),
}

/// The Jacobi algorithm as an explicit state machine.
///
/// Holds the current matrix `A`, its successor `A'` and the rotation accumulator `V`
/// (initially the identity). After every rotation, `V`'s columns are the current eigenvector
/// estimates of the original matrix and `A'` is `V^T A_0 V`.
#[derive(Debug)]
pub struct JacobiIteration {
    current: Matrix,
    next: Matrix,
    rotations: Matrix,
    iterations: usize,
    config: JacobiConfig,
    termination: Option<Termination>,
}

impl JacobiIteration {
    /// Validates the input and prepares the state. The input must be square, finite and symmetric.
    pub fn new(matrix: &Matrix, config: JacobiConfig) -> Result<Self> {
        validate_symmetric_input(matrix)?;
        Ok(Self {
            current: matrix.try_clone()?,
            next: matrix.try_clone()?,
            rotations: Matrix::identity(matrix.rows())?,
            iterations: 0,
            config,
            termination: None,
        })
    }

    /// Applies one rotation, or reports why the run is over.
    pub fn step(&mut self) -> StepOutcome {
        if let Some(termination) = self.termination {
            return StepOutcome::Finished(termination);
        }
        if self.iterations >= self.config.max_iterations {
            return self.finish(Termination::IterationCap);
        }

        // A <- A'. The shapes always agree, so the copy cannot fail.
        self.current.as_array_mut().assign(self.next.as_array());

        let (i, j) = match self.current.index_of_largest_off_diagonal() {
            Some(pivot) => pivot,
            None => return self.finish(Termination::Diagonal),
        };
        let a_ij = self.current.get(i, j);
        if a_ij == 0.0 {
            return self.finish(Termination::Diagonal);
        }

        let (c, s) = rotation_parameters(self.current.get(i, i), self.current.get(j, j), a_ij);
        apply_rotation(&mut self.rotations, i, j, c, s);
        update_rotated(&mut self.next, &self.current, i, j, c, s);
        self.iterations += 1;

        let off_before = self.current.sum_squared_off_diagonal();
        let off_after = self.next.sum_squared_off_diagonal();
        trace!(
            "Jacobi rotation {}: pivot=({}, {}), c={:.6}, s={:.6}, off {:.3e} -> {:.3e}",
            self.iterations, i, j, c, s, off_before, off_after
        );
        if off_before - off_after <= self.config.tolerance {
            self.termination = Some(Termination::Converged);
        }

        StepOutcome::Rotated(JacobiStep {
            pivot: (i, j),
            off_before,
            off_after,
        })
    }

    /// Steps until the run finishes and returns the diagonalization.
    pub fn run(mut self) -> Diagonalization {
        let termination = loop {
            if let StepOutcome::Finished(termination) = self.step() {
                break termination;
            }
        };
        debug!(
            "Jacobi finished after {} rotations ({:?}); remaining off-diagonal mass {:.3e}.",
            self.iterations,
            termination,
            self.next.sum_squared_off_diagonal()
        );
        Diagonalization {
            eigenvalues: self.next.diagonal(),
            eigenvectors: self.rotations,
            iterations: self.iterations,
            termination,
        }
    }

    /// The most recent matrix `A'`.
    pub fn current(&self) -> &Matrix {
        &self.next
    }

    /// The rotation accumulator `V`.
    pub fn rotations(&self) -> &Matrix {
        &self.rotations
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn finish(&mut self, termination: Termination) -> StepOutcome {
        self.termination = Some(termination);
        StepOutcome::Finished(termination)
    }
}

fn validate_symmetric_input(matrix: &Matrix) -> Result<()> {
    if !matrix.is_square() {
        return Err(SpectralError::invalid_input(format!(
            "Jacobi input must be square, got {}x{}",
            matrix.rows(),
            matrix.cols()
        )));
    }
    if matrix.as_array().iter().any(|value| !value.is_finite()) {
        return Err(SpectralError::invalid_input(
            "Jacobi input contains non-finite values",
        ));
    }
    if !matrix.is_symmetric(SYMMETRY_TOLERANCE) {
        return Err(SpectralError::invalid_input("Jacobi input is not symmetric"));
    }
    Ok(())
}

// --- Diagonalization output ---

/// Raw output of a Jacobi run: the converged diagonal in column order and the accumulator `V`.
#[derive(Debug, Clone)]
pub struct Diagonalization {
    /// Diagonal of the final matrix, in original column order.
    pub eigenvalues: Vec<f64>,
    /// Rotation accumulator; column `c` belongs to `eigenvalues[c]`.
    pub eigenvectors: Matrix,
    pub iterations: usize,
    pub termination: Termination,
}

impl Diagonalization {
    /// Eigenpairs sorted ascending by value; equal values keep ascending column order.
    pub fn sorted_pairs(&self) -> Vec<EigenPair> {
        let mut pairs: Vec<EigenPair> = self
            .eigenvalues
            .iter()
            .enumerate()
            .map(|(column, &value)| EigenPair { value, column })
            .collect();
        pairs.sort_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.column.cmp(&b.column))
        });
        pairs
    }

    /// Every eigenpair, unsorted, in diagonal order. Used when the solver runs on its own.
    pub fn into_standalone(self) -> EigenResult {
        EigenResult {
            eigenvectors: self.eigenvectors,
            eigenvalues: self.eigenvalues,
        }
    }

    /// The `K` eigenpairs with the smallest eigenvalues, ascending, for a spectral embedding.
    pub fn into_embedding_basis(self, size: EmbeddingSize) -> Result<EigenResult> {
        let n = self.eigenvalues.len();
        let pairs = self.sorted_pairs();
        let k = match size {
            EmbeddingSize::Eigengap => {
                let sorted_values: Vec<f64> = pairs.iter().map(|pair| pair.value).collect();
                let k = eigengap_heuristic(&sorted_values);
                debug!("Eigengap heuristic selected K={} out of {} eigenvalues.", k, n);
                k
            }
            EmbeddingSize::Fixed(0) => {
                return Err(SpectralError::invalid_input(
                    "embedding size must be at least 1",
                ))
            }
            EmbeddingSize::Fixed(k) if k > n => {
                return Err(SpectralError::invalid_input(format!(
                    "requested {} eigenpairs from a {}x{} matrix",
                    k, n, n
                )))
            }
            EmbeddingSize::Fixed(k) => k,
        };

        let mut eigenvectors = Matrix::zeros(self.eigenvectors.rows(), k)?;
        for (target, pair) in pairs.iter().take(k).enumerate() {
            eigenvectors
                .as_array_mut()
                .column_mut(target)
                .assign(&self.eigenvectors.column(pair.column));
        }
        let eigenvalues = pairs.iter().take(k).map(|pair| pair.value).collect();
        Ok(EigenResult {
            eigenvectors,
            eigenvalues,
        })
    }
}

/// Picks K from the largest gap among the lower half of the sorted spectrum.
///
/// Scans `i` in `[0, n/2)` and returns `i + 1` for the first position whose gap
/// `|v[i] - v[i+1]|` is strictly greater than every earlier one. Returns `n` when there is
/// nothing to scan.
pub fn eigengap_heuristic(sorted_values: &[f64]) -> usize {
    let n = sorted_values.len();
    let mut k = n;
    let mut max_gap = -1.0;
    for i in 0..n / 2 {
        let gap = (sorted_values[i] - sorted_values[i + 1]).abs();
        if gap > max_gap {
            max_gap = gap;
            k = i + 1;
        }
    }
    k
}

// --- Solver front end ---

/// Jacobi eigensolver with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct JacobiEigensolver {
    config: JacobiConfig,
}

impl JacobiEigensolver {
    pub fn new(config: JacobiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JacobiConfig {
        &self.config
    }

    /// Runs Jacobi rotations on a symmetric matrix until it converges or hits the rotation cap.
    ///
    /// # Errors
    /// `InvalidInput` if the matrix is not square, not finite or not symmetric;
    /// `AllocationFailure` if the working matrices cannot be allocated.
    pub fn diagonalize(&self, matrix: &Matrix) -> Result<Diagonalization> {
        info!("Diagonalizing {}x{} matrix with Jacobi rotations.", matrix.rows(), matrix.cols());
        Ok(JacobiIteration::new(matrix, self.config)?.run())
    }

    /// Diagonalizes and formats the output according to `k`, the requested embedding size:
    ///
    /// - `0 < k < n`: the `k` smallest eigenpairs, ascending (ties by original column);
    /// - `k == 0`: as above with `k` picked by [`eigengap_heuristic`];
    /// - `k == n`: all `n` eigenpairs, unsorted, for standalone use.
    ///
    /// # Errors
    /// `InvalidInput` if `k > n` or the matrix is rejected by [`JacobiEigensolver::diagonalize`].
    ///
    /// # Examples
    ///
    /// ```
    /// use spectral_kmeans::{JacobiEigensolver, Matrix};
    /// let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
    /// let smallest = JacobiEigensolver::default().solve(&a, 1).unwrap();
    /// assert_eq!(smallest.eigenvectors.shape(), (2, 1));
    /// assert!((smallest.eigenvalues[0] - 1.0).abs() < 1e-9);
    /// ```
    pub fn solve(&self, matrix: &Matrix, k: usize) -> Result<EigenResult> {
        let n = matrix.rows();
        if k > n {
            return Err(SpectralError::invalid_input(format!(
                "requested {} eigenpairs from a {}x{} matrix",
                k,
                n,
                matrix.cols()
            )));
        }
        let diagonalization = self.diagonalize(matrix)?;
        if k == n {
            Ok(diagonalization.into_standalone())
        } else if k == 0 {
            diagonalization.into_embedding_basis(EmbeddingSize::Eigengap)
        } else {
            diagonalization.into_embedding_basis(EmbeddingSize::Fixed(k))
        }
    }
}

/// Shorthand for `JacobiEigensolver::new(*config).solve(matrix, k)`.
pub fn jacobi(matrix: &Matrix, k: usize, config: &JacobiConfig) -> Result<EigenResult> {
    JacobiEigensolver::new(*config).solve(matrix, k)
}
