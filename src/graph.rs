// Similarity graph construction: weighted adjacency, degree and normalized Laplacian.

use log::{debug, info, warn};
use ndarray::ArrayView1;

use crate::error::Result;
use crate::matrix::Matrix;

/// How [`diagonal_degree`] stores each vertex degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeMode {
    /// The diagonal holds the row sums of W.
    Plain,
    /// The diagonal holds `1 / sqrt(row sum)`, i.e. D^-1/2 built directly.
    InverseSqrt,
}

/// Euclidean (L2) distance between two equally long vectors.
pub fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Builds the weighted adjacency matrix of the points (one point per row).
///
/// For `i != j`, `W[i][j] = exp(-0.5 * ||p_i - p_j||)`. The diagonal is zero. Only the upper
/// triangle is computed; it is mirrored into the lower one, so `W` is exactly symmetric.
pub fn weighted_adjacency(points: &Matrix) -> Result<Matrix> {
    let n = points.rows();
    info!(
        "Building weighted adjacency matrix for {} points of dimension {}.",
        n,
        points.cols()
    );

    let mut weights = Matrix::zeros(n, n)?;
    for i in 0..n {
        for j in (i + 1)..n {
            let weight = (-0.5 * euclidean_distance(points.row(i), points.row(j))).exp();
            weights.set(i, j, weight);
            weights.set(j, i, weight);
        }
    }
    Ok(weights)
}

/// Builds the diagonal degree matrix of a weighted adjacency matrix.
///
/// In [`DegreeMode::InverseSqrt`] a vertex with zero degree gets 0 on the diagonal instead of an
/// infinity, so it contributes nothing to the normalized Laplacian's off-diagonal terms.
pub fn diagonal_degree(weights: &Matrix, mode: DegreeMode) -> Result<Matrix> {
    let n = weights.rows();
    let mut degree = Matrix::zeros(n, weights.cols())?;
    for i in 0..n {
        let row_sum: f64 = weights.row(i).sum();
        let entry = match mode {
            DegreeMode::Plain => row_sum,
            DegreeMode::InverseSqrt if row_sum > 0.0 => 1.0 / row_sum.sqrt(),
            DegreeMode::InverseSqrt => {
                warn!("Vertex {} is isolated (degree {}); using 0 for its D^-1/2 entry.", i, row_sum);
                0.0
            }
        };
        degree.set(i, i, entry);
    }
    debug!("Built {:?} diagonal degree matrix ({}x{}).", mode, n, n);
    Ok(degree)
}

/// Computes `L = I - D^-1/2 * W * D^-1/2` for the given points.
pub fn normalized_laplacian(points: &Matrix) -> Result<Matrix> {
    let weights = weighted_adjacency(points)?;
    let inv_sqrt_degree = diagonal_degree(&weights, DegreeMode::InverseSqrt)?;

    let left = inv_sqrt_degree.matmul(&weights)?;
    let mut laplacian = left.matmul(&inv_sqrt_degree)?;
    laplacian.scale_in_place(-1.0);
    laplacian.add_assign(&Matrix::identity(weights.rows())?)?;

    info!("Built normalized Laplacian ({}x{}).", laplacian.rows(), laplacian.cols());
    Ok(laplacian)
}
