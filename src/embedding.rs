// Row-normalized spectral embedding.

use log::info;

use crate::eigen::EigenResult;
use crate::error::Result;
use crate::matrix::Matrix;

/// Scales every row of `matrix` to unit Euclidean norm.
///
/// A row whose norm is exactly zero is divided by one, i.e. left as it is.
pub fn normalize_rows(matrix: &mut Matrix) {
    for mut row in matrix.as_array_mut().rows_mut() {
        let norm = row.dot(&row).sqrt();
        let divisor = if norm == 0.0 { 1.0 } else { norm };
        row.mapv_inplace(|value| value / divisor);
    }
}

/// Builds the `n x K` embedding `T` from the eigensolver output: the eigenvector columns,
/// with each row normalized to unit length.
pub fn spectral_embedding(eigen: &EigenResult) -> Result<Matrix> {
    let mut embedding = eigen.eigenvectors.try_clone()?;
    normalize_rows(&mut embedding);
    info!(
        "Built spectral embedding: {} points in {} dimensions.",
        embedding.rows(),
        embedding.cols()
    );
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_row_normalization_examples() {
        let mut m = Matrix::from_rows(&[vec![3.0, 4.0], vec![0.0, 0.0], vec![-2.0, 0.0]]).unwrap();
        normalize_rows(&mut m);
        assert_abs_diff_eq!(m.get(0, 0), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(m.get(0, 1), 0.8, epsilon = 1e-12);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.get(1, 1), 0.0);
        assert!(!m.get(1, 0).is_nan());
        assert_abs_diff_eq!(m.get(2, 0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spectral_embedding_leaves_input_untouched() {
        let eigen = EigenResult {
            eigenvectors: Matrix::from_rows(&[vec![1.0, 1.0], vec![0.0, 2.0]]).unwrap(),
            eigenvalues: vec![0.0, 0.5],
        };
        let t = spectral_embedding(&eigen).unwrap();
        assert_eq!(t.shape(), (2, 2));
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(t.get(0, 0), h, epsilon = 1e-12);
        assert_abs_diff_eq!(t.get(0, 1), h, epsilon = 1e-12);
        assert_abs_diff_eq!(t.get(1, 1), 1.0, epsilon = 1e-12);
        assert_eq!(eigen.eigenvectors.get(1, 1), 2.0);
        for row in t.row_views() {
            assert_abs_diff_eq!(row.dot(&row), 1.0, epsilon = 1e-12);
        }
    }
}
