// Synthetic data for tests and benchmarks.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, SpectralError};
use crate::matrix::Matrix;

/// Samples isotropic Gaussian blobs.
///
/// Centers are drawn uniformly from `[-10, 10)^dim`; points are assigned to centers round-robin
/// and perturbed with `N(0, cluster_std^2)` noise per coordinate. Returns the `n_samples x dim`
/// point matrix and each point's true center index.
pub fn make_blobs(
    n_samples: usize,
    centers: usize,
    dim: usize,
    cluster_std: f64,
    seed: u64,
) -> Result<(Matrix, Vec<usize>)> {
    if centers == 0 || dim == 0 {
        return Err(SpectralError::invalid_input(
            "blobs need at least one center and one dimension",
        ));
    }
    if !(cluster_std.is_finite() && cluster_std >= 0.0) {
        return Err(SpectralError::invalid_input(format!(
            "cluster_std must be a finite non-negative number, got {}",
            cluster_std
        )));
    }
    let noise = Normal::new(0.0, cluster_std)
        .map_err(|e| SpectralError::invalid_input(format!("invalid cluster_std: {}", e)))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let center_coords: Vec<Vec<f64>> = (0..centers)
        .map(|_| (0..dim).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect();

    let mut points = Matrix::zeros(n_samples, dim)?;
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let label = i % centers;
        for (j, &center) in center_coords[label].iter().enumerate() {
            points.set(i, j, center + noise.sample(&mut rng));
        }
        labels.push(label);
    }
    debug!(
        "Generated {} blob points around {} centers in {} dimensions (seed {}).",
        n_samples, centers, dim, seed
    );
    Ok((points, labels))
}
