// Lloyd's k-means over raw or embedded points, plus k-means++ seeding.

use log::{debug, info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};
use crate::matrix::Matrix;

/// Sweep cap used when no configuration is supplied.
pub const DEFAULT_MAX_KMEANS_ITERATIONS: usize = 100;
/// A centroid moving less than this is considered settled.
pub const DEFAULT_KMEANS_TOLERANCE: f64 = 1e-5;

// --- Points and clusters ---

/// A point plus the index of the cluster it was last assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub coords: Vec<f64>,
    pub cluster: Option<usize>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Self {
            coords,
            cluster: None,
        }
    }

    pub fn zeros(dim: usize) -> Self {
        Self::new(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Squared Euclidean distance to `other`.
    pub fn squared_distance(&self, other: &[f64]) -> f64 {
        self.coords
            .iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Point::new(coords)
    }
}

/// One point per matrix row.
pub fn points_from_matrix(matrix: &Matrix) -> Vec<Point> {
    matrix
        .row_views()
        .map(|row| Point::new(row.to_vec()))
        .collect()
}

/// A cluster's centroid and the running sum of the points assigned to it in the current sweep.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub centroid: Point,
    pub running_sum: Point,
    pub count: usize,
}

impl Cluster {
    pub fn new(centroid: &[f64]) -> Self {
        Self {
            centroid: Point::new(centroid.to_vec()),
            running_sum: Point::zeros(centroid.len()),
            count: 0,
        }
    }

    pub fn add(&mut self, point: &Point) {
        self.count += 1;
        for (sum, value) in self.running_sum.coords.iter_mut().zip(point.coords.iter()) {
            *sum += value;
        }
    }

    /// Moves the centroid to the mean of the accumulated points, then clears the sum and count.
    ///
    /// Returns how far (Euclidean, not squared) the centroid moved. A cluster that received no
    /// points keeps its centroid and reports no movement.
    pub fn recompute_centroid(&mut self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let count = self.count as f64;
        let mean: Vec<f64> = self.running_sum.coords.iter().map(|sum| sum / count).collect();
        let moved = self.centroid.squared_distance(&mean).sqrt();

        self.centroid.coords = mean;
        self.running_sum.coords.iter_mut().for_each(|sum| *sum = 0.0);
        self.count = 0;
        moved
    }
}

// --- Configuration and output ---

/// Settings for Lloyd's iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Maximum number of assignment/update sweeps.
    pub max_iterations: usize,
    /// The run stops after a sweep in which no centroid moved by at least this much.
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        KMeansConfig {
            max_iterations: DEFAULT_MAX_KMEANS_ITERATIONS,
            tolerance: DEFAULT_KMEANS_TOLERANCE,
        }
    }
}

/// Final centroids (`K x d`), the cluster index of every point, and the number of sweeps run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansOutput {
    pub centroids: Matrix,
    pub assignments: Vec<usize>,
    pub iterations: usize,
}

// --- Lloyd's iteration ---

/// Index of the nearest cluster. Ties go to the lowest index.
fn nearest_cluster(clusters: &[Cluster], point: &Point) -> usize {
    let mut best_index = 0;
    let mut best_distance = -1.0;
    for (index, cluster) in clusters.iter().enumerate() {
        let distance = point.squared_distance(&cluster.centroid.coords);
        if best_distance < 0.0 || distance < best_distance {
            best_index = index;
            best_distance = distance;
        }
    }
    best_index
}

fn check_points(points: &[Point]) -> Result<usize> {
    let dim = points.first().map_or(0, Point::dim);
    for (index, point) in points.iter().enumerate() {
        if point.dim() != dim {
            return Err(SpectralError::dimension_mismatch(
                "kmeans",
                (index, dim),
                (index, point.dim()),
            ));
        }
    }
    Ok(dim)
}

/// Lloyd's k-means with externally chosen initial centroids.
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Clusters `points`, starting from the centroids at `initial_indices`.
    ///
    /// Each point's `cluster` tag is updated in place; the output also carries the final
    /// centroids and assignments.
    ///
    /// # Errors
    /// `InvalidInput` if there are no points, no initial indices, an index out of range or a zero
    /// iteration cap; `DimensionMismatch` if the points do not share one dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use spectral_kmeans::kmeans::{KMeans, Point};
    /// let mut points: Vec<Point> = vec![vec![0.0], vec![1.0], vec![9.0], vec![10.0]]
    ///     .into_iter()
    ///     .map(Point::from)
    ///     .collect();
    /// let output = KMeans::default().fit(&mut points, &[0, 3]).unwrap();
    /// assert_eq!(output.assignments, vec![0, 0, 1, 1]);
    /// assert_eq!(output.centroids.get(1, 0), 9.5);
    /// ```
    pub fn fit(&self, points: &mut [Point], initial_indices: &[usize]) -> Result<KMeansOutput> {
        let n = points.len();
        let k = initial_indices.len();
        if n == 0 {
            return Err(SpectralError::invalid_input("k-means needs at least one point"));
        }
        if k == 0 {
            return Err(SpectralError::invalid_input("k-means needs at least one cluster"));
        }
        if self.config.max_iterations == 0 {
            return Err(SpectralError::invalid_input("k-means max_iterations must be positive"));
        }
        if let Some(&bad) = initial_indices.iter().find(|&&index| index >= n) {
            return Err(SpectralError::invalid_input(format!(
                "initial centroid index {} is out of range for {} points",
                bad, n
            )));
        }
        let dim = check_points(points)?;

        info!("Running k-means: {} points, dimension {}, K={}.", n, dim, k);

        let mut clusters: Vec<Cluster> = initial_indices
            .iter()
            .map(|&index| Cluster::new(&points[index].coords))
            .collect();
        let mut assignments = vec![0usize; n];
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            for (point, assignment) in points.iter_mut().zip(assignments.iter_mut()) {
                let index = nearest_cluster(&clusters, point);
                clusters[index].add(point);
                point.cluster = Some(index);
                *assignment = index;
            }

            let mut moved = 0;
            for (index, cluster) in clusters.iter_mut().enumerate() {
                if cluster.count == 0 {
                    warn!("Cluster {} received no points in sweep {}; keeping its centroid.", index, iterations);
                }
                if cluster.recompute_centroid() >= self.config.tolerance {
                    moved += 1;
                }
            }
            debug!("k-means sweep {}: {} centroids moved.", iterations, moved);

            if moved == 0 {
                break;
            }
        }

        let mut centroids = Matrix::zeros(k, dim)?;
        for (row, cluster) in clusters.iter().enumerate() {
            for (col, &value) in cluster.centroid.coords.iter().enumerate() {
                centroids.set(row, col, value);
            }
        }
        info!("k-means finished after {} sweeps.", iterations);

        Ok(KMeansOutput {
            centroids,
            assignments,
            iterations,
        })
    }
}

// --- Seeding ---

/// Chooses `k` initial centroid indices with k-means++.
///
/// The first index is drawn uniformly. Each later one is drawn with probability proportional to
/// the squared distance to the nearest index already chosen. If every remaining weight is zero
/// (all points coincide with chosen ones), the lowest index not yet chosen is taken.
pub fn kmeans_plus_plus(points: &[Point], k: usize, seed: u64) -> Result<Vec<usize>> {
    let n = points.len();
    if k == 0 || k > n {
        return Err(SpectralError::invalid_input(format!(
            "cannot seed {} centroids from {} points",
            k, n
        )));
    }
    check_points(points)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.gen_range(0..n));

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|point| point.squared_distance(&points[chosen[0]].coords))
        .collect();

    while chosen.len() < k {
        let next = match WeightedIndex::new(&nearest) {
            Ok(distribution) => distribution.sample(&mut rng),
            Err(_) => (0..n)
                .find(|index| !chosen.contains(index))
                .ok_or_else(|| SpectralError::invalid_input("no unchosen point left to seed"))?,
        };
        chosen.push(next);
        for (weight, point) in nearest.iter_mut().zip(points.iter()) {
            let distance = point.squared_distance(&points[next].coords);
            if distance < *weight {
                *weight = distance;
            }
        }
    }

    debug!("k-means++ chose initial indices {:?} (seed {}).", chosen, seed);
    Ok(chosen)
}
