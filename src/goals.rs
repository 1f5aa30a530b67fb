//! Goal selection, run configuration and the two library entry points.
//!
//! A run is described by a [`RunContext`]: the goal, the requested K and a [`SpectralConfig`]
//! holding every numeric setting. Nothing is kept in globals; each stage receives what it needs.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::eigen::{EigenResult, EmbeddingSize, JacobiConfig, JacobiEigensolver};
use crate::embedding::spectral_embedding;
use crate::error::{Result, SpectralError};
use crate::graph::{diagonal_degree, normalized_laplacian, weighted_adjacency, DegreeMode};
use crate::io::{read_points, write_eigen, write_indices, write_matrix};
use crate::kmeans::{kmeans_plus_plus, points_from_matrix, KMeans, KMeansConfig, KMeansOutput, Point};
use crate::matrix::Matrix;

/// What a run computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Weighted adjacency matrix.
    Wam,
    /// Diagonal degree matrix (plain row sums).
    Ddg,
    /// Normalized graph Laplacian.
    Lnorm,
    /// Eigenpairs of a symmetric input matrix, unsorted.
    Jacobi,
    /// Full spectral clustering.
    Spk,
}

impl Goal {
    pub fn name(self) -> &'static str {
        match self {
            Goal::Wam => "wam",
            Goal::Ddg => "ddg",
            Goal::Lnorm => "lnorm",
            Goal::Jacobi => "jacobi",
            Goal::Spk => "spk",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Goal {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wam" => Ok(Goal::Wam),
            "ddg" => Ok(Goal::Ddg),
            "lnorm" => Ok(Goal::Lnorm),
            "jacobi" => Ok(Goal::Jacobi),
            "spk" => Ok(Goal::Spk),
            other => Err(SpectralError::invalid_input(format!(
                "unknown goal '{}', expected one of wam, ddg, lnorm, jacobi, spk",
                other
            ))),
        }
    }
}

/// Numeric settings for a run. Every field has a default, so a JSON file only needs the
/// fields it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub jacobi: JacobiConfig,
    pub kmeans: KMeansConfig,
    /// Seed for k-means++ initial centroid selection.
    pub seed: u64,
}

impl SpectralConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Output of a non-clustering goal, or the embedding for `spk`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum GoalOutput {
    Matrix(Matrix),
    Eigen(EigenResult),
    Embedding(Matrix),
}

impl GoalOutput {
    /// Prints in the four-decimal, comma-separated text format.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            GoalOutput::Matrix(matrix) | GoalOutput::Embedding(matrix) => write_matrix(matrix, out),
            GoalOutput::Eigen(eigen) => write_eigen(eigen, out),
        }
    }
}

/// The result of the full spectral clustering run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringOutput {
    /// Rows of the embedding chosen by k-means++ as initial centroids.
    pub initial_indices: Vec<usize>,
    #[serde(flatten)]
    pub kmeans: KMeansOutput,
}

impl ClusteringOutput {
    /// Prints the initial indices on one line, then the final centroids.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_indices(&self.initial_indices, out)?;
        write_matrix(&self.kmeans.centroids, out)
    }
}

/// Everything a single run needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunContext {
    pub goal: Goal,
    /// Requested number of clusters; 0 lets the eigengap heuristic decide.
    pub k: usize,
    pub config: SpectralConfig,
}

impl RunContext {
    pub fn new(goal: Goal, k: usize, config: SpectralConfig) -> Self {
        Self { goal, k, config }
    }

    /// Computes the goal's output for the given points (one per row).
    ///
    /// # Errors
    /// `InvalidInput` if `jacobi` gets a non-square or non-symmetric input, or if `spk` gets
    /// `K > n` or `K == 1`. Any error from the underlying stages is propagated.
    pub fn compute(&self, points: &Matrix) -> Result<GoalOutput> {
        info!(
            "Running goal '{}' on {} points of dimension {}.",
            self.goal,
            points.rows(),
            points.cols()
        );
        match self.goal {
            Goal::Wam => Ok(GoalOutput::Matrix(weighted_adjacency(points)?)),
            Goal::Ddg => {
                let weights = weighted_adjacency(points)?;
                Ok(GoalOutput::Matrix(diagonal_degree(&weights, DegreeMode::Plain)?))
            }
            Goal::Lnorm => Ok(GoalOutput::Matrix(normalized_laplacian(points)?)),
            Goal::Jacobi => {
                if !points.is_square() {
                    return Err(SpectralError::invalid_input(format!(
                        "jacobi needs a square input, got {} rows of dimension {}",
                        points.rows(),
                        points.cols()
                    )));
                }
                let solver = JacobiEigensolver::new(self.config.jacobi);
                Ok(GoalOutput::Eigen(solver.solve(points, points.rows())?))
            }
            Goal::Spk => Ok(GoalOutput::Embedding(self.embed(points)?)),
        }
    }

    /// Builds the row-normalized spectral embedding `T` (n x K).
    pub fn embed(&self, points: &Matrix) -> Result<Matrix> {
        let n = points.rows();
        if self.k > n || self.k == 1 {
            return Err(SpectralError::invalid_input(format!(
                "spk needs K == 0 or 2 <= K <= {}, got K={}",
                n, self.k
            )));
        }
        let size = if self.k == 0 {
            EmbeddingSize::Eigengap
        } else {
            EmbeddingSize::Fixed(self.k)
        };

        let laplacian = normalized_laplacian(points)?;
        let basis = JacobiEigensolver::new(self.config.jacobi)
            .diagonalize(&laplacian)?
            .into_embedding_basis(size)?;
        spectral_embedding(&basis)
    }

    /// Seeds with k-means++ and clusters the rows of an embedding into `embedding.cols()` clusters.
    pub fn cluster(&self, embedding: &Matrix) -> Result<ClusteringOutput> {
        let k = embedding.cols();
        let mut points = points_from_matrix(embedding);
        let initial_indices = kmeans_plus_plus(&points, k, self.config.seed)?;
        debug!("Clustering embedding with K={} from indices {:?}.", k, initial_indices);
        let kmeans = KMeans::new(self.config.kmeans).fit(&mut points, &initial_indices)?;
        Ok(ClusteringOutput {
            initial_indices,
            kmeans,
        })
    }
}

/// Reads `input`, runs `goal_name` with default settings and returns the embedding for `spk`.
///
/// The diagnostic goals write their formatted output to `out` and return `None`; `spk` writes
/// nothing and returns `Some(T)`.
pub fn run_goal<W: Write>(
    k: usize,
    goal_name: &str,
    input: impl AsRef<Path>,
    out: &mut W,
) -> Result<Option<Matrix>> {
    let goal = goal_name.parse::<Goal>()?;
    let context = RunContext::new(goal, k, SpectralConfig::default());
    let points = read_points(input)?;
    match context.compute(&points)? {
        GoalOutput::Embedding(embedding) => Ok(Some(embedding)),
        output => {
            output.write_to(out)?;
            Ok(None)
        }
    }
}

/// Runs Lloyd's k-means with default settings on `n` points of dimension `dim`.
///
/// # Errors
/// `DimensionMismatch` if the point list does not have `n` rows of `dim` values;
/// `InvalidInput` if `initial_indices` does not hold exactly `k` in-range indices.
pub fn run_kmeans(
    points: Vec<Vec<f64>>,
    dim: usize,
    n: usize,
    initial_indices: &[usize],
    k: usize,
) -> Result<KMeansOutput> {
    if points.len() != n {
        return Err(SpectralError::dimension_mismatch(
            "run_kmeans",
            (n, dim),
            (points.len(), dim),
        ));
    }
    if let Some((row, point)) = points.iter().enumerate().find(|(_, p)| p.len() != dim) {
        return Err(SpectralError::dimension_mismatch(
            "run_kmeans",
            (row, dim),
            (row, point.len()),
        ));
    }
    if initial_indices.len() != k {
        return Err(SpectralError::invalid_input(format!(
            "expected {} initial indices, got {}",
            k,
            initial_indices.len()
        )));
    }
    let mut points: Vec<Point> = points.into_iter().map(Point::from).collect();
    KMeans::default().fit(&mut points, initial_indices)
}
