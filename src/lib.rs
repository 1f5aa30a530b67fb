// Normalized spectral clustering

#![doc = include_str!("../README.md")]

pub mod datasets;
pub mod eigen;
pub mod embedding;
pub mod error;
pub mod goals;
pub mod graph;
pub mod io;
pub mod kmeans;
pub mod matrix;


pub use eigen::{
    jacobi, Diagonalization, EigenResult, EmbeddingSize, JacobiConfig, JacobiEigensolver,
    Termination,
};
pub use embedding::spectral_embedding;
pub use error::{ErrorKind, Result, SpectralError};
pub use goals::{run_goal, run_kmeans, ClusteringOutput, Goal, GoalOutput, RunContext, SpectralConfig};
pub use graph::{diagonal_degree, normalized_laplacian, weighted_adjacency, DegreeMode};
pub use kmeans::{kmeans_plus_plus, KMeans, KMeansConfig, KMeansOutput};
pub use matrix::Matrix;
