// End-to-end runs of the library entry points.

use std::io::Write;

use approx::assert_abs_diff_eq;
use spectral_kmeans::datasets::make_blobs;
use spectral_kmeans::io::parse_points;
use spectral_kmeans::{
    run_goal, run_kmeans, ErrorKind, Goal, GoalOutput, JacobiConfig, Matrix, RunContext,
    SpectralConfig,
};
use tempfile::Builder;

const TWO_PAIRS: &str = "0.0,0.0\n0.2,0.1\n8.0,8.0\n8.1,7.9\n";

fn input_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn spk_recovers_two_separated_pairs() {
    let points = parse_points(TWO_PAIRS).unwrap();
    let context = RunContext::new(Goal::Spk, 2, SpectralConfig::default());

    let embedding = context.embed(&points).unwrap();
    assert_eq!(embedding.shape(), (4, 2));

    let clustering = context.cluster(&embedding).unwrap();
    let a = &clustering.kmeans.assignments;
    assert_eq!(a.len(), 4);
    assert_eq!(a[0], a[1], "first pair split: {:?}", a);
    assert_eq!(a[2], a[3], "second pair split: {:?}", a);
    assert_ne!(a[0], a[2], "pairs merged: {:?}", a);
    assert_eq!(clustering.initial_indices.len(), 2);
    assert_eq!(clustering.kmeans.centroids.shape(), (2, 2));
}

#[test]
fn spk_with_eigengap_picks_two_clusters_for_two_pairs() {
    let points = parse_points(TWO_PAIRS).unwrap();
    let context = RunContext::new(Goal::Spk, 0, SpectralConfig::default());
    let embedding = context.embed(&points).unwrap();
    assert_eq!(embedding.cols(), 2);
}

#[test]
fn run_goal_prints_diagnostic_goals_and_returns_embedding_for_spk() {
    let file = input_file(TWO_PAIRS);

    let mut out = Vec::new();
    let result = run_goal(2, "wam", file.path(), &mut out).unwrap();
    assert!(result.is_none());
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("0.0000,"));
    assert_eq!(lines[0].split(',').count(), 4);

    let mut out = Vec::new();
    let t = run_goal(2, "spk", file.path(), &mut out).unwrap().unwrap();
    assert!(out.is_empty());
    assert_eq!(t.shape(), (4, 2));
}

#[test]
fn run_goal_ddg_prints_plain_degrees() {
    let file = input_file("0,0\n0,0\n");
    let mut out = Vec::new();
    run_goal(0, "ddg", file.path(), &mut out).unwrap();
    // Two coincident points: each has degree exp(0) = 1.
    assert_eq!(String::from_utf8(out).unwrap(), "1.0000,0.0000\n0.0000,1.0000\n");
}

#[test]
fn run_goal_jacobi_prints_eigenvalue_header() {
    let file = input_file("2,0\n0,3\n");
    let mut out = Vec::new();
    run_goal(0, "jacobi", file.path(), &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "2.0000,3.0000\n1.0000,0.0000\n0.0000,1.0000\n"
    );
}

#[test]
fn run_goal_rejects_bad_arguments() {
    let file = input_file(TWO_PAIRS);
    let mut sink = Vec::new();
    for (k, goal) in [(2, "pca"), (1, "spk"), (9, "spk"), (0, "jacobi")] {
        let err = run_goal(k, goal, file.path(), &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "k={} goal={}", k, goal);
    }
}

#[test]
fn run_kmeans_on_raw_points() {
    let points = vec![
        vec![1.0, 1.0],
        vec![1.5, 2.0],
        vec![3.0, 4.0],
        vec![5.0, 7.0],
        vec![3.5, 5.0],
        vec![4.5, 5.0],
        vec![3.5, 4.5],
    ];
    let output = run_kmeans(points, 2, 7, &[0, 3], 2).unwrap();
    assert_eq!(output.assignments, vec![0, 0, 1, 1, 1, 1, 1]);
    assert_abs_diff_eq!(output.centroids.get(0, 0), 1.25, epsilon = 1e-12);
    assert_abs_diff_eq!(output.centroids.get(0, 1), 1.5, epsilon = 1e-12);
    assert_abs_diff_eq!(output.centroids.get(1, 0), 3.9, epsilon = 1e-12);
    assert_abs_diff_eq!(output.centroids.get(1, 1), 5.1, epsilon = 1e-12);
}

#[test]
fn blob_pipeline_produces_unit_rows_and_full_assignment() {
    let (points, _labels) = make_blobs(24, 3, 2, 0.4, 11).unwrap();
    let config = SpectralConfig {
        jacobi: JacobiConfig {
            max_iterations: 2_000,
            tolerance: 1e-12,
        },
        ..SpectralConfig::default()
    };
    let context = RunContext::new(Goal::Spk, 3, config);
    let output = context.compute(&points).unwrap();
    let embedding: Matrix = match output {
        GoalOutput::Embedding(t) => t,
        other => panic!("expected an embedding, got {:?}", other),
    };
    for row in embedding.row_views() {
        assert_abs_diff_eq!(row.dot(&row), 1.0, epsilon = 1e-9);
    }
    let clustering = context.cluster(&embedding).unwrap();
    assert_eq!(clustering.kmeans.assignments.len(), 24);
    assert!(clustering.kmeans.assignments.iter().all(|&c| c < 3));
    assert!(clustering.kmeans.iterations >= 1);
}
