use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spectral_kmeans::datasets::make_blobs;
use spectral_kmeans::kmeans::{kmeans_plus_plus, points_from_matrix, KMeans};
use spectral_kmeans::{normalized_laplacian, Goal, JacobiEigensolver, RunContext, SpectralConfig};

// Graph construction: weighted adjacency, degrees and the normalized Laplacian
fn bench_laplacian(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalized_laplacian");

    for &(n_samples, dim) in [(50, 2), (200, 5), (500, 10)].iter() {
        let (points, _) = make_blobs(n_samples, 3, dim, 1.0, 31).unwrap();
        group.throughput(Throughput::Elements((n_samples * n_samples) as u64));
        group.bench_with_input(
            BenchmarkId::new("lnorm", format!("{}x{}", n_samples, dim)),
            &points,
            |b, points| b.iter(|| normalized_laplacian(points).unwrap()),
        );
    }
    group.finish();
}

// Jacobi rotations on a Laplacian, with the default rotation cap
fn bench_jacobi(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobi");
    let solver = JacobiEigensolver::default();

    for &n_samples in [20, 50, 100].iter() {
        let (points, _) = make_blobs(n_samples, 3, 2, 1.0, 8).unwrap();
        let laplacian = normalized_laplacian(&points).unwrap();
        group.bench_with_input(
            BenchmarkId::new("diagonalize", n_samples),
            &laplacian,
            |b, laplacian| b.iter(|| solver.diagonalize(laplacian).unwrap()),
        );
    }
    group.finish();
}

// Lloyd's iteration on raw blobs, seeded with k-means++
fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");

    for &(n_samples, dim, k) in [(1000, 10, 3), (5000, 10, 8)].iter() {
        let (points, _) = make_blobs(n_samples, k, dim, 1.0, 31).unwrap();
        let base = points_from_matrix(&points);
        let initial = kmeans_plus_plus(&base, k, 0).unwrap();
        group.throughput(Throughput::Elements((n_samples * dim) as u64));
        group.bench_with_input(
            BenchmarkId::new("fit", format!("{}x{}_k{}", n_samples, dim, k)),
            &base,
            |b, base| {
                b.iter_with_setup(
                    || base.clone(),
                    |mut points| KMeans::default().fit(&mut points, &initial).unwrap(),
                );
            },
        );
    }
    group.finish();
}

// The whole spk pipeline: embedding plus clustering
fn bench_spk(c: &mut Criterion) {
    let mut group = c.benchmark_group("spk");
    group.sample_size(20);

    for &n_samples in [50, 100].iter() {
        let (points, _) = make_blobs(n_samples, 3, 2, 1.0, 170).unwrap();
        let context = RunContext::new(Goal::Spk, 3, SpectralConfig::default());
        group.bench_with_input(BenchmarkId::new("spk", n_samples), &points, |b, points| {
            b.iter(|| {
                let embedding = context.embed(points).unwrap();
                context.cluster(&embedding).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_laplacian, bench_jacobi, bench_kmeans, bench_spk);
criterion_main!(benches);
