//! End-to-end CKNS-vs-exact accuracy scenario (spec section 8's Gaussian
//! point-cloud scenario), plus the idempotence property across independent
//! constructions.

use rand::Rng;
use rand_distr::StandardNormal;
use spectral_graph::{CknsKde, ExactGaussianKde, RngHandle};

fn gaussian_points(n: usize, dim: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = RngHandle::from_seed(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
        .collect()
}

#[test]
fn ckns_matches_exact_within_wide_tolerance_on_gaussian_cloud() {
    // n=10^4 would be representative of the spec scenario; kept smaller here
    // so the suite runs quickly while still exercising the LSH path (well
    // above HASH_UNIT_CUTOFF).
    let n = 4000;
    let points = gaussian_points(n, 4, 99);
    let exact = ExactGaussianKde::new(points.clone(), 1.0).unwrap();
    let ckns = CknsKde::build(points, 1.0, 0.5, 99).unwrap();

    let mut query_rng = RngHandle::from_seed(1000);
    let mut ratios_in_range = 0;
    let total = 100;
    for _ in 0..total {
        let q: Vec<f64> = (0..4).map(|_| query_rng.sample(StandardNormal)).collect();
        let exact_v = exact.query(&q).unwrap();
        let ckns_v = ckns.query(&q).unwrap();
        if exact_v > 0.0 {
            let ratio = ckns_v / exact_v;
            if (0.3..=2.5).contains(&ratio) {
                ratios_in_range += 1;
            }
        }
    }
    // CKNS is a probabilistic approximation; require a clear majority of
    // queries to land within the wide tolerance rather than every one.
    assert!(ratios_in_range as f64 / total as f64 >= 0.6);
}

#[test]
fn same_seed_builds_are_query_identical() {
    let points = gaussian_points(1200, 3, 7);
    let a = CknsKde::build(points.clone(), 1.0, 0.3, 7).unwrap();
    let b = CknsKde::build(points, 1.0, 0.3, 7).unwrap();

    let mut query_rng = RngHandle::from_seed(55);
    for _ in 0..10 {
        let q: Vec<f64> = (0..3).map(|_| query_rng.sample(StandardNormal)).collect();
        assert_eq!(a.query(&q).unwrap(), b.query(&q).unwrap());
    }
}

#[test]
fn exact_kde_query_batch_matches_caller_thread_path() {
    let points = gaussian_points(50, 2, 3);
    let kde = ExactGaussianKde::new(points, 1.0).unwrap();
    let queries = gaussian_points(200, 2, 4);
    let batch = kde.query_batch(&queries).unwrap();
    assert_eq!(batch.len(), queries.len());
    for (q, v) in queries.iter().zip(batch.iter()) {
        let direct = kde.query(q).unwrap();
        assert!((direct - v).abs() < 1e-12);
    }
}
