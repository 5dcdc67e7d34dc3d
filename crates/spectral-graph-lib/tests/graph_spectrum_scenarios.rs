//! End-to-end scenarios against concrete graphs with known closed-form
//! spectra.

use spectral_graph::graph::Graph;
use spectral_graph::sparse;
use spectral_graph::spectrum::{compute_eigenvalues, MatrixSelector, SortRule};

fn complete_graph(n: usize) -> Graph {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                rows.push(i);
                cols.push(j);
                vals.push(1.0);
            }
        }
    }
    Graph::from_matrix(sparse::from_triplets(n, n, &rows, &cols, &vals)).unwrap()
}

fn cycle_graph(n: usize) -> Graph {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        let j = (i + 1) % n;
        rows.push(i);
        cols.push(j);
        vals.push(1.0);
        rows.push(j);
        cols.push(i);
        vals.push(1.0);
    }
    Graph::from_matrix(sparse::from_triplets(n, n, &rows, &cols, &vals)).unwrap()
}

#[test]
fn complete_graph_k10_normalised_laplacian() {
    let g = complete_graph(10);
    let vals = compute_eigenvalues(
        &g,
        MatrixSelector::NormalisedLaplacian,
        4,
        SortRule::Smallest,
        None,
        0,
    )
    .unwrap();
    assert!((vals[0] - 0.0).abs() < 1e-6);
    for i in 1..4 {
        assert!((vals[i] - 10.0 / 9.0).abs() < 1e-6);
    }
}

#[test]
fn cycle_c20_normalised_laplacian_smallest_five() {
    let g = cycle_graph(20);
    let vals = compute_eigenvalues(
        &g,
        MatrixSelector::NormalisedLaplacian,
        5,
        SortRule::Smallest,
        None,
        0,
    )
    .unwrap();
    let expected = [
        0.0,
        1.0 - (2.0 * std::f64::consts::PI / 20.0).cos(),
        1.0 - (2.0 * std::f64::consts::PI / 20.0).cos(),
        1.0 - (4.0 * std::f64::consts::PI / 20.0).cos(),
        1.0 - (4.0 * std::f64::consts::PI / 20.0).cos(),
    ];
    for (v, e) in vals.iter().zip(expected.iter()) {
        assert!((v - e).abs() < 1e-5, "got {v}, expected {e}");
    }
}

#[test]
fn cycle_c20_combinatorial_laplacian_largest_five() {
    let g = cycle_graph(20);
    let vals = compute_eigenvalues(
        &g,
        MatrixSelector::Laplacian,
        5,
        SortRule::Largest,
        None,
        0,
    )
    .unwrap();
    let expected = [
        2.0 * (1.0 - (std::f64::consts::PI).cos()),
        2.0 * (1.0 - (9.0 * 2.0 * std::f64::consts::PI / 20.0).cos()),
        2.0 * (1.0 - (9.0 * 2.0 * std::f64::consts::PI / 20.0).cos()),
        2.0 * (1.0 - (8.0 * 2.0 * std::f64::consts::PI / 20.0).cos()),
        2.0 * (1.0 - (8.0 * 2.0 * std::f64::consts::PI / 20.0).cos()),
    ];
    let mut got: Vec<f64> = vals.iter().cloned().collect();
    got.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let mut want = expected.to_vec();
    want.sort_by(|a, b| b.partial_cmp(a).unwrap());
    for (v, e) in got.iter().zip(want.iter()) {
        assert!((v - e).abs() < 1e-4, "got {v}, expected {e}");
    }
}

#[test]
fn disconnected_two_plus_two_combinatorial_laplacian() {
    let g = Graph::from_matrix(sparse::from_triplets(
        4,
        4,
        &[0, 1, 2, 3],
        &[1, 0, 3, 2],
        &[2.0, 2.0, 1.0, 1.0],
    ))
    .unwrap();
    let vals =
        compute_eigenvalues(&g, MatrixSelector::Laplacian, 3, SortRule::Smallest, None, 0).unwrap();
    assert!(vals[0].abs() < 1e-6);
    assert!(vals[1].abs() < 1e-6);
    assert!(vals[2] >= 0.1);
}

#[test]
fn normalised_laplacian_spectrum_lies_in_zero_two() {
    // Spec section 8, property 4: every eigenvalue of L_n lies in [0, 2].
    let g = cycle_graph(15);
    let n = g.number_of_vertices();
    let smallest = compute_eigenvalues(
        &g,
        MatrixSelector::NormalisedLaplacian,
        n - 1,
        SortRule::Smallest,
        None,
        0,
    )
    .unwrap();
    for v in smallest.iter() {
        assert!(*v >= -1e-9 && *v <= 2.0 + 1e-9, "eigenvalue {v} out of [0, 2]");
    }
}

#[test]
fn stochastic_block_model_normalised_laplacian() {
    // n=100, k=2 balanced blocks, p=0.5 intra, q=0.01 inter, deterministic RNG.
    use rand::Rng;
    use spectral_graph::RngHandle;

    let n = 100;
    let half = n / 2;
    let mut rng = RngHandle::from_seed(123);
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let same_block = (i < half) == (j < half);
            let prob = if same_block { 0.5 } else { 0.01 };
            let sample: f64 = rng.gen_range(0.0..1.0);
            if sample < prob {
                rows.push(i);
                cols.push(j);
                vals.push(1.0);
                rows.push(j);
                cols.push(i);
                vals.push(1.0);
            }
        }
    }
    let g = Graph::from_matrix(sparse::from_triplets(n, n, &rows, &cols, &vals)).unwrap();
    let vals = compute_eigenvalues(
        &g,
        MatrixSelector::NormalisedLaplacian,
        3,
        SortRule::Smallest,
        None,
        0,
    )
    .unwrap();
    assert!(vals[0].abs() < 1e-6);
    assert!(vals[1] <= 0.2);
    assert!(vals[2] >= 0.5);
}
