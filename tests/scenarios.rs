//! End-to-end scenarios exercising the full pipeline through the public
//! `Solver` façade.

use approx::assert_abs_diff_eq;
use parsolve::csr::CsrMatrix;
use parsolve::factors::MatrixType;
use parsolve::ordering::{apply_permutation, apply_permutation_in_place, minimum_degree};
use parsolve::permutation::Permutation;
use parsolve::solver::{Solver, SymbolicConfig};
use parsolve::transport::{SerialTransport, ThreadTransport};
use rstest::rstest;
use std::thread;

fn tridiagonal_spd(n: usize) -> CsrMatrix {
    let mut triples = Vec::new();
    for i in 0..n {
        triples.push((i, i, (n + 1) as f64));
        if i > 0 {
            triples.push((i, i - 1, -1.0));
            triples.push((i - 1, i, -1.0));
        }
    }
    let mut a = CsrMatrix::from_triples(n, triples).unwrap();
    a.is_symmetric = true;
    a
}

fn max_residual(a: &CsrMatrix, x: &[f64], b: &[f64]) -> f64 {
    let mut ax = vec![0.0; a.n];
    a.spmv(x, &mut ax);
    (0..a.n).map(|i| (b[i] - ax[i]).abs()).fold(0.0, f64::max)
}

/// Scenario 1: Identity.
#[test]
fn identity_scenario() {
    let n = 8;
    let mut a = CsrMatrix::from_triples(n, (0..n).map(|i| (i, i, 1.0)).collect()).unwrap();
    a.is_symmetric = true;
    let original = a.clone();

    let mut solver = Solver::init(MatrixType::RealSpd, SerialTransport);
    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
    solver.factor(&a).unwrap();
    let b = vec![1.0; n];
    let x = solver.solve(1, &b).unwrap();

    for i in 0..n {
        assert_abs_diff_eq!(x[i], 1.0, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(max_residual(&original, &x, &b), 0.0, epsilon = 1e-12);
}

/// Scenario 2: Tridiagonal SPD, dispatched via both non-symmetric (LU) and
/// Cholesky to check the two pipelines agree.
#[rstest]
#[case(MatrixType::RealSpd)]
#[case(MatrixType::RealNonsymmetric)]
fn tridiagonal_scenario(#[case] matrix_type: MatrixType) {
    let n = 100;
    let mut a = tridiagonal_spd(n);
    if matrix_type == MatrixType::RealNonsymmetric {
        a.is_symmetric = false;
    }
    let original = a.clone();

    let mut solver = Solver::init(matrix_type, SerialTransport);
    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
    solver.factor(&a).unwrap();
    let b = vec![1.0; n];
    let x = solver.solve(1, &b).unwrap();

    assert!(max_residual(&original, &x, &b) < 1e-10);
}

/// Scenario 3: Symmetric indefinite 4x4 via LDLT.
#[test]
fn symmetric_indefinite_scenario() {
    let mut a = CsrMatrix::from_triples(
        4,
        vec![
            (0, 0, 2.0), (0, 1, 1.0),
            (1, 0, 1.0), (1, 1, -3.0),
            (2, 2, 2.0), (2, 3, 1.0),
            (3, 2, 1.0), (3, 3, -3.0),
        ],
    )
    .unwrap();
    a.is_symmetric = true;
    let original = a.clone();

    let mut solver = Solver::init(MatrixType::RealSymmetricIndefinite, SerialTransport);
    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
    solver.factor(&a).unwrap();
    let b = vec![1.0; 4];
    let x = solver.solve(1, &b).unwrap();

    assert!(max_residual(&original, &x, &b) < 1e-12);
}

/// Scenario 4: Permutation round-trip.
#[test]
fn permutation_round_trip_scenario() {
    let a = tridiagonal_spd(12);
    let perm = minimum_degree(&a);
    let permuted = apply_permutation(&a, &perm);
    let inv = Permutation::from_perm(perm.inv_perm.clone()).unwrap();
    let restored = apply_permutation(&permuted, &inv);

    for i in 0..a.n {
        for j in 0..a.n {
            assert_abs_diff_eq!(restored.get(i, j), a.get(i, j), epsilon = 1e-15);
        }
    }
}

/// Scenario 4 variant exercising the in-place API used by `Solver::symbolic`.
#[test]
fn permutation_round_trip_in_place() {
    let mut a = tridiagonal_spd(6);
    let original = a.clone();
    let perm = minimum_degree(&a);
    apply_permutation_in_place(&mut a, &perm);
    let inv = Permutation::from_perm(perm.inv_perm.clone()).unwrap();
    apply_permutation_in_place(&mut a, &inv);

    for i in 0..original.n {
        for j in 0..original.n {
            assert_abs_diff_eq!(a.get(i, j), original.get(i, j), epsilon = 1e-15);
        }
    }
}

/// Scenario 5: Refinement from a zero start.
#[test]
fn refinement_scenario() {
    let n = 50;
    let mut a = tridiagonal_spd(n);
    let original = a.clone();

    let mut solver = Solver::init(MatrixType::RealSpd, SerialTransport);
    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
    solver.factor(&a).unwrap();

    let b = vec![1.0; n];
    let mut x = vec![0.0; n];
    solver.refine(&original, 1, &b, &mut x, 5, 1e-12).unwrap();

    let mut ax = vec![0.0; n];
    original.spmv(&x, &mut ax);
    let residual_norm: f64 = (0..n).map(|i| (b[i] - ax[i]).powi(2)).sum::<f64>().sqrt();
    assert!(residual_norm <= 1e-12 * 10.0, "residual norm {residual_norm} too large");
}

/// Scenario 6: Distributed consistency across 1..=4 participants.
#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn distributed_consistency_scenario(#[case] size: usize) {
    let n = 24;
    let a = tridiagonal_spd(n);
    let b = vec![1.0; n];

    let solutions: Vec<Vec<f64>> = if size == 1 {
        let mut a = a.clone();
        let mut solver = Solver::init(MatrixType::RealSpd, SerialTransport);
        solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
        solver.factor(&a).unwrap();
        vec![solver.solve(1, &b).unwrap()]
    } else {
        let group = ThreadTransport::group(size);
        let handles: Vec<_> = group
            .into_iter()
            .map(|transport| {
                let mut a = a.clone();
                let b = b.clone();
                thread::spawn(move || {
                    let mut solver = Solver::init(MatrixType::RealSpd, transport);
                    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
                    solver.factor(&a).unwrap();
                    solver.solve(1, &b).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    };

    let reference = &solutions[0];
    for sol in &solutions[1..] {
        for i in 0..n {
            assert_abs_diff_eq!(sol[i], reference[i], epsilon = 1e-12);
        }
    }
    assert!(max_residual(&a, reference, &b) < 1e-9);
}

/// Invariant 8: `solve(A, solve(A, b)) ≈ solve(A, b)` — refining an
/// already-converged solution should not move it.
#[test]
fn refine_is_idempotent_on_a_converged_solution() {
    let n = 30;
    let mut a = tridiagonal_spd(n);
    let original = a.clone();

    let mut solver = Solver::init(MatrixType::RealSpd, SerialTransport);
    solver.symbolic(&mut a, SymbolicConfig::default()).unwrap();
    solver.factor(&a).unwrap();

    let b = vec![1.0; n];
    let x = solver.solve(1, &b).unwrap();

    let mut x_refined = x.clone();
    solver
        .refine(&original, 1, &b, &mut x_refined, 5, 1e-12)
        .unwrap();

    for i in 0..n {
        assert_abs_diff_eq!(x_refined[i], x[i], epsilon = 1e-10);
    }
}
