//! LDLᵀ with Bunch–Kaufman pivoting for symmetric indefinite matrices
//! (`spec.md` §4.5). Full 1×1 and 2×2 pivot support, per the §9 design-note
//! resolution (option (b)).
//!
//! `factors.d_values[k]` stores `D⁻¹[k][k]` for a 1×1 pivot. For a 2×2
//! block at `(k, k+1)`, `d_values[k]`/`d_values[k+1]` store the diagonal of
//! `Dinv` and `d_offdiag[k]` stores `Dinv[k][k+1]`. `L[k+1][k]` is forced to
//! zero for a 2x2 block (unit block-diagonal convention): the intra-block
//! coupling is carried solely by `d_offdiag`, never by `L`, so `solve.rs`'s
//! forward/backward unit-lower sweeps never double-apply it.

use super::to_dense;
use crate::csr::CsrMatrix;
use crate::error::FactorError;
use crate::factors::Factors;

/// Bunch–Kaufman pivoting constant `(1 + sqrt(17)) / 8` (`spec.md` §4.5).
const BK_ALPHA: f64 = 0.6403882032022076;
const SINGULAR_FLOOR: f64 = 1e-15;
const RELATIVE_FLOOR: f64 = 1e-12;

pub fn ldlt_factorize(a: &CsrMatrix, factors: &mut Factors) -> Result<(), FactorError> {
    let n = a.n;
    if a.n != factors.n {
        return Err(FactorError::InvalidInput(format!(
            "matrix size {} does not match factors size {}",
            a.n, factors.n
        )));
    }
    log::debug!("LDLT factorization: n={n}");

    let mut dense = to_dense(a);
    let mut perm: Vec<usize> = (0..n).collect();
    let mut pivot_type = vec![1u8; n];
    let mut d_values = vec![0.0; n];
    let mut d_offdiag = vec![0.0; n];
    let max_diag = (0..n).map(|i| dense[i][i].abs()).fold(0.0_f64, f64::max);

    let mut k = 0usize;
    while k < n {
        let alpha = dense[k][k].abs();

        let (lambda, p) = (k + 1..n)
            .map(|i| (dense[i][k].abs(), i))
            .fold((0.0, k), |acc, cur| if cur.0 > acc.0 { cur } else { acc });

        if lambda == 0.0 {
            // Column k has no off-diagonal entries left: plain 1x1 pivot.
            use_1x1(&mut dense, &mut perm, &mut pivot_type, &mut d_values, k, k, max_diag)?;
            k += 1;
            continue;
        }

        if alpha >= BK_ALPHA * lambda {
            use_1x1(&mut dense, &mut perm, &mut pivot_type, &mut d_values, k, k, max_diag)?;
            k += 1;
            continue;
        }

        let sigma = (k..n)
            .filter(|&j| j != p)
            .map(|j| dense[p][j].abs())
            .fold(0.0_f64, f64::max);

        if alpha * sigma >= BK_ALPHA * lambda * lambda {
            use_1x1(&mut dense, &mut perm, &mut pivot_type, &mut d_values, k, k, max_diag)?;
            k += 1;
        } else if dense[p][p].abs() >= BK_ALPHA * sigma {
            use_1x1(&mut dense, &mut perm, &mut pivot_type, &mut d_values, k, p, max_diag)?;
            k += 1;
        } else {
            use_2x2(&mut dense, &mut perm, &mut pivot_type, &mut d_values, &mut d_offdiag, k, p, n)?;
            k += 2;
        }
    }

    for i in 0..n {
        for j in 0..i {
            if dense[i][j].abs() > 1e-15 {
                super::scatter_l(factors, i, j, dense[i][j]);
            }
        }
        super::scatter_l(factors, i, i, 1.0);
    }
    factors.d_values = d_values;
    factors.d_offdiag = d_offdiag;
    factors.pivot_type = pivot_type;
    factors.perm = perm;
    log::debug!("LDLT factorization done");
    Ok(())
}

fn swap_row_and_col(dense: &mut [Vec<f64>], perm: &mut [usize], i: usize, j: usize) {
    if i == j {
        return;
    }
    dense.swap(i, j);
    let n = dense.len();
    for r in 0..n {
        dense[r].swap(i, j);
    }
    perm.swap(i, j);
}

fn use_1x1(
    dense: &mut [Vec<f64>],
    perm: &mut [usize],
    pivot_type: &mut [u8],
    d_values: &mut [f64],
    k: usize,
    pivot_row: usize,
    max_diag: f64,
) -> Result<(), FactorError> {
    let n = dense.len();
    swap_row_and_col(dense, perm, k, pivot_row);
    pivot_type[k] = 1;

    let d = dense[k][k];
    if d.abs() < SINGULAR_FLOOR || d.abs() < RELATIVE_FLOOR * max_diag {
        return Err(FactorError::Numerical(format!(
            "1x1 pivot at step {k} is below the stability threshold (|d| = {:e})",
            d.abs()
        )));
    }
    d_values[k] = 1.0 / d;

    for i in (k + 1)..n {
        dense[i][k] /= d;
        let factor = dense[i][k];
        for j in (k + 1)..n {
            dense[i][j] -= factor * dense[k][j];
        }
    }
    Ok(())
}

fn use_2x2(
    dense: &mut [Vec<f64>],
    perm: &mut [usize],
    pivot_type: &mut [u8],
    d_values: &mut [f64],
    d_offdiag: &mut [f64],
    k: usize,
    p: usize,
    n: usize,
) -> Result<(), FactorError> {
    swap_row_and_col(dense, perm, k + 1, p);
    pivot_type[k] = 2;
    pivot_type[k + 1] = 2;

    let a11 = dense[k][k];
    let a12 = dense[k][k + 1];
    let a22 = dense[k + 1][k + 1];
    let det = a11 * a22 - a12 * a12;
    if det.abs() < SINGULAR_FLOOR {
        return Err(FactorError::Numerical(format!(
            "2x2 pivot at step {k} is numerically singular (det = {det:e})"
        )));
    }

    // Dinv = [[a22, -a12], [-a12, a11]] / det (`spec.md` §4.5 step 3).
    d_values[k] = a22 / det;
    d_values[k + 1] = a11 / det;
    d_offdiag[k] = -a12 / det;

    for i in (k + 2)..n {
        let l1 = dense[i][k];
        let l2 = dense[i][k + 1];
        let new_l1 = (a22 * l1 - a12 * l2) / det;
        let new_l2 = (a11 * l2 - a12 * l1) / det;
        dense[i][k] = new_l1;
        dense[i][k + 1] = new_l2;
        for j in (k + 2)..n {
            dense[i][j] -= new_l1 * dense[k][j] + new_l2 * dense[k + 1][j];
        }
    }

    // Unit block-diagonal convention: the 2x2 pivot's intra-block coupling
    // lives entirely in `d_offdiag`, not in L, so L[k+1][k] must be zero.
    dense[k + 1][k] = 0.0;
    Ok(())
}
