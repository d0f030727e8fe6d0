//! C6: triangular solve (`spec.md` §4.6).
//!
//! `rhs`/`sol` are column-major: right-hand side `r` occupies
//! `rhs[r*n .. r*n+n]`.

use crate::error::FactorError;
use crate::factors::{Factors, MatrixType};

const SINGULAR_FLOOR: f64 = 1e-15;

pub fn solve(factors: &Factors, nrhs: usize, rhs: &[f64]) -> Result<Vec<f64>, FactorError> {
    let n = factors.n;
    if rhs.len() != nrhs * n {
        return Err(FactorError::InvalidInput(format!(
            "rhs length {} does not match nrhs*n = {}",
            rhs.len(),
            nrhs * n
        )));
    }

    let mut sol = vec![0.0; nrhs * n];
    for r in 0..nrhs {
        let rhs_col = &rhs[r * n..r * n + n];
        let x = match factors.matrix_type {
            MatrixType::RealNonsymmetric => solve_lu(factors, rhs_col)?,
            MatrixType::RealSymmetricIndefinite => solve_ldlt(factors, rhs_col)?,
            MatrixType::RealSpd => solve_cholesky(factors, rhs_col)?,
        };
        sol[r * n..r * n + n].copy_from_slice(&x);
    }
    Ok(sol)
}

/// `b[i] = rhs[perm[i]]` (`spec.md` §4.6 step 1).
fn permute_rhs(perm: &[usize], rhs: &[f64]) -> Vec<f64> {
    perm.iter().map(|&p| rhs[p]).collect()
}

fn forward_solve_unit_lower(factors: &Factors, b: &[f64]) -> Vec<f64> {
    let n = factors.n;
    let mut y = b.to_vec();
    for i in 0..n {
        let (cols, vals) = factors.l_row(i);
        for (&j, &lij) in cols.iter().zip(vals.iter()) {
            if j < i {
                y[i] -= lij * y[j];
            }
        }
    }
    y
}

fn backward_solve_unit_lower_transpose(factors: &Factors, z: &[f64]) -> Vec<f64> {
    let n = factors.n;
    let mut x = z.to_vec();
    for i in (0..n).rev() {
        let (cols, vals) = factors.l_row(i);
        for (&j, &lij) in cols.iter().zip(vals.iter()) {
            if j < i {
                x[j] -= lij * x[i];
            }
        }
    }
    x
}

fn solve_lu(factors: &Factors, rhs: &[f64]) -> Result<Vec<f64>, FactorError> {
    let n = factors.n;
    let b = permute_rhs(&factors.perm, rhs);

    // Forward: L*y = b, unit diagonal.
    let mut y = b;
    for i in 0..n {
        let (cols, vals) = factors.l_row(i);
        for (&j, &lij) in cols.iter().zip(vals.iter()) {
            if j < i {
                y[i] -= lij * y[j];
            }
        }
    }

    // Backward: U*x = y.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let (cols, vals) = factors.u_row(i);
        let mut sum = y[i];
        let mut diag = None;
        for (&j, &uij) in cols.iter().zip(vals.iter()) {
            if j > i {
                sum -= uij * x[j];
            } else if j == i {
                diag = Some(uij);
            }
        }
        let diag = diag.ok_or_else(|| {
            FactorError::Numerical(format!("missing diagonal entry U[{i}][{i}]"))
        })?;
        if diag.abs() < SINGULAR_FLOOR {
            return Err(FactorError::Numerical(format!(
                "zero diagonal during triangular solve at row {i}"
            )));
        }
        x[i] = sum / diag;
    }

    // No further column permutation for non-symmetric (`spec.md` §4.6 step 4).
    Ok(x)
}

fn solve_ldlt(factors: &Factors, rhs: &[f64]) -> Result<Vec<f64>, FactorError> {
    let n = factors.n;
    let b = permute_rhs(&factors.perm, rhs);
    let y = forward_solve_unit_lower(factors, &b);

    let mut z = vec![0.0; n];
    let mut k = 0usize;
    while k < n {
        if factors.pivot_type[k] == 2 {
            let dinv_kk = factors.d_values[k];
            let dinv_k1k1 = factors.d_values[k + 1];
            let dinv_off = factors.d_offdiag[k];
            let yk = y[k];
            let yk1 = y[k + 1];
            z[k] = dinv_kk * yk + dinv_off * yk1;
            z[k + 1] = dinv_off * yk + dinv_k1k1 * yk1;
            k += 2;
        } else {
            z[k] = factors.d_values[k] * y[k];
            k += 1;
        }
    }

    let x_permuted = backward_solve_unit_lower_transpose(factors, &z);

    // Apply the inverse permutation (`spec.md` §4.6: "x = P^T . (...) . P . b").
    let mut x = vec![0.0; n];
    for (new_i, &old_i) in factors.perm.iter().enumerate() {
        x[old_i] = x_permuted[new_i];
    }
    Ok(x)
}

fn solve_cholesky(factors: &Factors, rhs: &[f64]) -> Result<Vec<f64>, FactorError> {
    let n = factors.n;
    let b = permute_rhs(&factors.perm, rhs);

    // Forward: L*y = b (L has a nonunit diagonal here).
    let mut y = vec![0.0; n];
    for i in 0..n {
        let (cols, vals) = factors.l_row(i);
        let mut sum = b[i];
        let mut diag = 1.0;
        for (&j, &lij) in cols.iter().zip(vals.iter()) {
            if j < i {
                sum -= lij * y[j];
            } else if j == i {
                diag = lij;
            }
        }
        if diag.abs() < SINGULAR_FLOOR {
            return Err(FactorError::Numerical(format!(
                "zero diagonal during triangular solve at row {i}"
            )));
        }
        y[i] = sum / diag;
    }

    // Backward: L^T * z = y.
    let mut z = vec![0.0; n];
    for i in (0..n).rev() {
        let (cols, vals) = factors.l_row(i);
        let diag = cols
            .iter()
            .zip(vals.iter())
            .find(|&(&j, _)| j == i)
            .map(|(_, &v)| v)
            .unwrap_or(1.0);
        let mut sum = y[i];
        for k in (i + 1)..n {
            let (kcols, kvals) = factors.l_row(k);
            if let Ok(pos) = kcols.binary_search(&i) {
                sum -= kvals[pos] * z[k];
            }
        }
        z[i] = sum / diag;
    }

    let mut x = vec![0.0; n];
    for (new_i, &old_i) in factors.perm.iter().enumerate() {
        x[old_i] = z[new_i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::CsrMatrix;
    use crate::symbolic::symbolic_factorize;
    use approx::assert_abs_diff_eq;

    fn spd_tridiag(n: usize) -> CsrMatrix {
        let mut triples = Vec::new();
        for i in 0..n {
            triples.push((i, i, 2.0));
            if i > 0 {
                triples.push((i, i - 1, -1.0));
                triples.push((i - 1, i, -1.0));
            }
        }
        let mut m = CsrMatrix::from_triples(n, triples).unwrap();
        m.is_symmetric = true;
        m
    }

    #[test]
    fn cholesky_solve_matches_direct_inversion() {
        let n = 6;
        let a = spd_tridiag(n);
        let mut factors = symbolic_factorize(&a, MatrixType::RealSpd).unwrap();
        crate::numeric::cholesky_factorize(&a, &mut factors).unwrap();

        let rhs = vec![1.0; n];
        let x = solve(&factors, 1, &rhs).unwrap();

        let mut residual = vec![0.0; n];
        a.spmv(&x, &mut residual);
        for i in 0..n {
            assert_abs_diff_eq!(residual[i], rhs[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn lu_solve_matches_direct_inversion() {
        let a = CsrMatrix::from_triples(
            3,
            vec![
                (0, 0, 4.0), (0, 1, 3.0),
                (1, 0, 6.0), (1, 1, 3.0),
                (2, 1, 1.0), (2, 2, 2.0),
            ],
        )
        .unwrap();
        let mut factors = symbolic_factorize(&a, MatrixType::RealNonsymmetric).unwrap();
        crate::numeric::lu_factorize(&a, &mut factors).unwrap();

        let rhs = vec![1.0, 2.0, 3.0];
        let x = solve(&factors, 1, &rhs).unwrap();

        let mut residual = vec![0.0; 3];
        a.spmv(&x, &mut residual);
        for i in 0..3 {
            assert_abs_diff_eq!(residual[i], rhs[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn ldlt_solve_handles_indefinite_2x2_case() {
        // diag(2,-3,2,-3) with A[0][1]=A[1][0]=1, A[2][3]=A[3][2]=1.
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
        let mut factors = symbolic_factorize(&a, MatrixType::RealSymmetricIndefinite).unwrap();
        crate::numeric::ldlt_factorize(&a, &mut factors).unwrap();

        let rhs = vec![1.0, 1.0, 1.0, 1.0];
        let x = solve(&factors, 1, &rhs).unwrap();

        let mut residual = vec![0.0; 4];
        a.spmv(&x, &mut residual);
        for i in 0..4 {
            assert_abs_diff_eq!(residual[i], rhs[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn multiple_rhs_columns_are_independent() {
        let n = 4;
        let a = spd_tridiag(n);
        let mut factors = symbolic_factorize(&a, MatrixType::RealSpd).unwrap();
        crate::numeric::cholesky_factorize(&a, &mut factors).unwrap();

        let rhs = vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let sol = solve(&factors, 2, &rhs).unwrap();
        assert_eq!(sol.len(), 8);
    }
}
