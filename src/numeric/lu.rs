//! LU with partial row pivoting (`spec.md` §4.5).

use super::{scatter_l, scatter_u, to_dense};
use crate::csr::CsrMatrix;
use crate::error::FactorError;
use crate::factors::Factors;

/// Absolute pivot floor below which a column is declared singular
/// (`spec.md` §4.5 step 1).
const SINGULAR_FLOOR: f64 = 1e-15;

pub fn lu_factorize(a: &CsrMatrix, factors: &mut Factors) -> Result<(), FactorError> {
    let n = a.n;
    if a.n != factors.n {
        return Err(FactorError::InvalidInput(format!(
            "matrix size {} does not match factors size {}",
            a.n, factors.n
        )));
    }
    log::debug!("LU factorization: n={n}");

    let mut dense = to_dense(a);
    let mut perm: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let mut max_row = k;
        let mut max_val = dense[k][k].abs();
        for i in (k + 1)..n {
            let v = dense[i][k].abs();
            if v > max_val {
                max_val = v;
                max_row = i;
            }
        }
        if max_val < SINGULAR_FLOOR {
            return Err(FactorError::Numerical(format!(
                "column {k} is numerically singular (|pivot| = {max_val:e})"
            )));
        }
        if max_row != k {
            dense.swap(k, max_row);
            perm.swap(k, max_row);
        }

        for i in (k + 1)..n {
            dense[i][k] /= dense[k][k];
            let factor = dense[i][k];
            for j in (k + 1)..n {
                dense[i][j] -= factor * dense[k][j];
            }
        }
    }

    for i in 0..n {
        for j in 0..=i {
            let value = if i == j { 1.0 } else { dense[i][j] };
            scatter_l(factors, i, j, value);
        }
        for j in i..n {
            scatter_u(factors, i, j, dense[i][j]);
        }
    }
    factors.perm = perm;
    log::debug!("LU factorization done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::MatrixType;
    use crate::symbolic::symbolic_factorize;
    use approx::assert_abs_diff_eq;

    #[test]
    fn factors_a_well_conditioned_matrix() {
        let a = CsrMatrix::from_triples(
            3,
            vec![
                (0, 0, 4.0), (0, 1, 3.0), (0, 2, 0.0),
                (1, 0, 6.0), (1, 1, 3.0), (1, 2, 0.0),
                (2, 0, 0.0), (2, 1, 1.0), (2, 2, 2.0),
            ],
        )
        .unwrap();
        let mut factors = symbolic_factorize(&a, MatrixType::RealNonsymmetric).unwrap();
        lu_factorize(&a, &mut factors).unwrap();

        // Reconstruct P*A from L*U using factors.perm and compare to the
        // permuted original.
        for i in 0..3 {
            for j in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    let l_ik = dense_get_l(&factors, i, k);
                    let u_kj = dense_get_u(&factors, k, j);
                    sum += l_ik * u_kj;
                }
                assert_abs_diff_eq!(sum, a.get(factors.perm[i], j), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn singular_column_fails() {
        let a = CsrMatrix::from_triples(2, vec![(0, 0, 0.0), (0, 1, 0.0), (1, 0, 0.0), (1, 1, 0.0)]).unwrap();
        let mut factors = symbolic_factorize(&a, MatrixType::RealNonsymmetric).unwrap();
        let err = lu_factorize(&a, &mut factors).unwrap_err();
        assert!(matches!(err, FactorError::Numerical(_)));
    }

    fn dense_get_l(factors: &Factors, i: usize, j: usize) -> f64 {
        let (cols, vals) = factors.l_row(i);
        cols.iter().position(|&c| c == j).map(|p| vals[p]).unwrap_or(0.0)
    }

    fn dense_get_u(factors: &Factors, i: usize, j: usize) -> f64 {
        let (cols, vals) = factors.u_row(i);
        cols.iter().position(|&c| c == j).map(|p| vals[p]).unwrap_or(0.0)
    }
}
