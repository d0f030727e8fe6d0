//! Cholesky factorization for SPD matrices (`spec.md` §4.5): `A = L·Lᵀ`,
//! `L` stores the computed square-root diagonal.

use super::{scatter_l, to_dense};
use crate::csr::CsrMatrix;
use crate::error::FactorError;
use crate::factors::Factors;

pub fn cholesky_factorize(a: &CsrMatrix, factors: &mut Factors) -> Result<(), FactorError> {
    let n = a.n;
    if a.n != factors.n {
        return Err(FactorError::InvalidInput(format!(
            "matrix size {} does not match factors size {}",
            a.n, factors.n
        )));
    }
    log::debug!("Cholesky factorization: n={n}");

    let mut dense = to_dense(a);

    for j in 0..n {
        if dense[j][j] <= 0.0 {
            return Err(FactorError::Numerical(format!(
                "matrix is not positive definite at pivot {j} (A[{j}][{j}] = {})",
                dense[j][j]
            )));
        }
        dense[j][j] = dense[j][j].sqrt();
        let ljj = dense[j][j];

        for i in (j + 1)..n {
            dense[i][j] /= ljj;
        }
        for k in (j + 1)..n {
            let lkj = dense[k][j];
            for i in k..n {
                dense[i][k] -= dense[i][j] * lkj;
            }
        }
    }

    for i in 0..n {
        for j in 0..=i {
            scatter_l(factors, i, j, dense[i][j]);
        }
    }
    factors.perm = (0..n).collect();
    log::debug!("Cholesky factorization done");
    Ok(())
}
