//! C5: numerical factorization (`spec.md` §4.5).
//!
//! All three variants operate on a dense working copy of the permuted
//! matrix (`spec.md`: "the naive baseline"), then scatter the result into
//! the pre-sized `Factors` pattern from C4. A pattern slot that happens to
//! receive a computed zero is still written, since the symbolic pattern is
//! authoritative.

mod cholesky;
mod ldlt;
mod lu;

pub use cholesky::cholesky_factorize;
pub use ldlt::ldlt_factorize;
pub use lu::lu_factorize;

use crate::csr::CsrMatrix;
use crate::error::FactorError;
use crate::factors::{Factors, MatrixType};

/// Dispatches on `factors.matrix_type` (`spec.md` §4.5: "selected by
/// matrix_type"). `a` must already be the permuted matrix C2 produced.
pub fn numeric_factorize(a: &CsrMatrix, factors: &mut Factors) -> Result<(), FactorError> {
    match factors.matrix_type {
        MatrixType::RealNonsymmetric => lu_factorize(a, factors),
        MatrixType::RealSpd => cholesky_factorize(a, factors),
        MatrixType::RealSymmetricIndefinite => ldlt_factorize(a, factors),
    }
}

/// Expands `a`'s permuted pattern into a dense row-major working copy,
/// mirroring both triangles when `a.is_symmetric` (the source's
/// `dense_A[col][i] = dense_A[i][col]` mirroring step).
fn to_dense(a: &CsrMatrix) -> Vec<Vec<f64>> {
    let n = a.n;
    let mut dense = vec![vec![0.0; n]; n];
    for i in 0..n {
        let (cols, vals) = a.row(i);
        for (&j, &v) in cols.iter().zip(vals.iter()) {
            dense[i][j] = v;
            if a.is_symmetric && j != i {
                dense[j][i] = v;
            }
        }
    }
    dense
}

/// Writes `value` into `L[row][col]` if that slot exists in the symbolic
/// pattern (`spec.md` §4.5: pattern slots are authoritative, always
/// written even for a computed zero).
fn scatter_l(factors: &mut Factors, row: usize, col: usize, value: f64) {
    let start = factors.l_row_ptr[row];
    let end = factors.l_row_ptr[row + 1];
    if let Ok(pos) = factors.l_col_idx[start..end].binary_search(&col) {
        factors.l_values[start + pos] = value;
    }
}

fn scatter_u(factors: &mut Factors, row: usize, col: usize, value: f64) {
    let start = factors.u_row_ptr[row];
    let end = factors.u_row_ptr[row + 1];
    if let Ok(pos) = factors.u_col_idx[start..end].binary_search(&col) {
        factors.u_values[start + pos] = value;
    }
}
