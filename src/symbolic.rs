//! C4: symbolic factorization (`spec.md` §4.4).
//!
//! Computes the sparsity pattern of `L` (and `U` for the non-symmetric
//! case) from the permuted matrix's pattern, applying the classical
//! fill-in rule, and hands back a `Factors` with every numeric slot zeroed
//! and `perm` set to the identity (`spec.md`: "numerical factorization may
//! refine it").

use crate::csr::CsrMatrix;
use crate::error::SolverError;
use crate::factors::{Factors, MatrixType};
use std::collections::BTreeSet;

/// Runs C4 on the already-permuted pattern of `a`. `matrix_type` is set by
/// the caller (`spec.md` §4.4: "matrix_type is set by the caller").
pub fn symbolic_factorize(a: &CsrMatrix, matrix_type: MatrixType) -> Result<Factors, SolverError> {
    let n = a.n;
    log::debug!("symbolic factorization: n={n}, nnz={}, matrix_type={matrix_type:?}", a.nnz());

    let l_pattern = lower_fill_pattern(a);
    let (l_row_ptr, l_col_idx) = pattern_to_csr(&l_pattern);
    let l_nnz = l_row_ptr[n];

    let (u_row_ptr, u_col_idx) = match matrix_type {
        MatrixType::RealNonsymmetric => {
            let u_pattern = upper_fill_pattern(a);
            pattern_to_csr(&u_pattern)
        }
        MatrixType::RealSpd | MatrixType::RealSymmetricIndefinite => (Vec::new(), Vec::new()),
    };
    let u_nnz = if u_row_ptr.is_empty() { 0 } else { u_row_ptr[n] };

    let factors = Factors {
        n,
        matrix_type,
        l_row_ptr,
        l_col_idx,
        l_values: vec![0.0; l_nnz],
        u_row_ptr,
        u_col_idx,
        u_values: vec![0.0; u_nnz],
        d_values: vec![0.0; n],
        d_offdiag: vec![0.0; n],
        pivot_type: vec![1u8; n],
        perm: (0..n).collect(),
    };
    log::debug!("symbolic factorization done: nnz_L={l_nnz}, nnz_U={u_nnz}");
    Ok(factors)
}

/// Seeds with the lower triangle of `a`, then applies the classical
/// fill-in rule: for `k` in column order, for every `i > k` with
/// `A[i][k] != 0`, for every `j < i` with `A[k][j] != 0`, mark `L[i][j]`.
fn lower_fill_pattern(a: &CsrMatrix) -> Vec<BTreeSet<usize>> {
    let n = a.n;
    let mut pattern: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for i in 0..n {
        // L always includes the diagonal (`spec.md` §3), even when `a`
        // stores no explicit diagonal entry at `i`.
        pattern[i].insert(i);
        let (cols, _) = a.row(i);
        for &j in cols {
            if j <= i {
                pattern[i].insert(j);
            }
        }
    }
    for k in 0..n {
        let row_k: Vec<usize> = pattern[k].iter().copied().collect();
        for i in (k + 1)..n {
            if pattern[i].contains(&k) {
                for &j in &row_k {
                    if j < i {
                        pattern[i].insert(j);
                    }
                }
            }
        }
    }
    pattern
}

/// Seeds with the upper triangle of `a`; the symmetric fill rule applied
/// to the transpose (`spec.md` §4.4: "symmetric fill rule on its
/// transpose").
fn upper_fill_pattern(a: &CsrMatrix) -> Vec<BTreeSet<usize>> {
    let at = a.transpose();
    let lower_of_at = lower_fill_pattern(&at);
    let n = a.n;
    let mut pattern: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for i in 0..n {
        for &j in &lower_of_at[i] {
            pattern[j].insert(i);
        }
    }
    pattern
}

fn pattern_to_csr(pattern: &[BTreeSet<usize>]) -> (Vec<usize>, Vec<usize>) {
    let n = pattern.len();
    let mut row_ptr = vec![0usize; n + 1];
    for i in 0..n {
        row_ptr[i + 1] = row_ptr[i] + pattern[i].len();
    }
    let mut col_idx = vec![0usize; row_ptr[n]];
    for i in 0..n {
        for (offset, &j) in pattern[i].iter().enumerate() {
            col_idx[row_ptr[i] + offset] = j;
        }
    }
    (row_ptr, col_idx)
}
