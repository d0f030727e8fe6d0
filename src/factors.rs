//! The `Factors` value type produced by C4/C5 and consumed by C6
//! (`spec.md` §3, §6). `MatrixType`'s discriminants are the ABI tags from
//! `spec.md` §6 ("part of the ABI"): `11` non-symmetric, `1` sym-posdef,
//! `-2` sym-indef.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum MatrixType {
    RealNonsymmetric = 11,
    RealSpd = 1,
    RealSymmetricIndefinite = -2,
}

impl MatrixType {
    pub fn tag(self) -> i8 {
        self as i8
    }

    pub fn from_tag(tag: i8) -> Option<Self> {
        match tag {
            11 => Some(MatrixType::RealNonsymmetric),
            1 => Some(MatrixType::RealSpd),
            -2 => Some(MatrixType::RealSymmetricIndefinite),
            _ => None,
        }
    }
}

/// Owns the sparsity patterns and numeric values of `L`/`U`/`D` plus the
/// row permutation numerical factorization refined (`spec.md` §3, §4.5).
/// `u_row_ptr`/`u_col_idx`/`u_values` are empty for the two symmetric
/// variants. `d_values[k]` stores `D⁻¹[k][k]` for a 1×1 pivot; for a 2×2
/// block at `(k, k+1)` it stores the diagonal of `Dinv`, with the
/// off-diagonal recomputed at solve time from `d_offdiag`, which the
/// factorization fills in only at the first index of a 2×2 block (see
/// `numeric::ldlt`).
#[derive(Debug, Clone)]
pub struct Factors {
    pub n: usize,
    pub matrix_type: MatrixType,
    pub l_row_ptr: Vec<usize>,
    pub l_col_idx: Vec<usize>,
    pub l_values: Vec<f64>,
    pub u_row_ptr: Vec<usize>,
    pub u_col_idx: Vec<usize>,
    pub u_values: Vec<f64>,
    pub d_values: Vec<f64>,
    pub d_offdiag: Vec<f64>,
    pub pivot_type: Vec<u8>,
    pub perm: Vec<usize>,
}

impl Factors {
    pub fn nnz_l(&self) -> usize {
        self.l_row_ptr.last().copied().unwrap_or(0)
    }

    pub fn nnz_u(&self) -> usize {
        self.u_row_ptr.last().copied().unwrap_or(0)
    }

    pub fn l_row(&self, i: usize) -> (&[usize], &[f64]) {
        (&self.l_col_idx[self.l_row_ptr[i]..self.l_row_ptr[i + 1]],
         &self.l_values[self.l_row_ptr[i]..self.l_row_ptr[i + 1]])
    }

    pub fn u_row(&self, i: usize) -> (&[usize], &[f64]) {
        (&self.u_col_idx[self.u_row_ptr[i]..self.u_row_ptr[i + 1]],
         &self.u_values[self.u_row_ptr[i]..self.u_row_ptr[i + 1]])
    }
}
