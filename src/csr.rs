//! C1: Compressed Sparse Row matrix container.
//!
//! Mirrors the classical CSR triple `(row_ptr, col_idx, values)` plus the
//! `is_symmetric`/`is_upper` flags from the data model (`spec.md` §3). The
//! matrix owns its three arrays outright; mutation happens through `&mut
//! self` methods rather than a caller handing ownership across an FFI
//! boundary (see `DESIGN.md` / `SPEC_FULL.md` §9).

use crate::error::CsrError;

/// A square sparse matrix of order `n` stored in compressed sparse row form.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pub n: usize,
    /// Length `n + 1`, monotone non-decreasing, `row_ptr[0] == 0`.
    pub row_ptr: Vec<usize>,
    /// Length `nnz`; within a row, sorted ascending after any
    /// `apply_permutation`.
    pub col_idx: Vec<usize>,
    /// Length `nnz`, parallel to `col_idx`.
    pub values: Vec<f64>,
    pub is_symmetric: bool,
    pub is_upper: bool,
}

/// Summary statistics for [`CsrMatrix::info`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixInfo {
    pub n: usize,
    pub nnz: usize,
    pub density: f64,
    pub avg_nnz_per_row: f64,
    pub is_symmetric: bool,
}

impl CsrMatrix {
    /// Create an all-zero CSR matrix of order `n` with `nnz` reserved
    /// nonzero slots (`row_ptr` is zeroed, `col_idx`/`values` are zero
    /// filled — callers that build the matrix incrementally should prefer
    /// [`CsrMatrix::from_triples`]).
    pub fn create(n: usize, nnz: usize) -> Result<Self, CsrError> {
        Ok(CsrMatrix {
            n,
            row_ptr: vec![0; n + 1],
            col_idx: vec![0; nnz],
            values: vec![0.0; nnz],
            is_symmetric: false,
            is_upper: false,
        })
    }

    /// Build a CSR matrix from row-major `(row, col, value)` triples,
    /// summing duplicate entries and sorting each row's columns ascending.
    pub fn from_triples(
        n: usize,
        mut triples: Vec<(usize, usize, f64)>,
    ) -> Result<Self, CsrError> {
        for &(r, c, _) in &triples {
            if r >= n {
                return Err(CsrError::OutOfBoundsIndex { index: r, max: n });
            }
            if c >= n {
                return Err(CsrError::OutOfBoundsIndex { index: c, max: n });
            }
        }
        triples.sort_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; n + 1];
        let mut col_idx = Vec::with_capacity(triples.len());
        let mut values = Vec::with_capacity(triples.len());

        let mut i = 0usize;
        while i < triples.len() {
            let (r, c, mut v) = triples[i];
            let mut j = i + 1;
            while j < triples.len() && triples[j].0 == r && triples[j].1 == c {
                v += triples[j].2;
                j += 1;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            i = j;
        }
        for r in 0..n {
            row_ptr[r + 1] += row_ptr[r];
        }
        // row_ptr currently holds per-row counts at [r+1]; the loop above
        // already turned it into a prefix sum, but the push order above
        // walked triples sorted by row, so col_idx/values are already in
        // row-major order matching row_ptr.
        Ok(CsrMatrix {
            n,
            row_ptr,
            col_idx,
            values,
            is_symmetric: false,
            is_upper: false,
        })
    }

    pub fn nnz(&self) -> usize {
        *self.row_ptr.last().unwrap_or(&0)
    }

    /// Row `i`'s `(columns, values)` slice pair.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (s, e) = (self.row_ptr[i], self.row_ptr[i + 1]);
        (&self.col_idx[s..e], &self.values[s..e])
    }

    /// `A[i][j]`, or `0.0` if the pattern doesn't store that entry.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(pos) => vals[pos],
            Err(_) => 0.0,
        }
    }

    /// Checks the structural invariants from `spec.md` §8.1: `row_ptr` is
    /// monotone, `row_ptr[n] == nnz`, column indices are in range.
    pub fn check_invariants(&self) -> Result<(), CsrError> {
        if self.row_ptr.len() != self.n + 1 {
            return Err(CsrError::InvalidRowPointersLength {
                expected: self.n + 1,
                actual: self.row_ptr.len(),
            });
        }
        for i in 0..self.n {
            if self.row_ptr[i] > self.row_ptr[i + 1] {
                return Err(CsrError::RowPointersNotMonotone {
                    index: i,
                    prev: self.row_ptr[i],
                    next: self.row_ptr[i + 1],
                });
            }
        }
        let nnz = self.col_idx.len();
        if self.row_ptr[self.n] != nnz {
            return Err(CsrError::RowPtrNnzMismatch {
                row_ptr_n: self.row_ptr[self.n],
                nnz,
            });
        }
        if self.values.len() != self.col_idx.len() {
            return Err(CsrError::ColumnValueLengthMismatch {
                col_idx: self.col_idx.len(),
                values: self.values.len(),
            });
        }
        for &c in &self.col_idx {
            if c >= self.n {
                return Err(CsrError::OutOfBoundsIndex { index: c, max: self.n });
            }
        }
        for i in 0..self.n {
            let (_, vals) = self.row(i);
            for &v in vals {
                if !v.is_finite() {
                    return Err(CsrError::NonFiniteValue { row: i, value: v });
                }
            }
        }
        Ok(())
    }

    /// `dst := src` with a shape check (`spec.md` §4.1 `pard_csr_copy`).
    pub fn copy_from(&mut self, src: &CsrMatrix) -> Result<(), CsrError> {
        if self.n != src.n || self.nnz() != src.nnz() {
            return Err(CsrError::ShapeMismatch {
                expected_n: self.n,
                expected_nnz: self.nnz(),
                actual_n: src.n,
                actual_nnz: src.nnz(),
            });
        }
        self.row_ptr.copy_from_slice(&src.row_ptr);
        self.col_idx.copy_from_slice(&src.col_idx);
        self.values.copy_from_slice(&src.values);
        self.is_symmetric = src.is_symmetric;
        self.is_upper = src.is_upper;
        Ok(())
    }

    /// Transpose via counting sort: one pass to count per-column occupancy,
    /// a prefix sum, and a second pass to scatter — stable within each
    /// destination row by ascending source row index (`spec.md` §4.1).
    pub fn transpose(&self) -> CsrMatrix {
        let n = self.n;
        let nnz = self.nnz();
        let mut counts = vec![0usize; n];
        for &c in &self.col_idx {
            counts[c] += 1;
        }
        let mut row_ptr = vec![0usize; n + 1];
        for i in 0..n {
            row_ptr[i + 1] = row_ptr[i] + counts[i];
        }
        let mut col_idx = vec![0usize; nnz];
        let mut values = vec![0.0; nnz];
        let mut cursor = row_ptr.clone();
        for i in 0..n {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals.iter()) {
                let pos = cursor[c];
                col_idx[pos] = i;
                values[pos] = v;
                cursor[c] += 1;
            }
        }
        CsrMatrix {
            n,
            row_ptr,
            col_idx,
            values,
            is_symmetric: self.is_symmetric,
            is_upper: !self.is_upper,
        }
    }

    /// `C = A * B`, two-pass sparse GEMM via a dense scratch row; entries
    /// with `|value| < 1e-15` are dropped. This is a utility for tests and
    /// for C7's refinement scaffolding — residual computation must use
    /// [`CsrMatrix::spmv`] instead, since it must keep every entry.
    pub fn multiply(a: &CsrMatrix, b: &CsrMatrix) -> Result<CsrMatrix, CsrError> {
        if a.n != b.n {
            return Err(CsrError::ShapeMismatch {
                expected_n: a.n,
                expected_nnz: a.nnz(),
                actual_n: b.n,
                actual_nnz: b.nnz(),
            });
        }
        const DROP_TOL: f64 = 1e-15;
        let n = a.n;
        let mut scratch = vec![0.0f64; n];
        let mut touched = Vec::with_capacity(n);
        let mut row_ptr = vec![0usize; n + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();

        for i in 0..n {
            touched.clear();
            let (a_cols, a_vals) = a.row(i);
            for (&k, &aik) in a_cols.iter().zip(a_vals.iter()) {
                let (b_cols, b_vals) = b.row(k);
                for (&j, &bkj) in b_cols.iter().zip(b_vals.iter()) {
                    if scratch[j] == 0.0 {
                        touched.push(j);
                    }
                    scratch[j] += aik * bkj;
                }
            }
            touched.sort_unstable();
            for &j in &touched {
                if scratch[j].abs() > DROP_TOL {
                    col_idx.push(j);
                    values.push(scratch[j]);
                }
                scratch[j] = 0.0;
            }
            row_ptr[i + 1] = col_idx.len();
        }

        Ok(CsrMatrix {
            n,
            row_ptr,
            col_idx,
            values,
            is_symmetric: false,
            is_upper: false,
        })
    }

    /// Exact sparse matrix-vector product `y = A*x`, keeping every stored
    /// entry regardless of magnitude — used by residual computation
    /// (`spec.md` §4.1, §4.7).
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n);
        debug_assert_eq!(y.len(), self.n);
        for i in 0..self.n {
            let (cols, vals) = self.row(i);
            let mut sum = 0.0;
            for (&j, &a) in cols.iter().zip(vals.iter()) {
                sum += a * x[j];
            }
            y[i] = sum;
        }
    }

    /// Dimension/nnz/density summary, the data behind `pard_matrix_print_info`
    /// (`original_source/src/core/matrix_utils.c`) minus the printing.
    pub fn info(&self) -> MatrixInfo {
        let nnz = self.nnz();
        let n = self.n;
        MatrixInfo {
            n,
            nnz,
            density: if n == 0 { 0.0 } else { 100.0 * nnz as f64 / (n * n) as f64 },
            avg_nnz_per_row: if n == 0 { 0.0 } else { nnz as f64 / n as f64 },
            is_symmetric: self.is_symmetric,
        }
    }

    /// Checks `A[i][j] == A[j][i]` within `tol` for every stored entry.
    /// Returns `false` (not `Err`) for a structurally asymmetric pattern,
    /// matching `pard_matrix_verify_symmetric`'s boolean contract.
    pub fn verify_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.n {
            let (cols, vals) = self.row(i);
            for (&j, &v_ij) in cols.iter().zip(vals.iter()) {
                let v_ji = self.get(j, i);
                if (v_ij - v_ji).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}
