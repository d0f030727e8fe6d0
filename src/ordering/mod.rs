//! C2: fill-reducing reordering.
//!
//! Two strategies (`spec.md` §4.2), both graph-based on the adjacency of
//! `A + Aᵀ`, plus the shared `apply_permutation` operation.

mod minimum_degree;
mod nested_dissection;

pub use minimum_degree::minimum_degree;
pub use nested_dissection::nested_dissection;

use crate::csr::CsrMatrix;
use crate::permutation::Permutation;

/// Which C2 strategy `Solver::symbolic` should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingStrategy {
    #[default]
    MinimumDegree,
    NestedDissection,
}

impl OrderingStrategy {
    pub fn order(&self, a: &CsrMatrix) -> Permutation {
        match self {
            OrderingStrategy::MinimumDegree => minimum_degree(a),
            OrderingStrategy::NestedDissection => nested_dissection(a),
        }
    }
}

/// Undirected adjacency lists of `A + Aᵀ` (excluding the diagonal), shared by
/// both ordering strategies and by the elimination tree's non-symmetric
/// case.
pub(crate) fn symmetrized_adjacency(a: &CsrMatrix) -> Vec<Vec<usize>> {
    let n = a.n;
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        let (cols, _) = a.row(i);
        for &j in cols {
            if j != i {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }
    for row in &mut adj {
        row.sort_unstable();
        row.dedup();
    }
    adj
}

/// `B[i][j] = A[perm[i]][perm[j]]`, always two-sided regardless of symmetry
/// (`spec.md` §4.2, §9). Each new row's columns come out sorted ascending.
pub fn apply_permutation(a: &CsrMatrix, p: &Permutation) -> CsrMatrix {
    let n = a.n;
    debug_assert_eq!(p.len(), n);
    let mut triples = Vec::with_capacity(a.nnz());
    for new_i in 0..n {
        let old_i = p.perm[new_i];
        let (cols, vals) = a.row(old_i);
        for (&old_j, &v) in cols.iter().zip(vals.iter()) {
            let new_j = p.inv_perm[old_j];
            triples.push((new_i, new_j, v));
        }
    }
    let mut b = CsrMatrix::from_triples(n, triples).expect("permutation preserves bounds");
    b.is_symmetric = a.is_symmetric;
    b.is_upper = a.is_upper;
    b
}

/// Permutes `a` in place, leaving the caller's handle valid but now
/// referring to the permuted matrix (`spec.md` §4.2 "atomically swapped").
pub fn apply_permutation_in_place(a: &mut CsrMatrix, p: &Permutation) {
    let b = apply_permutation(a, p);
    *a = b;
}
