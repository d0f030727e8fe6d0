//! C3: the elimination tree (`spec.md` §4.3).
//!
//! `parent[i]` is the smallest `j > i` with a nonzero in row `i`; for
//! non-symmetric `A` the tree is built on the pattern of `A + Aᵀ`
//! (`ordering::symmetrized_adjacency`). `-1` is encoded as `isize` per
//! `original_source/src/symbolic/elimination_tree.c`'s sentinel convention.

use crate::csr::CsrMatrix;
use crate::ordering::symmetrized_adjacency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EliminationTree {
    pub parent: Vec<isize>,
    pub first_child: Vec<isize>,
    pub next_sibling: Vec<isize>,
}

impl EliminationTree {
    /// Builds the tree on the permuted matrix `a` (`spec.md` §4.3: for
    /// non-symmetric `A`, on the pattern of `A + Aᵀ`).
    pub fn build(a: &CsrMatrix) -> Self {
        let n = a.n;
        let mut parent = vec![-1isize; n];
        let mut first_child = vec![-1isize; n];
        let mut next_sibling = vec![-1isize; n];

        let rows: Vec<Vec<usize>> = if a.is_symmetric {
            (0..n).map(|i| a.row(i).0.to_vec()).collect()
        } else {
            symmetrized_adjacency(a)
        };

        for i in 0..n {
            let first_nz_col = rows[i]
                .iter()
                .copied()
                .filter(|&col| col > i)
                .min();
            if let Some(p) = first_nz_col {
                parent[i] = p as isize;
                if first_child[p] == -1 {
                    first_child[p] = i as isize;
                } else {
                    let mut sibling = first_child[p];
                    while next_sibling[sibling as usize] != -1 {
                        sibling = next_sibling[sibling as usize];
                    }
                    next_sibling[sibling as usize] = i as isize;
                }
            }
        }

        EliminationTree { parent, first_child, next_sibling }
    }

    /// Longest root-to-leaf path length, used as a parallel-scheduling
    /// heuristic (`spec.md` §4.3).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        for i in 0..self.parent.len() {
            let mut depth = 0usize;
            let mut node = i as isize;
            while node != -1 && self.parent[node as usize] != -1 {
                depth += 1;
                node = self.parent[node as usize];
            }
            max_depth = max_depth.max(depth);
        }
        max_depth
    }

    /// `parent[i] > i` for every non-root `i` (`spec.md` §3 invariant).
    pub fn check_invariants(&self) -> bool {
        self.parent
            .iter()
            .enumerate()
            .all(|(i, &p)| p == -1 || p as usize > i)
    }
}
