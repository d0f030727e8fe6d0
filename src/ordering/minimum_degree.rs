//! Simplified Minimum Degree ordering (`spec.md` §4.2).
//!
//! This is the "simplified heuristic" the spec explicitly calls out: it does
//! not add fill-in edges to the quotient graph on elimination, matching
//! `original_source/src/ordering/minimum_degree.c`'s behavior exactly (a
//! true AMD-style quotient-graph update, as sketched in
//! `idobenamram-spicy`'s `amd.rs`, is noted there as an optional
//! enhancement and is out of scope for this simplified pass).

use super::symmetrized_adjacency;
use crate::csr::CsrMatrix;
use crate::permutation::Permutation;

pub fn minimum_degree(a: &CsrMatrix) -> Permutation {
    let n = a.n;
    let adj = symmetrized_adjacency(a);
    let mut degree: Vec<i64> = adj.iter().map(|row| row.len() as i64).collect();
    let mut eliminated = vec![false; n];
    let mut perm = Vec::with_capacity(n);

    for _ in 0..n {
        // Smallest degree among uneliminated vertices, ties broken by
        // lowest index (spec.md §4.2 step 1).
        let mut min_node = None;
        let mut min_degree = i64::MAX;
        for v in 0..n {
            if !eliminated[v] && degree[v] < min_degree {
                min_degree = degree[v];
                min_node = Some(v);
            }
        }
        let Some(v) = min_node else { break };
        perm.push(v);
        eliminated[v] = true;
        for &nb in &adj[v] {
            if !eliminated[nb] {
                degree[nb] -= 1;
                if degree[nb] < 0 {
                    degree[nb] = 0;
                }
            }
        }
    }

    Permutation::from_perm(perm).expect("greedy elimination order is a permutation of [0,n)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_valid_permutation_for_tridiagonal() {
        let n = 20;
        let mut triples = Vec::new();
        for i in 0..n {
            triples.push((i, i, 2.0));
            if i > 0 {
                triples.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                triples.push((i, i + 1, -1.0));
            }
        }
        let a = CsrMatrix::from_triples(n, triples).unwrap();
        let p = minimum_degree(&a);
        p.check_invariants().unwrap();
        let mut sorted = p.perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn isolated_vertex_has_zero_degree_and_is_ordered_first_or_last() {
        // Vertex 0 has no edges at all.
        let a = CsrMatrix::from_triples(
            4,
            vec![(0, 0, 1.0), (1, 1, 1.0), (1, 2, 1.0), (2, 1, 1.0), (2, 2, 1.0), (3, 3, 1.0)],
        )
        .unwrap();
        let p = minimum_degree(&a);
        p.check_invariants().unwrap();
    }

    #[test]
    fn handles_disconnected_graph() {
        let a = CsrMatrix::from_triples(
            6,
            vec![
                (0, 1, 1.0),
                (1, 0, 1.0),
                (2, 3, 1.0),
                (3, 2, 1.0),
                (4, 4, 1.0),
                (5, 5, 1.0),
            ],
        )
        .unwrap();
        let p = minimum_degree(&a);
        p.check_invariants().unwrap();
    }
}
