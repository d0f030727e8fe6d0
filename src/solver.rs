//! C7: the solver façade and refinement loop (`spec.md` §4.7).
//!
//! `Solver` is a plain value type; its phase methods borrow the caller's
//! `CsrMatrix` rather than owning it (§9 resolution), so there is no
//! lifetime parameter and no ambiguity about who frees `A`.

use crate::csr::CsrMatrix;
use crate::elimination_tree::EliminationTree;
use crate::error::SolverError;
use crate::factors::{Factors, MatrixType};
use crate::numeric::numeric_factorize;
use crate::ordering::{apply_permutation_in_place, OrderingStrategy};
use crate::permutation::Permutation;
use crate::solve::solve;
use crate::symbolic::symbolic_factorize;
use crate::transport::{row_range, Transport};
use std::time::{Duration, Instant};

/// Phase-ordering guard (`spec.md` §4.7: "Each phase must be called in
/// this order; out-of-order invocation returns InvalidInput").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Symbolic,
    Factored,
}

/// Timings and derived quantities (`spec.md` §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub analysis_time: Duration,
    pub factorization_time: Duration,
    pub solve_time: Duration,
    pub fill_in_nnz: usize,
}

/// Tunables for `Solver::symbolic` (`spec.md` §5.1 "Configuration").
#[derive(Debug, Clone, Copy)]
pub struct SymbolicConfig {
    pub ordering: OrderingStrategy,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        SymbolicConfig { ordering: OrderingStrategy::default() }
    }
}

pub struct Solver<T: Transport> {
    matrix_type: MatrixType,
    transport: T,
    phase: Phase,
    perm: Option<Permutation>,
    tree: Option<EliminationTree>,
    factors: Option<Factors>,
    counters: Counters,
}

impl<T: Transport> Solver<T> {
    pub fn init(matrix_type: MatrixType, transport: T) -> Self {
        log::debug!("solver init: matrix_type={matrix_type:?}, ranks={}", transport.size());
        Solver {
            matrix_type,
            transport,
            phase: Phase::Init,
            perm: None,
            tree: None,
            factors: None,
            counters: Counters::default(),
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Runs C2 (reordering), applies it in place to `a`, then C3 and C4
    /// (`spec.md` §4.7 "symbolic(A)"). Each rank runs the same ordering
    /// over its own full view of `a` (the distribution happens at
    /// factor/solve time, per §5).
    pub fn symbolic(&mut self, a: &mut CsrMatrix, config: SymbolicConfig) -> Result<(), SolverError> {
        if self.phase != Phase::Init {
            return Err(SolverError::InvalidInput(
                "symbolic() called out of order: expected Init phase".into(),
            ));
        }
        let start = Instant::now();

        let perm = config.ordering.order(a);
        apply_permutation_in_place(a, &perm);

        let tree = EliminationTree::build(a);
        let mut factors = symbolic_factorize(a, self.matrix_type)?;
        factors.matrix_type = self.matrix_type;

        self.counters.fill_in_nnz = factors.nnz_l() + factors.nnz_u();
        self.perm = Some(perm);
        self.tree = Some(tree);
        self.factors = Some(factors);
        self.phase = Phase::Symbolic;
        self.counters.analysis_time = start.elapsed();
        log::debug!(
            "symbolic done: fill_in_nnz={}, tree_depth={}",
            self.counters.fill_in_nnz,
            self.tree.as_ref().unwrap().depth()
        );
        Ok(())
    }

    /// Dispatches C5 by `matrix_type`, serially or distributed depending
    /// on `self.transport.size()` (`spec.md` §4.7 "factor()", §5
    /// "Distributed factor (simplified)").
    pub fn factor(&mut self, a: &CsrMatrix) -> Result<(), SolverError> {
        if self.phase != Phase::Symbolic {
            return Err(SolverError::InvalidInput(
                "factor() called out of order: expected Symbolic phase".into(),
            ));
        }
        let start = Instant::now();
        let factors = self.factors.as_mut().expect("Symbolic phase guarantees factors is set");

        // Simplified distributed factor (`spec.md` §5): each rank
        // factorizes its own global view; correctness over scalability.
        let result = numeric_factorize(a, factors);
        self.counters.fill_in_nnz = factors.nnz_l() + factors.nnz_u();
        let code = result.as_ref().map(|_| 0).unwrap_or_else(|e| SolverError::from(e.clone()).code());
        let code = self.broadcast_error_code(code)?;
        if code != 0 {
            return Err(SolverError::Numerical(format!(
                "numerical factorization failed (rank 0 reported code {code})"
            )));
        }
        result?;

        self.phase = Phase::Factored;
        self.counters.factorization_time = start.elapsed();
        log::debug!("factor done in {:?}", self.counters.factorization_time);
        Ok(())
    }

    /// Dispatches C6 serially, or via the simplified distributed pipeline
    /// (`spec.md` §5 "Distributed solve (simplified)"): every rank
    /// all-gathers its row-range of `rhs`, rank 0 solves, then scatters
    /// the solution back.
    ///
    /// `factors` lives in the C2-reordered basis `B = P·A·Pᵀ` (`self.perm`
    /// from `symbolic`), which is a separate permutation from whatever
    /// numeric pivoting `factors.perm` records internally. So `rhs` is
    /// gathered into that basis before the kernel solve, and the kernel's
    /// answer is scattered back into the caller's original basis afterward.
    pub fn solve(&mut self, nrhs: usize, rhs: &[f64]) -> Result<Vec<f64>, SolverError> {
        if self.phase != Phase::Factored {
            return Err(SolverError::InvalidInput(
                "solve() called out of order: expected Factored phase".into(),
            ));
        }
        let start = Instant::now();
        let factors = self.factors.as_ref().expect("Factored phase guarantees factors is set");
        let perm = self.perm.as_ref().expect("Factored phase guarantees perm is set");
        let n = factors.n;

        let reordered_rhs = permute_rhs_columns(perm, rhs, nrhs, n);
        let result = if self.transport.size() == 1 {
            solve(factors, nrhs, &reordered_rhs).map_err(SolverError::from)
        } else {
            self.solve_distributed(factors, nrhs, &reordered_rhs, n)
        };
        let result = result.map(|sol| unpermute_solution_columns(perm, &sol, nrhs, n));

        self.counters.solve_time = start.elapsed();
        result
    }

    fn solve_distributed(
        &self,
        factors: &Factors,
        nrhs: usize,
        rhs: &[f64],
        n: usize,
    ) -> Result<Vec<f64>, SolverError> {
        let size = self.transport.size();
        let rank = self.transport.rank();
        let counts: Vec<usize> = (0..size)
            .map(|r| {
                let (start, end) = row_range(n, size, r);
                (end - start) * nrhs
            })
            .collect();
        let (my_start, my_end) = row_range(n, size, rank);

        // Column-major rhs: gather this rank's row range across every rhs
        // column into contiguous send data, then all-gather back into the
        // full global rhs (`spec.md` §5: "all ranks all-gather their RHS").
        let mut send = Vec::with_capacity((my_end - my_start) * nrhs);
        for r in 0..nrhs {
            send.extend_from_slice(&rhs[r * n + my_start..r * n + my_end]);
        }
        let mut gathered = vec![0.0; n * nrhs];
        self.transport
            .all_gather_v(&send, &counts, &mut gathered)
            .map_err(SolverError::from)?;

        let global_rhs = unshuffle_gathered(&gathered, &counts, n, nrhs, size);

        let (solved, code) = if rank == 0 {
            match solve(factors, nrhs, &global_rhs) {
                Ok(sol) => (sol, 0),
                Err(e) => (vec![0.0; n * nrhs], SolverError::from(e).code()),
            }
        } else {
            (vec![0.0; n * nrhs], 0)
        };

        let code = self.broadcast_error_code(code)?;
        if code != 0 {
            return Err(SolverError::Numerical(format!(
                "distributed solve failed (rank 0 reported code {code})"
            )));
        }

        let mut full_sol = solved;
        self.transport.broadcast(&mut full_sol, 0).map_err(SolverError::from)?;
        Ok(full_sol)
    }

    /// Broadcasts rank 0's error code to all ranks for consistent
    /// propagation (`spec.md` §7 "the error code from rank 0 is
    /// broadcast").
    fn broadcast_error_code(&self, code: i32) -> Result<i32, SolverError> {
        if self.transport.size() == 1 {
            return Ok(code);
        }
        let mut buf = vec![code as f64];
        self.transport.broadcast(&mut buf, 0).map_err(SolverError::from)?;
        Ok(buf[0] as i32)
    }

    /// Fixed-point residual correction (`spec.md` §4.7 "refine"):
    /// `r <- b - A*x`; while `||r||_2 >= tol` and iterations remain,
    /// solve `A*delta = r` via the factors and update `x += delta`.
    /// Residual is measured against the caller's original `a` (§9 open
    /// question, decided: original basis).
    pub fn refine(
        &mut self,
        a: &CsrMatrix,
        nrhs: usize,
        rhs: &[f64],
        sol: &mut [f64],
        max_iter: usize,
        tol: f64,
    ) -> Result<(), SolverError> {
        if self.phase != Phase::Factored {
            return Err(SolverError::InvalidInput(
                "refine() called out of order: expected Factored phase".into(),
            ));
        }
        let n = a.n;
        if rhs.len() != nrhs * n || sol.len() != nrhs * n {
            return Err(SolverError::InvalidInput(
                "rhs/sol length does not match nrhs*n".into(),
            ));
        }
        let factors = self.factors.as_ref().expect("Factored phase guarantees factors is set");
        let perm = self.perm.as_ref().expect("Factored phase guarantees perm is set");

        let mut residual = vec![0.0; nrhs * n];
        compute_residual(a, rhs, sol, &mut residual, nrhs, n);

        for iter in 0..max_iter {
            let max_norm = (0..nrhs)
                .map(|r| l2_norm(&residual[r * n..r * n + n]))
                .fold(0.0_f64, f64::max);
            if max_norm < tol {
                log::debug!("refine converged after {iter} iterations (||r|| = {max_norm:e})");
                return Ok(());
            }

            // `factors` solves in the C2-reordered basis, so the residual
            // correction needs the same gather/scatter `solve()` applies.
            let reordered_residual = permute_rhs_columns(perm, &residual, nrhs, n);
            let correction = solve(factors, nrhs, &reordered_residual).map_err(SolverError::from)?;
            let correction = unpermute_solution_columns(perm, &correction, nrhs, n);
            for i in 0..sol.len() {
                sol[i] += correction[i];
            }
            compute_residual(a, rhs, sol, &mut residual, nrhs, n);
        }
        log::debug!("refine exhausted {max_iter} iterations without reaching tol={tol:e}");
        Ok(())
    }

    /// `cleanup` never releases the caller's matrix (`spec.md` §4.7, §9):
    /// consuming `self` simply drops the solver's own owned buffers.
    pub fn cleanup(self) {
        log::debug!("solver cleanup");
    }
}

fn compute_residual(a: &CsrMatrix, rhs: &[f64], sol: &[f64], residual: &mut [f64], nrhs: usize, n: usize) {
    let mut ax = vec![0.0; n];
    for r in 0..nrhs {
        a.spmv(&sol[r * n..r * n + n], &mut ax);
        for i in 0..n {
            residual[r * n + i] = rhs[r * n + i] - ax[i];
        }
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Gathers multi-column `rhs` into the C2-reordered basis: column-major
/// `out[r*n + i] = rhs[r*n + perm.perm[i]]` (`spec.md` §4.2: `perm[new] =
/// old`, so row `new` of the reordered system reads the original row
/// `perm[new]`).
fn permute_rhs_columns(perm: &Permutation, rhs: &[f64], nrhs: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; nrhs * n];
    for r in 0..nrhs {
        for (new_i, &old_i) in perm.perm.iter().enumerate() {
            out[r * n + new_i] = rhs[r * n + old_i];
        }
    }
    out
}

/// Inverse of [`permute_rhs_columns`]: scatters a reordered-basis solution
/// back into the caller's original basis, `out[r*n + perm.perm[i]] = sol[r*n
/// + i]`.
fn unpermute_solution_columns(perm: &Permutation, sol: &[f64], nrhs: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; nrhs * n];
    for r in 0..nrhs {
        for (new_i, &old_i) in perm.perm.iter().enumerate() {
            out[r * n + old_i] = sol[r * n + new_i];
        }
    }
    out
}

/// Reverses the rank-major, rhs-contiguous layout the `all_gather_v` call
/// produces back into the caller's column-major `rhs[r*n + i]` layout.
fn unshuffle_gathered(gathered: &[f64], counts: &[usize], n: usize, nrhs: usize, size: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * nrhs];
    let mut displ = 0usize;
    for rank in 0..size {
        let (start, end) = row_range(n, size, rank);
        let local_n = end - start;
        for r in 0..nrhs {
            let src = &gathered[displ + r * local_n..displ + (r + 1) * local_n];
            out[r * n + start..r * n + end].copy_from_slice(src);
        }
        displ += counts[rank];
    }
    out
}
