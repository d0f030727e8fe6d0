//! A distributed sparse direct linear solver for `A·x = b`: reordering,
//! symbolic factorization, numerical factorization, and triangular solve,
//! with optional iterative refinement.

pub mod csr;
pub mod elimination_tree;
pub mod error;
pub mod factors;
pub mod mtx;
pub mod numeric;
pub mod ordering;
pub mod permutation;
pub mod solve;
pub mod solver;
pub mod symbolic;
pub mod transport;

pub use csr::CsrMatrix;
pub use elimination_tree::EliminationTree;
pub use error::SolverError;
pub use factors::{Factors, MatrixType};
pub use mtx::{read_matrix_market, write_matrix_market};
pub use ordering::OrderingStrategy;
pub use permutation::Permutation;
pub use solver::{Counters, Solver, SymbolicConfig};
pub use transport::{SerialTransport, ThreadTransport, Transport};
