use thiserror::Error;

/// Top-level error type returned by every fallible operation in this crate.
///
/// Mirrors the four-way taxonomy from the solver's error-code contract:
/// `InvalidInput`, `Memory`, `Numerical`, `Transport`. [`SolverError::code`]
/// recovers the integer ABI those codes correspond to, for callers building
/// a C-compatible or CLI surface on top of this crate.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("memory allocation failure: {0}")]
    Memory(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Csr(#[from] CsrError),

    #[error(transparent)]
    Ordering(#[from] OrderingError),
}

impl SolverError {
    /// The integer error code from the ABI contract (success is `0`, which
    /// this type never represents — callers map `Ok(())` to `0` themselves).
    pub fn code(&self) -> i32 {
        match self {
            SolverError::InvalidInput(_) => -1,
            SolverError::Memory(_) => -2,
            SolverError::Numerical(_) => -3,
            SolverError::Transport(_) => -4,
            SolverError::Csr(_) => -1,
            SolverError::Ordering(_) => -1,
        }
    }
}

impl From<TransportError> for SolverError {
    fn from(e: TransportError) -> Self {
        SolverError::Transport(e.to_string())
    }
}

impl From<FactorError> for SolverError {
    fn from(e: FactorError) -> Self {
        match e {
            FactorError::InvalidInput(m) => SolverError::InvalidInput(m),
            FactorError::Numerical(m) => SolverError::Numerical(m),
        }
    }
}

/// Errors from [`crate::csr::CsrMatrix`] construction and invariant checks.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum CsrError {
    #[error("out of bounds column index: {index} (max: {max})")]
    OutOfBoundsIndex { index: usize, max: usize },

    #[error("invalid row pointers length: expected {expected}, got {actual}")]
    InvalidRowPointersLength { expected: usize, actual: usize },

    #[error("row pointers not monotone at row {index}: {prev} > {next}")]
    RowPointersNotMonotone { index: usize, prev: usize, next: usize },

    #[error("row_ptr[n] ({row_ptr_n}) does not match nnz ({nnz})")]
    RowPtrNnzMismatch { row_ptr_n: usize, nnz: usize },

    #[error("column/value array length mismatch: col_idx {col_idx} vs values {values}")]
    ColumnValueLengthMismatch { col_idx: usize, values: usize },

    #[error("shape mismatch: expected n={expected_n} nnz={expected_nnz}, got n={actual_n} nnz={actual_nnz}")]
    ShapeMismatch {
        expected_n: usize,
        expected_nnz: usize,
        actual_n: usize,
        actual_nnz: usize,
    },

    #[error("non-finite value {value} at row {row}")]
    NonFiniteValue { row: usize, value: f64 },
}

/// Errors from reordering (C2).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum OrderingError {
    #[error("permutation length {actual} does not match matrix order {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("permutation is not a bijection of [0, {n}): value {value} appears more than once or is out of range")]
    NotBijection { n: usize, value: usize },
}

/// Errors from numerical factorization (C5) and triangular solve (C6).
///
/// Kept separate from [`SolverError`] so kernels can be unit-tested without
/// pulling in the transport/ordering error variants; `solver.rs` converts
/// via `?` through the `From` impl above.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum FactorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Errors from the distributed transport abstraction (§5).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TransportError {
    #[error("collective participant mismatch: expected {expected} ranks, saw {actual}")]
    ParticipantMismatch { expected: usize, actual: usize },

    #[error("buffer length mismatch in collective '{op}': expected {expected}, got {actual}")]
    BufferLengthMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid root rank {root} for communicator of size {size}")]
    InvalidRoot { root: usize, size: usize },
}
