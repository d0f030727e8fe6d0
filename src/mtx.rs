//! Matrix Market read/write (`spec.md` §6). Text format: header lines
//! begin with `%`; the token `symmetric` or `Hermitian` anywhere in a
//! header line sets `is_symmetric`. The first non-comment line holds
//! `nrows ncols nnz`; only square matrices are accepted. Subsequent lines
//! are `row col value`, 1-based. A symmetric file expands each off-diagonal
//! entry into both CSR triangles.

use crate::csr::CsrMatrix;
use crate::error::SolverError;
use std::io::{BufRead, Write};

pub fn read_matrix_market<R: BufRead>(reader: R) -> Result<CsrMatrix, SolverError> {
    let mut lines = reader.lines();
    let mut is_symmetric = false;
    let mut size_line: Option<String> = None;

    for line in &mut lines {
        let line = line.map_err(|e| SolverError::InvalidInput(format!("read error: {e}")))?;
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        if t.starts_with('%') {
            let lower = t.to_ascii_lowercase();
            if lower.contains("symmetric") || lower.contains("hermitian") {
                is_symmetric = true;
            }
            continue;
        }
        size_line = Some(t.to_string());
        break;
    }

    let size_line = size_line.ok_or_else(|| {
        SolverError::InvalidInput("Matrix Market file has no size line".into())
    })?;
    let parts: Vec<&str> = size_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(SolverError::InvalidInput(format!(
            "expected 'nrows ncols nnz', got: {size_line}"
        )));
    }
    let nrows: usize = parts[0]
        .parse()
        .map_err(|_| SolverError::InvalidInput(format!("bad nrows: {}", parts[0])))?;
    let ncols: usize = parts[1]
        .parse()
        .map_err(|_| SolverError::InvalidInput(format!("bad ncols: {}", parts[1])))?;
    let nnz: usize = parts[2]
        .parse()
        .map_err(|_| SolverError::InvalidInput(format!("bad nnz: {}", parts[2])))?;

    if nrows != ncols {
        return Err(SolverError::InvalidInput(format!(
            "only square matrices are supported: {nrows} != {ncols}"
        )));
    }
    let n = nrows;

    let mut triples = Vec::with_capacity(if is_symmetric { 2 * nnz } else { nnz });
    let mut read_entries = 0usize;
    for line in lines {
        let line = line.map_err(|e| SolverError::InvalidInput(format!("read error: {e}")))?;
        let t = line.trim();
        if t.is_empty() || t.starts_with('%') {
            continue;
        }
        let parts: Vec<&str> = t.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(SolverError::InvalidInput(format!(
                "expected 'row col value', got: {t}"
            )));
        }
        let row_1: usize = parts[0]
            .parse()
            .map_err(|_| SolverError::InvalidInput(format!("bad row index: {}", parts[0])))?;
        let col_1: usize = parts[1]
            .parse()
            .map_err(|_| SolverError::InvalidInput(format!("bad col index: {}", parts[1])))?;
        if row_1 == 0 || col_1 == 0 {
            return Err(SolverError::InvalidInput(
                "Matrix Market indices are 1-based; found 0".into(),
            ));
        }
        let value: f64 = parts[2]
            .parse()
            .map_err(|_| SolverError::InvalidInput(format!("bad value: {}", parts[2])))?;
        let row = row_1 - 1;
        let col = col_1 - 1;

        triples.push((row, col, value));
        if is_symmetric && row != col {
            triples.push((col, row, value));
        }
        read_entries += 1;
    }
    if read_entries != nnz {
        return Err(SolverError::InvalidInput(format!(
            "declared nnz={nnz} but read {read_entries} entries"
        )));
    }

    let mut a = CsrMatrix::from_triples(n, triples)?;
    a.is_symmetric = is_symmetric;
    Ok(a)
}

/// Always emits `general` form regardless of `a.is_symmetric` (`spec.md`
/// §6: "writer always emits general form").
pub fn write_matrix_market<W: Write>(mut writer: W, a: &CsrMatrix) -> Result<(), SolverError> {
    let nnz = a.nnz();
    writeln!(writer, "%%MatrixMarket matrix coordinate real general")
        .map_err(|e| SolverError::InvalidInput(format!("write error: {e}")))?;
    writeln!(writer, "{} {} {}", a.n, a.n, nnz)
        .map_err(|e| SolverError::InvalidInput(format!("write error: {e}")))?;
    for i in 0..a.n {
        let (cols, vals) = a.row(i);
        for (&j, &v) in cols.iter().zip(vals.iter()) {
            writeln!(writer, "{} {} {:.17e}", i + 1, j + 1, v)
                .map_err(|e| SolverError::InvalidInput(format!("write error: {e}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_general_coordinate_file() {
        let mtx = "%%MatrixMarket matrix coordinate real general\n\
                   3 3 4\n\
                   1 1 2.0\n\
                   1 2 3.0\n\
                   2 2 4.0\n\
                   3 3 5.0\n";
        let a = read_matrix_market(Cursor::new(mtx)).unwrap();
        assert_eq!(a.n, 3);
        assert_eq!(a.nnz(), 4);
        assert_eq!(a.get(0, 1), 3.0);
    }

    #[test]
    fn symmetric_header_expands_both_triangles() {
        let mtx = "%%MatrixMarket matrix coordinate real symmetric\n\
                   3 3 2\n\
                   2 1 7.0\n\
                   3 3 1.0\n";
        let a = read_matrix_market(Cursor::new(mtx)).unwrap();
        assert!(a.is_symmetric);
        assert_eq!(a.get(1, 0), 7.0);
        assert_eq!(a.get(0, 1), 7.0);
        assert_eq!(a.nnz(), 3);
    }

    #[test]
    fn rejects_non_square_dimensions() {
        let mtx = "%%MatrixMarket matrix coordinate real general\n2 3 0\n";
        let err = read_matrix_market(Cursor::new(mtx)).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
    }

    #[test]
    fn round_trip_preserves_dimension_nnz_and_values() {
        let a = CsrMatrix::from_triples(
            3,
            vec![(0, 0, 1.5), (0, 2, -2.25), (1, 1, 3.0), (2, 0, 4.75)],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_matrix_market(&mut buf, &a).unwrap();
        let roundtripped = read_matrix_market(Cursor::new(buf)).unwrap();

        assert_eq!(roundtripped.n, a.n);
        assert_eq!(roundtripped.nnz(), a.nnz());
        for i in 0..a.n {
            for j in 0..a.n {
                assert_eq!(roundtripped.get(i, j), a.get(i, j));
            }
        }
    }
}
