//! Compressed Sparse Row (CSR) binary format for county x cell weights.

use std::io::{Cursor, Read, Write};

use anyhow::{ensure, Context, Result};

use crate::grid::{CellIndex, GridIndex};

/// Sparse rows in CSR layout: row `i` spans `offsets[i]..offsets[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CsrRows {
    pub offsets: Vec<u64>,
    pub columns: Vec<u32>,
    pub values: Vec<f64>,
}

/// Write weighted rows to CSR binary bytes.
pub(crate) fn write_weighted_csr_bytes(rows: &CsrRows) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_weighted_csr(&mut out, rows)?;
    Ok(out)
}

/// Read weighted rows from CSR binary bytes.
pub(crate) fn read_weighted_csr_bytes(bytes: &[u8]) -> Result<CsrRows> {
    read_weighted_csr(&mut Cursor::new(bytes))
}

/// Write a grid index to binary bytes.
pub(crate) fn write_grid_index_bytes(index: &GridIndex) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_grid_index(&mut out, index)?;
    Ok(out)
}

/// Read a grid index from binary bytes.
pub(crate) fn read_grid_index_bytes(bytes: &[u8]) -> Result<GridIndex> {
    read_grid_index(&mut Cursor::new(bytes))
}

fn write_weighted_csr<W: Write>(writer: &mut W, rows: &CsrRows) -> Result<()> {
    ensure!(!rows.offsets.is_empty(), "[io::csr] offsets must hold at least one entry");
    ensure!(
        rows.columns.len() == rows.values.len(),
        "[io::csr] columns len ({}) != values len ({})", rows.columns.len(), rows.values.len()
    );
    let n = rows.offsets.len() - 1;
    let nnz = rows.columns.len() as u64;
    ensure!(rows.offsets[n] == nnz, "[io::csr] last offset ({}) != nnz ({})", rows.offsets[n], nnz);

    // Header
    writer.write_all(b"CSRW")
        .context("[io::csr] Failed to write magic bytes")?;
    writer.write_all(&(n as u64).to_le_bytes())
        .context("[io::csr] Failed to write row count")?;
    writer.write_all(&nnz.to_le_bytes())
        .context("[io::csr] Failed to write nnz")?;

    // indptr
    for &o in &rows.offsets {
        writer.write_all(&o.to_le_bytes())
            .context("[io::csr] Failed to write indptr")?;
    }

    // indices
    for &j in &rows.columns {
        writer.write_all(&j.to_le_bytes())
            .context("[io::csr] Failed to write indices")?;
    }

    // data
    for &val in &rows.values {
        writer.write_all(&val.to_le_bytes())
            .context("[io::csr] Failed to write weights")?;
    }

    Ok(())
}

fn read_weighted_csr<R: Read>(reader: &mut R) -> Result<CsrRows> {
    // Header
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)
        .context("[io::csr] Failed to read magic bytes")?;
    ensure!(&magic == b"CSRW", "[io::csr] Invalid CSR magic: expected 'CSRW'");

    let n = read_u64(reader).context("[io::csr] Failed to read row count")? as usize;
    let nnz = read_u64(reader).context("[io::csr] Failed to read nnz")? as usize;

    // indptr
    let offsets = (0..=n)
        .map(|_| read_u64(reader).context("[io::csr] Failed to read indptr"))
        .collect::<Result<Vec<_>>>()?;
    ensure!(offsets[n] as usize == nnz, "[io::csr] nnz mismatch: header {} vs indptr {}", nnz, offsets[n]);
    ensure!(offsets.windows(2).all(|w| w[0] <= w[1]), "[io::csr] indptr is not monotone");

    // indices
    let columns = (0..nnz)
        .map(|_| read_u32(reader).context("[io::csr] Failed to read indices"))
        .collect::<Result<Vec<_>>>()?;

    // data
    let values = (0..nnz)
        .map(|_| read_u64(reader).map(f64::from_bits).context("[io::csr] Failed to read weights"))
        .collect::<Result<Vec<_>>>()?;

    Ok(CsrRows { offsets, columns, values })
}

fn write_grid_index<W: Write>(writer: &mut W, index: &GridIndex) -> Result<()> {
    let (rows, cols) = index.shape();
    writer.write_all(b"GRDX")
        .context("[io::csr] Failed to write grid magic bytes")?;
    for v in [rows as u64, cols as u64, index.len() as u64] {
        writer.write_all(&v.to_le_bytes())
            .context("[io::csr] Failed to write grid header")?;
    }
    for cell in index.cells() {
        writer.write_all(&cell.row.to_le_bytes())
            .and_then(|_| writer.write_all(&cell.col.to_le_bytes()))
            .context("[io::csr] Failed to write grid cells")?;
    }
    Ok(())
}

fn read_grid_index<R: Read>(reader: &mut R) -> Result<GridIndex> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)
        .context("[io::csr] Failed to read grid magic bytes")?;
    ensure!(&magic == b"GRDX", "[io::csr] Invalid grid index magic: expected 'GRDX'");

    let rows = read_u64(reader).context("[io::csr] Failed to read grid rows")? as usize;
    let cols = read_u64(reader).context("[io::csr] Failed to read grid cols")? as usize;
    let len = read_u64(reader).context("[io::csr] Failed to read grid cell count")? as usize;

    let cells = (0..len)
        .map(|_| Ok::<_, anyhow::Error>(CellIndex {
            row: read_u32(reader).context("[io::csr] Failed to read grid cells")?,
            col: read_u32(reader).context("[io::csr] Failed to read grid cells")?,
        }))
        .collect::<Result<Vec<_>>>()?;

    GridIndex::new(rows, cols, cells)
}

#[inline]
fn read_u64<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut b8 = [0u8; 8];
    reader.read_exact(&mut b8)?;
    Ok(u64::from_le_bytes(b8))
}

#[inline]
fn read_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut b4 = [0u8; 4];
    reader.read_exact(&mut b4)?;
    Ok(u32::from_le_bytes(b4))
}
