use anyhow::{ensure, Result};
use ndarray::ArrayView2;

/// Position of one cell in the source grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub row: u32,
    pub col: u32,
}

/// The column order of a weight matrix: column `k` is `cells[k]` of a grid
/// with `rows x cols` points. Stored alongside the matrix so that fields are
/// always flattened by lookup, never by iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridIndex {
    rows: usize,
    cols: usize,
    cells: Vec<CellIndex>,
}

impl GridIndex {
    pub fn new(rows: usize, cols: usize, cells: Vec<CellIndex>) -> Result<Self> {
        ensure!(rows <= u32::MAX as usize && cols <= u32::MAX as usize, "[grid] grid too large: {rows} x {cols}");
        if let Some(bad) = cells.iter().find(|c| c.row as usize >= rows || c.col as usize >= cols) {
            anyhow::bail!("[grid] cell ({}, {}) outside {rows} x {cols} grid", bad.row, bad.col);
        }
        Ok(Self { rows, cols, cells })
    }

    /// Every cell, latitude-major.
    pub fn row_major(rows: usize, cols: usize) -> Result<Self> {
        let cells = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| CellIndex { row: i as u32, col: j as u32 }))
            .collect();
        Self::new(rows, cols, cells)
    }

    /// (rows, cols) of the grid this index addresses.
    #[inline] pub fn shape(&self) -> (usize, usize) { (self.rows, self.cols) }

    #[inline] pub fn len(&self) -> usize { self.cells.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    #[inline] pub fn cells(&self) -> &[CellIndex] { &self.cells }

    #[inline] pub fn get(&self, k: usize) -> Option<CellIndex> { self.cells.get(k).copied() }

    /// Gather a 2-D field into column order.
    pub fn flatten(&self, field: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        ensure!(
            field.dim() == (self.rows, self.cols),
            "[grid] field shape {:?} does not match grid shape {:?}", field.dim(), (self.rows, self.cols)
        );
        Ok(self.cells.iter().map(|c| field[[c.row as usize, c.col as usize]]).collect())
    }
}
