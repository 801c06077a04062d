mod build;
mod cache;

use anyhow::{ensure, Result};

use crate::{grid::{GridAxes, GridGeometry, GridIndex}, io::csr::CsrRows};

pub use cache::WeightCache;

/// Sparse county x grid-cell matrix of overlap fractions.
///
/// Entry (i, k) is the share of county `i`'s equal-area footprint covered by
/// the cell at `grid().get(k)`. Rows of fully covered counties sum to ~1.0;
/// an all-zero row marks a county with no grid coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: CsrRows,
    grid: GridIndex,
    row_sums: Vec<f64>,
    source_grid: Option<GridStamp>,
}

/// Fingerprint and half-width of the grid geometry a matrix was built against.
#[derive(Debug, Clone, PartialEq)]
struct GridStamp {
    fingerprint: String,
    half_width: f64,
}

impl WeightMatrix {
    /// Assemble from per-county sparse rows of (column, weight) pairs.
    pub fn from_rows(grid: GridIndex, rows: Vec<Vec<(u32, f64)>>) -> Result<Self> {
        let mut csr = CsrRows { offsets: vec![0], columns: Vec::new(), values: Vec::new() };
        for row in rows {
            for (k, w) in row {
                ensure!((k as usize) < grid.len(), "[weights] column {k} outside grid of {} cells", grid.len());
                ensure!(w.is_finite() && w >= 0.0, "[weights] invalid weight {w} at column {k}");
                csr.columns.push(k);
                csr.values.push(w);
            }
            csr.offsets.push(csr.columns.len() as u64);
        }
        Self::from_csr(grid, csr)
    }

    pub(crate) fn from_csr(grid: GridIndex, rows: CsrRows) -> Result<Self> {
        ensure!(
            rows.columns.iter().all(|&k| (k as usize) < grid.len()),
            "[weights] CSR column outside grid of {} cells", grid.len()
        );
        let row_sums = (0..rows.offsets.len().saturating_sub(1))
            .map(|i| rows.values[rows.offsets[i] as usize..rows.offsets[i + 1] as usize].iter().sum())
            .collect();
        Ok(Self { rows, grid, row_sums, source_grid: None })
    }

    /// Record the cell geometry this matrix belongs to.
    pub(crate) fn stamped(mut self, geometry: &GridGeometry) -> Self {
        self.source_grid = Some(GridStamp {
            fingerprint: geometry.fingerprint().to_owned(),
            half_width: geometry.half_width(),
        });
        self
    }

    /// Whether a source with these coordinate axes lines up with the matrix columns.
    ///
    /// Matrices built or loaded against a `GridGeometry` compare coordinates;
    /// ones assembled from bare rows can only compare shape.
    pub fn matches_axes(&self, axes: &GridAxes) -> bool {
        axes.shape() == self.grid.shape()
            && self.source_grid.as_ref()
                .is_none_or(|s| GridGeometry::fingerprint_of(axes, s.half_width) == s.fingerprint)
    }

    #[inline] pub(crate) fn csr(&self) -> &CsrRows { &self.rows }

    /// Number of county rows.
    #[inline] pub fn num_counties(&self) -> usize { self.row_sums.len() }

    /// Number of grid-cell columns.
    #[inline] pub fn num_cells(&self) -> usize { self.grid.len() }

    /// Number of stored non-zero weights.
    #[inline] pub fn nnz(&self) -> usize { self.rows.values.len() }

    /// The explicit column order of this matrix.
    #[inline] pub fn grid(&self) -> &GridIndex { &self.grid }

    /// Non-zero (column, weight) pairs of one county row.
    #[inline]
    pub fn row(&self, county: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.rows.offsets[county] as usize..self.rows.offsets[county + 1] as usize;
        range.map(move |v| (self.rows.columns[v] as usize, self.rows.values[v]))
    }

    /// Sum of one county's weights (~1.0 when fully inside the grid).
    #[inline] pub fn row_sum(&self, county: usize) -> f64 { self.row_sums[county] }

    /// False for counties whose weights sum to zero; their aggregates are NaN.
    #[inline] pub fn has_coverage(&self, county: usize) -> bool { self.row_sums[county] > 0.0 }

    /// Number of counties without any grid coverage.
    pub fn uncovered_count(&self) -> usize {
        self.row_sums.iter().filter(|&&s| s <= 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::NLDAS_HALF_WIDTH;

    use super::*;

    #[test]
    fn rows_and_sums_follow_insertion() {
        let grid = GridIndex::row_major(2, 2).unwrap();
        let matrix = WeightMatrix::from_rows(grid, vec![
            vec![(0, 0.25), (3, 0.75)],
            vec![],
            vec![(1, 1.0)],
        ]).unwrap();

        assert_eq!(matrix.num_counties(), 3);
        assert_eq!(matrix.num_cells(), 4);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.row(0).collect::<Vec<_>>(), vec![(0, 0.25), (3, 0.75)]);
        assert!(matrix.row(1).next().is_none());
        assert_eq!(matrix.row_sum(0), 1.0);
        assert!(!matrix.has_coverage(1));
        assert_eq!(matrix.uncovered_count(), 1);
    }

    #[test]
    fn columns_outside_grid_are_rejected() {
        let grid = GridIndex::row_major(1, 2).unwrap();
        assert!(WeightMatrix::from_rows(grid.clone(), vec![vec![(2, 0.5)]]).is_err());
        assert!(WeightMatrix::from_rows(grid, vec![vec![(0, f64::NAN)]]).is_err());
    }

    #[test]
    fn stamped_matrix_rejects_shifted_axes_of_same_shape() {
        let axes = GridAxes::new(vec![40.0, 40.125], vec![-100.0, -99.875]).unwrap();
        let shifted = GridAxes::new(vec![40.0, 40.125], vec![-90.0, -89.875]).unwrap();
        let geometry = GridGeometry::build(axes.clone(), NLDAS_HALF_WIDTH).unwrap();

        let bare = WeightMatrix::from_rows(geometry.index().clone(), vec![vec![(0, 1.0)]]).unwrap();
        assert!(bare.matches_axes(&shifted));

        let stamped = bare.stamped(&geometry);
        assert!(stamped.matches_axes(&axes));
        assert!(!stamped.matches_axes(&shifted));
        assert!(!stamped.matches_axes(&GridAxes::new(vec![40.0], vec![-100.0, -99.875]).unwrap()));
    }
}
