use anyhow::Result;
use geo::{Area, BooleanOps, MultiPolygon};
use log::{info, warn};
use rstar::RTree;

use crate::{
    boundary::{Counties, County},
    geom::{BoundingBox, EqualAreaProjection, GeographicCrs},
    grid::GridGeometry,
};

use super::WeightMatrix;

impl WeightMatrix {
    /// Compute the overlap fraction of every (county, cell) pair.
    ///
    /// Grid cells are projected from WGS84 lon/lat into the same equal-area
    /// plane as the counties; each county's intersection area with a cell is
    /// divided by the county's own area. Only cells whose bounding box meets
    /// the county's are intersected. Counties with empty geometry get an
    /// empty row.
    pub fn build(counties: &Counties, grid: &GridGeometry) -> Result<Self> {
        info!("[weights] building {} x {} weight matrix", counties.len(), grid.len());

        let projection = EqualAreaProjection::from_geographic(GeographicCrs::Wgs84)?;
        let cells = grid.cells().iter()
            .map(|cell| projection.project(&MultiPolygon(vec![cell.polygon().clone()])))
            .collect::<Result<Vec<_>>>()?;

        let rtree = RTree::bulk_load(
            cells.iter().enumerate()
                .filter_map(|(k, shape)| BoundingBox::of(k, shape))
                .collect()
        );

        let mut rows = Vec::with_capacity(counties.len());
        for (i, county) in counties.iter().enumerate() {
            if i % 50 == 0 {
                info!("[weights] [{:4}/{}] county {}", i + 1, counties.len(), county.geo_id());
            }
            rows.push(county_row(county, &cells, &rtree));
        }

        let matrix = Self::from_rows(grid.index().clone(), rows)?.stamped(grid);
        info!("[weights] shape {} x {}, {} non-zero weights", matrix.num_counties(), matrix.num_cells(), matrix.nnz());
        if matrix.uncovered_count() > 0 {
            warn!("[weights] {} counties have no grid coverage and will aggregate to NaN", matrix.uncovered_count());
        }
        Ok(matrix)
    }
}

/// Sorted (cell, fraction) pairs for one county.
fn county_row(county: &County, cells: &[MultiPolygon<f64>], rtree: &RTree<BoundingBox>) -> Vec<(u32, f64)> {
    if county.is_empty() { return Vec::new() }
    let Some(bbox) = BoundingBox::of(0, county.projected()) else { return Vec::new() };

    let mut row = rtree.locate_in_envelope_intersecting(&bbox.search_envelope())
        .filter_map(|candidate| {
            let k = candidate.idx();
            let overlap = county.projected().intersection(&cells[k]).unsigned_area();
            (overlap > 0.0).then(|| (k as u32, (overlap / county.area_m2()).min(1.0)))
        })
        .collect::<Vec<_>>();

    row.sort_unstable_by_key(|&(k, _)| k);
    row
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::grid::{GridAxes, NLDAS_HALF_WIDTH};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]])
    }

    fn grid_4x4() -> GridGeometry {
        let lat = (0..4).map(|i| 38.0625 + 0.125 * i as f64).collect();
        let lon = (0..4).map(|j| -97.9375 + 0.125 * j as f64).collect();
        GridGeometry::build(GridAxes::new(lat, lon).unwrap(), NLDAS_HALF_WIDTH).unwrap()
    }

    fn counties(shapes: Vec<MultiPolygon<f64>>) -> Counties {
        let ids = (0..shapes.len()).map(|i| format!("{:05}", 20001 + 2 * i)).collect();
        Counties::from_geometries(ids, shapes, GeographicCrs::Wgs84).unwrap()
    }

    #[test]
    fn interior_counties_sum_to_one() {
        let grid = grid_4x4();
        let counties = counties(vec![
            rect(-97.95, 38.05, -97.6, 38.3),          // straddles several cells
            rect(-97.875, 38.125, -97.625, 38.375),    // exactly 2 x 2 cells
        ]);
        let weights = WeightMatrix::build(&counties, &grid).unwrap();

        for i in 0..counties.len() {
            assert!((weights.row_sum(i) - 1.0).abs() < 1e-6, "row {i} sums to {}", weights.row_sum(i));
        }
        // Straight projected edges leave metre-wide slivers against curved parallels.
        let significant = weights.row(1).filter(|&(_, w)| w > 1e-4).collect::<Vec<_>>();
        assert_eq!(significant.len(), 4);
        for (_, w) in significant {
            assert!((w - 0.25).abs() < 1e-3);
        }
    }

    #[test]
    fn county_outside_grid_has_empty_row() {
        let grid = grid_4x4();
        let counties = counties(vec![rect(-80.0, 30.0, -79.5, 30.5), MultiPolygon(Vec::new())]);
        let weights = WeightMatrix::build(&counties, &grid).unwrap();

        assert_eq!(weights.num_counties(), 2);
        assert!(!weights.has_coverage(0));
        assert!(!weights.has_coverage(1));
        assert_eq!(weights.nnz(), 0);
    }

    #[test]
    fn edge_county_sums_to_covered_share() {
        let grid = grid_4x4(); // spans lon -98.0 .. -97.5
        let counties = counties(vec![rect(-97.625, 38.125, -97.375, 38.375)]);
        let weights = WeightMatrix::build(&counties, &grid).unwrap();

        // Half of the county lies east of the grid.
        assert!((weights.row_sum(0) - 0.5).abs() < 1e-3);
        assert!(weights.has_coverage(0));
    }
}
