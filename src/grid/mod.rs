mod index;

use anyhow::{ensure, Result};
use geo::{Coord, LineString, Polygon};
use log::debug;

use crate::common::Fingerprint;

pub use index::{CellIndex, GridIndex};

/// Nominal half-width of a 0.125° NLDAS cell, in degrees.
pub const NLDAS_HALF_WIDTH: f64 = 0.0625;

/// The 1-D latitude and longitude coordinate axes of a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl GridAxes {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        ensure!(!lat.is_empty() && !lon.is_empty(), "[grid] empty coordinate axis (lat {}, lon {})", lat.len(), lon.len());
        ensure!(
            lat.iter().chain(&lon).all(|v| v.is_finite()),
            "[grid] coordinate axes contain non-finite values"
        );
        Ok(Self { lat, lon })
    }

    #[inline] pub fn lat(&self) -> &[f64] { &self.lat }

    #[inline] pub fn lon(&self) -> &[f64] { &self.lon }

    /// (rows, cols) = (latitudes, longitudes).
    #[inline] pub fn shape(&self) -> (usize, usize) { (self.lat.len(), self.lon.len()) }

    #[inline] pub fn num_cells(&self) -> usize { self.lat.len() * self.lon.len() }
}

/// One grid point and the square cell polygon around it (lon/lat degrees).
#[derive(Debug, Clone)]
pub struct GridCell {
    index: CellIndex,
    center: Coord<f64>,
    polygon: Polygon<f64>,
}

impl GridCell {
    fn new(index: CellIndex, center: Coord<f64>, half_width: f64) -> Self {
        let (x, y, h) = (center.x, center.y, half_width);
        let polygon = Polygon::new(
            LineString::from(vec![(x - h, y - h), (x + h, y - h), (x + h, y + h), (x - h, y + h), (x - h, y - h)]),
            vec![],
        );
        Self { index, center, polygon }
    }

    #[inline] pub fn index(&self) -> CellIndex { self.index }

    #[inline] pub fn center(&self) -> Coord<f64> { self.center }

    #[inline] pub fn polygon(&self) -> &Polygon<f64> { &self.polygon }
}

/// Cell polygons for every point of a grid, in the order recorded by `index()`.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    axes: GridAxes,
    half_width: f64,
    cells: Vec<GridCell>,
    index: GridIndex,
    fingerprint: String,
}

impl GridGeometry {
    /// Build one axis-aligned square of the given half-width (degrees) around
    /// every (lat, lon) pair, rows by latitude and columns by longitude.
    pub fn build(axes: GridAxes, half_width: f64) -> Result<Self> {
        ensure!(half_width.is_finite() && half_width > 0.0, "[grid] half-width must be positive, got {half_width}");

        let (rows, cols) = axes.shape();
        let index = GridIndex::row_major(rows, cols)?;
        let cells = index.cells().iter()
            .map(|&cell| {
                let center = Coord { x: axes.lon[cell.col as usize], y: axes.lat[cell.row as usize] };
                GridCell::new(cell, center, half_width)
            })
            .collect::<Vec<_>>();

        let fingerprint = Self::fingerprint_of(&axes, half_width);
        debug!("[grid] {rows} x {cols} = {} cells", cells.len());
        Ok(Self { axes, half_width, cells, index, fingerprint })
    }

    /// The fingerprint `build(axes, half_width)` would carry, without building cells.
    pub fn fingerprint_of(axes: &GridAxes, half_width: f64) -> String {
        let mut fingerprint = Fingerprint::new("grid/v1");
        fingerprint
            .floats("lat", &axes.lat)
            .floats("lon", &axes.lon)
            .floats("half_width", &[half_width]);
        fingerprint.finish()
    }

    #[inline] pub fn axes(&self) -> &GridAxes { &self.axes }

    #[inline] pub fn half_width(&self) -> f64 { self.half_width }

    #[inline] pub fn cells(&self) -> &[GridCell] { &self.cells }

    #[inline] pub fn len(&self) -> usize { self.cells.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Explicit mapping from weight-matrix column to (row, col).
    #[inline] pub fn index(&self) -> &GridIndex { &self.index }

    /// Content fingerprint over both axes and the half-width.
    #[inline] pub fn fingerprint(&self) -> &str { &self.fingerprint }
}
