use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use log::debug;
use ndarray::Array2;

use crate::{grid::GridAxes, PanelError};

use super::{derive::SOURCE_VARIABLES, CfPacking, MonthlyCatalog, MonthlySource, RawMonth};

/// Reads NLDAS-style monthly NetCDF files listed in a catalog.
///
/// Each data variable is `(time, lat, lon)` (or `(lat, lon)`); only the first
/// time step is used. `_FillValue`/`missing_value`, non-finite values, and
/// magnitudes above 1e30 become NaN (see [`CfPacking`]); `scale_factor`/`add_offset` are applied.
#[derive(Debug, Clone)]
pub struct NetcdfSource {
    catalog: MonthlyCatalog,
    sample: Option<std::path::PathBuf>,
}

impl NetcdfSource {
    /// `sample` is the file whose coordinate axes define the grid.
    pub fn new(catalog: MonthlyCatalog, sample: Option<&Path>) -> Self {
        Self { catalog, sample: sample.map(Path::to_path_buf) }
    }

    #[inline] pub fn catalog(&self) -> &MonthlyCatalog { &self.catalog }
}

impl MonthlySource for NetcdfSource {
    fn grid_axes(&self) -> Result<GridAxes> {
        let path = self.sample.as_deref()
            .ok_or_else(|| PanelError::config("no monthly file available to sample the grid from"))?;
        let file = netcdf::open(path)
            .map_err(|e| PanelError::config(format!("failed to open grid sample {}: {e}", path.display())))?;

        let lat = read_axis(&file, &["lat", "latitude"])
            .with_context(|| format!("grid sample {}", path.display()))?;
        let lon = read_axis(&file, &["lon", "longitude"])
            .with_context(|| format!("grid sample {}", path.display()))?;
        debug!("[netcdf] grid {} x {} from {}", lat.len(), lon.len(), path.display());
        GridAxes::new(lat, lon)
    }

    fn read_month(&self, year: i32, month: u32) -> Result<Option<RawMonth>> {
        let Some(path) = self.catalog.path(year, month) else { return Ok(None) };
        read_raw_month(path)
            .map(Some)
            .map_err(|e| PanelError::source_file(path, format!("{e:#}")).into())
    }
}

fn read_raw_month(path: &Path) -> Result<RawMonth> {
    let file = netcdf::open(path)?;
    let mut raw = RawMonth::new();
    for name in SOURCE_VARIABLES {
        if let Some(var) = file.variable(name) {
            raw.insert(name, read_grid(&var).with_context(|| format!("variable {name}"))?);
        }
    }
    ensure!(!raw.is_empty(), "no recognised variables");
    Ok(raw)
}

fn read_axis(file: &netcdf::File, names: &[&str]) -> Result<Vec<f64>> {
    for name in names {
        if let Some(var) = file.variable(name) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }
    Err(PanelError::config(format!("missing coordinate axis {}", names.join(" or "))).into())
}

/// First time step of a `(.., lat, lon)` variable as a 2-D field.
fn read_grid(var: &netcdf::Variable) -> Result<Array2<f64>> {
    let dims = var.dimensions();
    ensure!(dims.len() >= 2, "expected at least 2 dimensions, found {}", dims.len());
    let (rows, cols) = (dims[dims.len() - 2].len(), dims[dims.len() - 1].len());

    let packing = CfPacking {
        scale: attr_f64(var, "scale_factor").unwrap_or(1.0),
        offset: attr_f64(var, "add_offset").unwrap_or(0.0),
        fills: ["_FillValue", "missing_value"].into_iter().filter_map(|name| attr_f64(var, name)).collect(),
    };

    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    ensure!(values.len() >= rows * cols, "expected {} values, found {}", rows * cols, values.len());

    let field = values[..rows * cols].iter().map(|&v| packing.decode(v)).collect();

    Array2::from_shape_vec((rows, cols), field).map_err(|e| anyhow!("reshape failed: {e}"))
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            netcdf::AttributeValue::Short(s) => Some(s as f64),
            netcdf::AttributeValue::Int(i) => Some(i as f64),
            _ => None,
        })
}
