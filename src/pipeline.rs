//! Config-driven assembly of the engine: boundaries, grid, weights, and the
//! year stream.

use anyhow::{Context, Result};
use log::info;

use crate::{
    boundary::Counties,
    config::PanelConfig,
    field::MonthlySource,
    grid::{GridAxes, GridGeometry},
    panel::{PanelSummary, YearStream},
    weights::{WeightCache, WeightMatrix},
};

/// Load the county boundaries named by `config`.
pub fn load_counties(config: &PanelConfig) -> Result<Counties> {
    info!("[pipeline] loading counties from {}", config.boundary_path.display());
    Counties::from_shapefile(&config.boundary_path, &config.id_field, config.county_limit)
}

/// Load the cached weights for this grid and county set, building them if
/// the cache is absent, unreadable, or `rebuild_weights` is set.
pub fn prepare_weights(config: &PanelConfig, counties: &Counties, axes: GridAxes) -> Result<WeightMatrix> {
    let (rows, cols) = axes.shape();
    info!("[pipeline] grid: {rows} x {cols} = {} cells", rows * cols);

    let grid = GridGeometry::build(axes, config.half_width)?;
    WeightCache::new(config.cache_dir()).load_or_build(counties, &grid, config.rebuild_weights)
}

/// Run the full panel for `config.start_year..=config.end_year`.
pub fn run_panel(config: &PanelConfig, counties: &Counties, source: &dyn MonthlySource) -> Result<PanelSummary> {
    let axes = source.grid_axes().context("[pipeline] Failed to read grid axes")?;
    let weights = prepare_weights(config, counties, axes)?;

    YearStream::new(source, &weights, counties, &config.output_dir)?
        .with_prefix(config.output_prefix.as_str())
        .run(config.start_year, config.end_year)
}

/// Discover monthly NetCDF files under `config.input_dir`.
#[cfg(feature = "netcdf")]
pub fn netcdf_source(config: &PanelConfig) -> Result<crate::field::NetcdfSource> {
    use crate::{field::{MonthlyCatalog, NetcdfSource}, PanelError};

    let catalog = MonthlyCatalog::scan(&config.input_dir, &config.file_regex()?)?;
    if catalog.is_empty() {
        return Err(PanelError::config(format!("no monthly files found in {}", config.input_dir.display())).into());
    }
    info!("[pipeline] found {} monthly files", catalog.len());
    catalog.report_gaps(config.start_year, config.end_year);

    let sample = catalog.sample(config.start_year, config.end_year).map(|p| p.to_path_buf());
    Ok(NetcdfSource::new(catalog, sample.as_deref()))
}
