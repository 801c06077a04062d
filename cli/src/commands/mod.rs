pub mod build_weights;
pub mod run;

use anyhow::Result;
use nldas_county::{MonthlySource, PanelConfig};

use crate::cli::{Cli, ConfigArgs};

/// Read the configuration file (if any), apply flag overrides, and validate.
pub fn load_config(cli: &Cli, args: &ConfigArgs) -> Result<PanelConfig> {
    let mut config = match &cli.config {
        Some(path) => PanelConfig::from_toml_file(path)?,
        None => PanelConfig::default(),
    };

    if let Some(dir) = &args.input_dir { config.input_dir = dir.clone(); }
    if let Some(path) = &args.boundary { config.boundary_path = path.clone(); }
    if let Some(dir) = &args.output { config.output_dir = dir.clone(); }
    if let Some(field) = &args.id_field { config.id_field = field.clone(); }
    if let Some(year) = args.start_year { config.start_year = year; }
    if let Some(year) = args.end_year { config.end_year = year; }
    if let Some(limit) = args.limit { config.county_limit = Some(limit); }
    if let Some(dir) = &args.cache_dir { config.cache_dir = Some(dir.clone()); }
    if let Some(prefix) = &args.prefix { config.output_prefix = prefix.clone(); }

    config.validate()?;
    Ok(config)
}

/// Open the monthly files under `config.input_dir`.
#[cfg(feature = "netcdf")]
pub fn open_source(config: &PanelConfig) -> Result<Box<dyn MonthlySource>> {
    Ok(Box::new(nldas_county::netcdf_source(config)?))
}

#[cfg(not(feature = "netcdf"))]
pub fn open_source(_config: &PanelConfig) -> Result<Box<dyn MonthlySource>> {
    Err(nldas_county::PanelError::Configuration(
        "this binary was built without NetCDF support; rebuild with `--features netcdf`".into(),
    ).into())
}
