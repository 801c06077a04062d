#![doc = "Area-weighted aggregation of gridded monthly reanalysis to county-year panels"]
mod aggregate;
mod boundary;
mod common;
mod config;
mod error;
mod field;
mod geom;
mod grid;
mod io;
mod panel;
mod pipeline;
mod temporal;
mod weights;

#[doc(inline)]
pub use error::PanelError;

#[doc(inline)]
pub use boundary::{Counties, County};

#[doc(inline)]
pub use geom::GeographicCrs;

#[doc(inline)]
pub use grid::{CellIndex, GridAxes, GridCell, GridGeometry, GridIndex, NLDAS_HALF_WIDTH};

#[doc(inline)]
pub use weights::{WeightCache, WeightMatrix};

#[doc(inline)]
pub use field::{
    derive_fields, load_month, relative_humidity, CfPacking, MemorySource, MonthlyCatalog, MonthlyFields,
    MonthlySource, RawMonth, Statistic, Variable, FILL_MAGNITUDE, KELVIN_OFFSET, NLDAS_FILE_PATTERN,
};

#[cfg(feature = "netcdf")]
#[doc(inline)]
pub use field::NetcdfSource;

#[doc(inline)]
pub use aggregate::MonthlyCountyValues;

#[doc(inline)]
pub use temporal::{fold_year, AnnualCountyRecord, Period, Season};

#[doc(inline)]
pub use panel::{column_name, output_columns, OutputFile, PanelSummary, YearStream, ID_COLUMN, YEAR_COLUMN};

#[doc(inline)]
pub use config::PanelConfig;

#[doc(inline)]
pub use pipeline::{load_counties, prepare_weights, run_panel};

#[cfg(feature = "netcdf")]
#[doc(inline)]
pub use pipeline::netcdf_source;
