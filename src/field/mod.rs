mod catalog;
mod derive;
mod memory;
#[cfg(feature = "netcdf")]
mod netcdf;
mod packing;
mod variable;

use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::Array2;

use crate::grid::GridAxes;

pub use catalog::{MonthlyCatalog, NLDAS_FILE_PATTERN};
pub use derive::{derive_fields, relative_humidity, KELVIN_OFFSET};
pub use memory::MemorySource;
#[cfg(feature = "netcdf")]
pub use self::netcdf::NetcdfSource;
pub use packing::{CfPacking, FILL_MAGNITUDE};
pub use variable::{Statistic, Variable};

/// Source variables of one monthly file, keyed by their names in the file.
/// Each field is indexed by grid (row, col) = (lat, lon).
#[derive(Debug, Clone, Default)]
pub struct RawMonth {
    vars: BTreeMap<String, Array2<f64>>,
}

impl RawMonth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, field: Array2<f64>) -> Self {
        self.insert(name, field);
        self
    }

    pub fn insert(&mut self, name: &str, field: Array2<f64>) {
        self.vars.insert(name.to_string(), field);
    }

    #[inline] pub fn get(&self, name: &str) -> Option<&Array2<f64>> { self.vars.get(name) }

    #[inline] pub fn is_empty(&self) -> bool { self.vars.is_empty() }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array2<f64>)> {
        self.vars.iter().map(|(name, field)| (name.as_str(), field))
    }
}

/// Derived physical fields of one (year, month).
#[derive(Debug, Clone)]
pub struct MonthlyFields {
    pub year: i32,
    pub month: u32,
    fields: BTreeMap<Variable, Array2<f64>>,
}

impl MonthlyFields {
    /// Apply unit conversions and derived-variable physics to raw source data.
    pub fn derive(year: i32, month: u32, raw: &RawMonth) -> Result<Self> {
        Ok(Self { year, month, fields: derive_fields(raw)? })
    }

    #[inline] pub fn get(&self, variable: Variable) -> Option<&Array2<f64>> { self.fields.get(&variable) }

    #[inline] pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ { self.fields.keys().copied() }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Array2<f64>)> {
        self.fields.iter().map(|(&v, field)| (v, field))
    }

    #[inline] pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// A provider of monthly gridded files on one static grid.
pub trait MonthlySource {
    /// Coordinate axes shared by every month.
    fn grid_axes(&self) -> Result<GridAxes>;

    /// Raw variables of one month. `Ok(None)` if the source has no file for
    /// that month; `Err` if the file exists but cannot be read.
    fn read_month(&self, year: i32, month: u32) -> Result<Option<RawMonth>>;
}

/// Read one month from `source` and derive its physical fields.
pub fn load_month(source: &dyn MonthlySource, year: i32, month: u32) -> Result<Option<MonthlyFields>> {
    source.read_month(year, month)?
        .map(|raw| MonthlyFields::derive(year, month, &raw))
        .transpose()
}
