mod summary;
mod table;

use std::{collections::BTreeSet, path::{Path, PathBuf}};

use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    aggregate::MonthlyCountyValues,
    boundary::Counties,
    common,
    error::PanelError,
    field::{self, MonthlySource, Variable},
    temporal::{self, AnnualCountyRecord},
    weights::WeightMatrix,
};

pub use summary::{OutputFile, PanelSummary};
pub use table::{column_name, output_columns, ID_COLUMN, YEAR_COLUMN};

pub const DEFAULT_PREFIX: &str = "NLDAS";

/// Year-by-year driver: load months, aggregate to counties, fold into annual
/// records, and write one CSV per year plus the combined panel.
///
/// Years are processed strictly in order; only the previous December is
/// carried from one year to the next.
pub struct YearStream<'a> {
    source: &'a dyn MonthlySource,
    weights: &'a WeightMatrix,
    geo_ids: Vec<String>,
    output_dir: PathBuf,
    prefix: String,
}

impl<'a> YearStream<'a> {
    pub fn new(
        source: &'a dyn MonthlySource,
        weights: &'a WeightMatrix,
        counties: &Counties,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        if weights.num_counties() != counties.len() {
            return Err(PanelError::config(format!(
                "weight matrix has {} rows but {} counties are loaded",
                weights.num_counties(), counties.len()
            )).into());
        }

        Ok(Self {
            source,
            weights,
            geo_ids: counties.geo_ids(),
            output_dir: output_dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[inline] pub fn output_dir(&self) -> &Path { &self.output_dir }

    /// `<prefix>_<YYYY>.csv`
    pub fn year_path(&self, year: i32) -> PathBuf {
        self.output_dir.join(format!("{}_{year:04}.csv", self.prefix))
    }

    /// `<prefix>_<start>_<end>.csv`
    pub fn panel_path(&self, start: i32, end: i32) -> PathBuf {
        self.output_dir.join(format!("{}_{start:04}_{end:04}.csv", self.prefix))
    }

    /// Process `start..=end` and write every output file.
    ///
    /// Missing or unreadable months are skipped with a warning. A failed
    /// per-year write is logged and the run moves on; configuration errors
    /// and a failed combined write abort.
    pub fn run(&self, start: i32, end: i32) -> Result<PanelSummary> {
        if start > end {
            return Err(PanelError::config(format!("start year {start} is after end year {end}")).into());
        }
        let axes = self.source.grid_axes()?;
        if axes.shape() != self.weights.grid().shape() {
            return Err(PanelError::config(format!(
                "source grid is {:?} but the weight matrix was built for {:?}",
                axes.shape(), self.weights.grid().shape()
            )).into());
        }
        if !self.weights.matches_axes(&axes) {
            return Err(PanelError::config(
                "source grid coordinates differ from the grid the weight matrix was built for"
            ).into());
        }
        common::ensure_dir_exists(&self.output_dir)?;

        let mut skipped = Vec::new();
        let mut carried = self.load(start - 1, 12, &mut skipped)?;
        if carried.is_none() {
            info!("[panel] no December {} available; DJF {start} uses Jan and Feb only", start - 1);
        }

        let mut records = Vec::with_capacity(self.geo_ids.len() * (end - start + 1) as usize);
        let mut variables = BTreeSet::new();
        let mut year_files = Vec::new();

        for year in start..=end {
            info!("[panel] processing {year}");
            let months = (1..=12)
                .filter_map(|month| self.load(year, month, &mut skipped).transpose())
                .collect::<Result<Vec<_>>>()?;

            let year_records = temporal::fold_year(year, &self.geo_ids, &months, carried.as_ref())?;

            let mut year_variables = months.iter().chain(carried.as_ref())
                .flat_map(MonthlyCountyValues::variables)
                .collect::<BTreeSet<_>>();
            if months.is_empty() {
                warn!("[panel] no readable months for {year}; writing empty records");
                year_variables.extend(variables.iter().copied());
            }

            let path = self.year_path(year);
            match table::write_records(&year_records, &year_variables, &path) {
                Ok(bytes) => {
                    info!("[panel] wrote {} ({} records)", path.display(), year_records.len());
                    year_files.push(OutputFile { path, bytes });
                }
                Err(e) => warn!("[panel] failed to write {}: {e:#}", path.display()),
            }

            carried = months.into_iter().find(|values| values.month == 12);
            variables.extend(year_variables);
            records.extend(year_records);
        }

        let summary = self.write_panel(start, end, &records, &variables, year_files, skipped)?;
        summary.log();
        Ok(summary)
    }

    /// Load and aggregate one month. Missing and unreadable months yield
    /// `None` and are recorded in `skipped`; other failures propagate.
    fn load(&self, year: i32, month: u32, skipped: &mut Vec<(i32, u32)>) -> Result<Option<MonthlyCountyValues>> {
        let loaded = field::load_month(self.source, year, month)
            .and_then(|fields| fields.map(|f| MonthlyCountyValues::aggregate(self.weights, &f)).transpose());

        match loaded {
            Ok(Some(values)) => {
                debug!("[panel] {year:04}-{month:02}: {} variables", values.variables().count());
                Ok(Some(values))
            }
            Ok(None) => {
                warn!("[panel] {year:04}-{month:02}: no source file, skipping");
                skipped.push((year, month));
                Ok(None)
            }
            Err(e) if is_fatal(&e) => Err(e),
            Err(e) => {
                warn!("[panel] {year:04}-{month:02}: skipping unreadable month: {e:#}");
                skipped.push((year, month));
                Ok(None)
            }
        }
    }

    fn write_panel(
        &self,
        start: i32,
        end: i32,
        records: &[AnnualCountyRecord],
        variables: &BTreeSet<Variable>,
        year_files: Vec<OutputFile>,
        skipped_months: Vec<(i32, u32)>,
    ) -> Result<PanelSummary> {
        let path = self.panel_path(start, end);
        let bytes = table::write_records(records, variables, &path)?;
        info!("[panel] wrote combined panel {}", path.display());

        let columns = [ID_COLUMN.to_string(), YEAR_COLUMN.to_string()].into_iter()
            .chain(output_columns(variables).into_iter().map(|(v, p)| column_name(v, p)))
            .collect::<Vec<_>>();

        Ok(PanelSummary {
            start_year: start,
            end_year: end,
            num_counties: self.geo_ids.len(),
            num_rows: records.len(),
            columns,
            year_files,
            panel_file: OutputFile { path, bytes },
            skipped_months,
            coverage: PanelSummary::coverage(records, variables),
        })
    }
}

/// Configuration and cache failures abort the run; anything else is per-file.
fn is_fatal(e: &anyhow::Error) -> bool {
    e.downcast_ref::<PanelError>().is_some_and(|pe| !pe.is_recoverable())
}
