use std::{collections::{BTreeMap, BTreeSet}, path::PathBuf};

use log::{info, warn};

use crate::{field::Variable, temporal::{AnnualCountyRecord, Period}};

/// A CSV written by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// What one run produced, for the final coverage report.
#[derive(Debug, Clone)]
pub struct PanelSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub num_counties: usize,
    pub num_rows: usize,
    /// Output columns of the combined panel, identifier and year included.
    pub columns: Vec<String>,
    pub year_files: Vec<OutputFile>,
    pub panel_file: OutputFile,
    /// Months that were missing or unreadable, in processing order.
    pub skipped_months: Vec<(i32, u32)>,
    /// Fraction of non-missing statistics per variable over all rows and periods.
    pub coverage: BTreeMap<Variable, f64>,
}

impl PanelSummary {
    /// Non-missing fraction per variable across every record and period.
    pub(crate) fn coverage(records: &[AnnualCountyRecord], variables: &BTreeSet<Variable>) -> BTreeMap<Variable, f64> {
        let total = records.len() * Period::ALL.len();
        variables.iter()
            .map(|&variable| {
                let present = records.iter()
                    .flat_map(|r| Period::ALL.map(|p| r.get(variable, p)))
                    .filter(Option::is_some)
                    .count();
                let fraction = if total == 0 { 0.0 } else { present as f64 / total as f64 };
                (variable, fraction)
            })
            .collect()
    }

    #[inline] pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ { self.coverage.keys().copied() }

    /// Print the run report through the log facade.
    pub fn log(&self) {
        info!(
            "[panel] combined panel: {} rows x {} columns, years {}-{}, {} counties",
            self.num_rows, self.columns.len(), self.start_year, self.end_year, self.num_counties
        );
        info!("[panel] variables: {}", self.variables().map(|v| v.name()).collect::<Vec<_>>().join(", "));
        for (variable, fraction) in &self.coverage {
            info!("[panel]   {variable:<8} {:>6.2}% non-missing", fraction * 100.0);
        }
        for file in self.year_files.iter().chain(std::iter::once(&self.panel_file)) {
            info!("[panel]   {} ({:.1} KB)", file.path.display(), file.bytes as f64 / 1024.0);
        }
        if !self.skipped_months.is_empty() {
            let months = self.skipped_months.iter()
                .map(|(y, m)| format!("{y:04}-{m:02}"))
                .collect::<Vec<_>>();
            warn!("[panel] {} month(s) skipped: {}", months.len(), months.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::MonthlyCountyValues, temporal::fold_year};

    #[test]
    fn coverage_counts_present_statistics() {
        let months = (1..=12)
            .map(|m| MonthlyCountyValues::new(2003, m).with(Variable::Tas, vec![m as f64, f64::NAN]))
            .collect::<Vec<_>>();
        let ids = vec!["01001".to_string(), "01003".to_string()];
        let records = fold_year(2003, &ids, &months, None).unwrap();

        let coverage = PanelSummary::coverage(&records, &BTreeSet::from([Variable::Tas, Variable::Cape]));
        assert!((coverage[&Variable::Tas] - 0.5).abs() < 1e-12);
        assert_eq!(coverage[&Variable::Cape], 0.0);
    }
}
