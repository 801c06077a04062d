use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::Column};

use crate::{field::Variable, io, temporal::{AnnualCountyRecord, Period}};

pub const ID_COLUMN: &str = "COUNTY_FIPS";
pub const YEAR_COLUMN: &str = "year";

/// Output column of one statistic, e.g. `prcp_sum_annual` or `tas_mean_DJF`.
pub fn column_name(variable: Variable, period: Period) -> String {
    format!("{}_{}_{}", variable.name(), variable.statistic().label(), period.label())
}

/// Statistic columns in output order: the annual block, then one block per season.
pub fn output_columns(variables: &BTreeSet<Variable>) -> Vec<(Variable, Period)> {
    Period::ALL.iter()
        .flat_map(|&period| variables.iter().map(move |&variable| (variable, period)))
        .collect()
}

/// Convert annual records to a DataFrame. Absent statistics become nulls.
pub(crate) fn records_to_dataframe(records: &[AnnualCountyRecord], variables: &BTreeSet<Variable>) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(ID_COLUMN.into(), records.iter().map(|r| r.geo_id()).collect::<Vec<_>>()),
        Column::new(YEAR_COLUMN.into(), records.iter().map(|r| r.year()).collect::<Vec<_>>()),
    ];
    columns.extend(output_columns(variables).into_iter().map(|(variable, period)| {
        Column::new(
            column_name(variable, period).into(),
            records.iter().map(|r| r.get(variable, period)).collect::<Vec<_>>(),
        )
    }));

    Ok(DataFrame::new(columns)?)
}

/// Write records to a CSV file and return the written size in bytes.
pub(crate) fn write_records(records: &[AnnualCountyRecord], variables: &BTreeSet<Variable>, path: &Path) -> Result<u64> {
    let mut df = records_to_dataframe(records, variables)
        .with_context(|| format!("[panel::table] Failed to tabulate {}", path.display()))?;
    io::csv::write_csv(&mut df, path)?;

    Ok(fs::metadata(path)
        .with_context(|| format!("[panel::table] Failed to stat {}", path.display()))?
        .len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::MonthlyCountyValues, temporal::{fold_year, Season}};

    #[test]
    fn columns_are_annual_then_season_major() {
        let variables = BTreeSet::from([Variable::Prcp, Variable::Tas]);
        let names = output_columns(&variables).into_iter()
            .map(|(v, p)| column_name(v, p))
            .collect::<Vec<_>>();

        assert_eq!(names, [
            "tas_mean_annual", "prcp_sum_annual",
            "tas_mean_DJF", "prcp_sum_DJF",
            "tas_mean_MAM", "prcp_sum_MAM",
            "tas_mean_JJA", "prcp_sum_JJA",
            "tas_mean_SON", "prcp_sum_SON",
        ]);
    }

    #[test]
    fn missing_statistics_are_null_not_zero() {
        let months = vec![
            MonthlyCountyValues::new(1999, 1).with(Variable::Tas, vec![10.0, f64::NAN]),
            MonthlyCountyValues::new(1999, 2).with(Variable::Tas, vec![20.0, f64::NAN]),
        ];
        let ids = vec!["01001".to_string(), "01003".to_string()];
        let records = fold_year(1999, &ids, &months, None).unwrap();
        let df = records_to_dataframe(&records, &BTreeSet::from([Variable::Tas])).unwrap();

        assert_eq!(df.shape(), (2, 2 + 5));
        let djf = df.column(&column_name(Variable::Tas, Period::Season(Season::Djf))).unwrap();
        assert_eq!(djf.null_count(), 1);
        let mam = df.column("tas_mean_MAM").unwrap();
        assert_eq!(mam.null_count(), 2);
        assert_eq!(df.column(ID_COLUMN).unwrap().str().unwrap().get(1), Some("01003"));
    }

    #[test]
    fn written_file_reports_its_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NLDAS_2001.csv");
        let records = fold_year(2001, &["06037".to_string()], &[], None).unwrap();

        let bytes = write_records(&records, &BTreeSet::from([Variable::Wind]), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(bytes, text.len() as u64);
        assert!(text.starts_with("COUNTY_FIPS,year,wind_mean_annual,wind_mean_DJF"));
        assert!(text.contains("06037,2001,,,,,"));
    }
}
