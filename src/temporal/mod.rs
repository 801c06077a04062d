mod season;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, ensure, Result};

use crate::{aggregate::MonthlyCountyValues, field::Variable};

pub use season::{Period, Season};

/// Annual and seasonal statistics of one county for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualCountyRecord {
    geo_id: String,
    year: i32,
    stats: BTreeMap<(Variable, Period), f64>,
}

impl AnnualCountyRecord {
    #[inline] pub fn geo_id(&self) -> &str { &self.geo_id }

    #[inline] pub fn year(&self) -> i32 { self.year }

    /// Statistic for one variable and period; None when no month contributed.
    #[inline]
    pub fn get(&self, variable: Variable, period: Period) -> Option<f64> {
        self.stats.get(&(variable, period)).copied()
    }

    /// True if no statistic could be computed (all columns missing).
    #[inline] pub fn is_empty(&self) -> bool { self.stats.is_empty() }
}

/// Fold one calendar year of monthly county values into annual records.
///
/// `months` holds the available months of `year` (any subset of Jan–Dec).
/// `prior_december` is December of `year - 1`; it belongs to this year's
/// DJF and to nothing else. Annual statistics use Jan–Dec of `year` only.
/// Missing months and NaN values are excluded; a statistic with no
/// contributing month is absent. Every county gets a record, even when empty.
pub fn fold_year(
    year: i32,
    geo_ids: &[String],
    months: &[MonthlyCountyValues],
    prior_december: Option<&MonthlyCountyValues>,
) -> Result<Vec<AnnualCountyRecord>> {
    let mut by_month: [Option<&MonthlyCountyValues>; 12] = [None; 12];
    for values in months {
        ensure!(values.year == year, "[temporal] {:04}-{:02} supplied to the {year} fold", values.year, values.month);
        ensure!((1..=12).contains(&values.month), "[temporal] invalid month {}", values.month);
        let slot = &mut by_month[values.month as usize - 1];
        if slot.is_some() {
            bail!("[temporal] month {year:04}-{:02} supplied twice", values.month);
        }
        *slot = Some(values);
    }
    if let Some(december) = prior_december {
        ensure!(
            december.year == year - 1 && december.month == 12,
            "[temporal] carried month must be {:04}-12, got {:04}-{:02}", year - 1, december.year, december.month
        );
    }

    let variables = months.iter().chain(prior_december)
        .flat_map(|values| values.variables())
        .collect::<BTreeSet<_>>();

    // Contributing months of each period, with the carried December relabelled into DJF.
    let window = |period: Period| -> Vec<&MonthlyCountyValues> {
        match period {
            Period::Annual => by_month.iter().flatten().copied().collect(),
            Period::Season(Season::Djf) => prior_december.into_iter()
                .chain(by_month[0..2].iter().flatten().copied())
                .collect(),
            Period::Season(season) => season.months().iter()
                .filter_map(|&m| by_month[m as usize - 1])
                .collect(),
        }
    };
    let windows = Period::ALL.map(|period| (period, window(period)));

    Ok(geo_ids.iter().enumerate()
        .map(|(i, geo_id)| {
            let mut stats = BTreeMap::new();
            for &variable in &variables {
                for (period, window) in &windows {
                    let values = window.iter().map(|m| m.value(variable, i));
                    if let Some(stat) = variable.statistic().apply(values) {
                        stats.insert((variable, *period), stat);
                    }
                }
            }
            AnnualCountyRecord { geo_id: geo_id.clone(), year, stats }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAS: Variable = Variable::Tas;
    const PRCP: Variable = Variable::Prcp;
    const DJF: Period = Period::Season(Season::Djf);
    const MAM: Period = Period::Season(Season::Mam);
    const JJA: Period = Period::Season(Season::Jja);
    const SON: Period = Period::Season(Season::Son);

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:05}", 1001 + 2 * i)).collect()
    }

    fn month(year: i32, month: u32, tas: f64) -> MonthlyCountyValues {
        MonthlyCountyValues::new(year, month)
            .with(TAS, vec![tas])
            .with(PRCP, vec![10.0 * month as f64])
    }

    fn full_year(year: i32) -> Vec<MonthlyCountyValues> {
        (1..=12).map(|m| month(year, m, m as f64)).collect()
    }

    #[test]
    fn annual_and_seasonal_statistics() {
        let records = fold_year(2005, &ids(1), &full_year(2005), None).unwrap();
        let record = &records[0];

        assert_eq!(record.year(), 2005);
        assert_eq!(record.get(TAS, Period::Annual), Some(6.5));
        assert_eq!(record.get(PRCP, Period::Annual), Some(780.0));
        assert_eq!(record.get(TAS, MAM), Some(4.0));
        assert_eq!(record.get(TAS, JJA), Some(7.0));
        assert_eq!(record.get(TAS, SON), Some(10.0));
        assert_eq!(record.get(PRCP, JJA), Some(210.0));
        // Without a carried December, DJF is January and February only.
        assert_eq!(record.get(TAS, DJF), Some(1.5));
    }

    #[test]
    fn djf_uses_prior_december_not_current() {
        let prior = month(2004, 12, -6.0);
        let mut months = full_year(2005);

        let base = fold_year(2005, &ids(1), &months, Some(&prior)).unwrap();
        assert_eq!(base[0].get(TAS, DJF), Some((-6.0 + 1.0 + 2.0) / 3.0));
        assert_eq!(base[0].get(PRCP, DJF), Some(120.0 + 10.0 + 20.0));

        // Changing this year's December leaves DJF alone.
        months[11] = month(2005, 12, 40.0);
        let changed = fold_year(2005, &ids(1), &months, Some(&prior)).unwrap();
        assert_eq!(changed[0].get(TAS, DJF), base[0].get(TAS, DJF));

        // The carried December never enters the annual statistic.
        assert_eq!(base[0].get(TAS, Period::Annual), Some(6.5));
    }

    #[test]
    fn missing_november_is_excluded_not_imputed() {
        let months = full_year(2010).into_iter().filter(|m| m.month != 11).collect::<Vec<_>>();
        let record = &fold_year(2010, &ids(1), &months, None).unwrap()[0];

        let expected = (1..=12).filter(|&m| m != 11).sum::<u32>() as f64 / 11.0;
        assert!((record.get(TAS, Period::Annual).unwrap() - expected).abs() < 1e-12);
        assert_eq!(record.get(TAS, SON), Some(9.5));
    }

    #[test]
    fn two_month_winter_scenario() {
        let months = vec![month(1999, 1, 10.0), month(1999, 2, 20.0)];
        let prior = MonthlyCountyValues::new(1998, 12).with(TAS, vec![f64::NAN]);
        let record = &fold_year(1999, &ids(1), &months, Some(&prior)).unwrap()[0];

        assert_eq!(record.get(TAS, DJF), Some(15.0));
        assert_eq!(record.get(TAS, MAM), None);
        assert_eq!(record.get(TAS, JJA), None);
        assert_eq!(record.get(TAS, SON), None);
    }

    #[test]
    fn county_without_values_keeps_an_empty_record() {
        let months = vec![
            MonthlyCountyValues::new(2001, 1).with(TAS, vec![1.0, f64::NAN]),
            MonthlyCountyValues::new(2001, 2).with(TAS, vec![3.0, f64::NAN]),
        ];
        let records = fold_year(2001, &ids(2), &months, None).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(TAS, Period::Annual), Some(2.0));
        assert!(records[1].is_empty());
        assert_eq!(records[1].geo_id(), "01003");
    }

    #[test]
    fn year_with_no_months_yields_empty_records() {
        let records = fold_year(2002, &ids(3), &[], None).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(AnnualCountyRecord::is_empty));
    }

    #[test]
    fn misfiled_months_are_rejected() {
        assert!(fold_year(2005, &ids(1), &[month(2004, 3, 1.0)], None).is_err());
        assert!(fold_year(2005, &ids(1), &[month(2005, 3, 1.0), month(2005, 3, 2.0)], None).is_err());
        assert!(fold_year(2005, &ids(1), &[], Some(&month(2003, 12, 1.0))).is_err());
        assert!(fold_year(2005, &ids(1), &[], Some(&month(2004, 11, 1.0))).is_err());
    }
}
