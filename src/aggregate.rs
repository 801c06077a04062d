use std::collections::BTreeMap;

use anyhow::{Context, Result};
use ndarray::ArrayView2;

use crate::{field::{MonthlyFields, Variable}, weights::WeightMatrix};

impl WeightMatrix {
    /// Project a gridded field onto counties by weighted sum.
    ///
    /// The field is gathered into column order through the matrix's grid
    /// index; NaN cells contribute zero. Counties whose weights sum to zero
    /// get NaN regardless of the product.
    pub fn aggregate(&self, field: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let mut cells = self.grid().flatten(field)?;
        for v in cells.iter_mut().filter(|v| v.is_nan()) {
            *v = 0.0;
        }

        Ok((0..self.num_counties())
            .map(|i| match self.has_coverage(i) {
                true => self.row(i).map(|(k, w)| w * cells[k]).sum(),
                false => f64::NAN,
            })
            .collect())
    }
}

/// One value per county for every variable of one (year, month).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCountyValues {
    pub year: i32,
    pub month: u32,
    values: BTreeMap<Variable, Vec<f64>>,
}

impl MonthlyCountyValues {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month, values: BTreeMap::new() }
    }

    /// Aggregate every field of a month through the weight matrix.
    pub fn aggregate(weights: &WeightMatrix, fields: &MonthlyFields) -> Result<Self> {
        let mut out = Self::new(fields.year, fields.month);
        for (variable, field) in fields.iter() {
            let values = weights.aggregate(field.view())
                .with_context(|| format!("aggregating {variable} for {:04}-{:02}", fields.year, fields.month))?;
            out.values.insert(variable, values);
        }
        Ok(out)
    }

    /// Builder-style insert of one variable's county vector.
    pub fn with(mut self, variable: Variable, values: Vec<f64>) -> Self {
        self.values.insert(variable, values);
        self
    }

    #[inline] pub fn get(&self, variable: Variable) -> Option<&[f64]> { self.values.get(&variable).map(Vec::as_slice) }

    #[inline] pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ { self.values.keys().copied() }

    /// Value of `variable` for county `i`; NaN when absent.
    #[inline]
    pub fn value(&self, variable: Variable, i: usize) -> f64 {
        self.values.get(&variable).and_then(|v| v.get(i).copied()).unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{field::RawMonth, grid::GridIndex};

    fn weights() -> WeightMatrix {
        WeightMatrix::from_rows(GridIndex::row_major(2, 2).unwrap(), vec![
            vec![(0, 0.5), (1, 0.5)],   // straddles the bottom row
            vec![(3, 1.0)],             // top-right cell only
            vec![],                     // no coverage
        ]).unwrap()
    }

    #[test]
    fn weighted_sum_per_county() {
        let out = weights().aggregate(array![[2.0, 4.0], [6.0, 8.0]].view()).unwrap();
        assert_eq!(out[0], 3.0);
        assert_eq!(out[1], 8.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn nan_cells_do_not_leak_into_other_counties() {
        let out = weights().aggregate(array![[2.0, 4.0], [6.0, f64::NAN]].view()).unwrap();
        assert_eq!(out[0], 3.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn uncovered_county_is_nan_even_for_zero_field() {
        let out = weights().aggregate(array![[0.0, 0.0], [0.0, 0.0]].view()).unwrap();
        assert_eq!(out[0], 0.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(weights().aggregate(array![[1.0, 2.0, 3.0]].view()).is_err());
    }

    #[test]
    fn monthly_values_cover_every_derived_variable() {
        let raw = RawMonth::new()
            .with("Tair", array![[283.15, 283.15], [283.15, 293.15]])
            .with("Rainf", array![[1.0, 1.0], [1.0, 1.0]]);
        let fields = MonthlyFields::derive(2003, 7, &raw).unwrap();
        let values = MonthlyCountyValues::aggregate(&weights(), &fields).unwrap();

        assert_eq!(values.variables().collect::<Vec<_>>(), vec![Variable::Tas, Variable::Prcp]);
        assert!((values.value(Variable::Tas, 1) - 20.0).abs() < 1e-9);
        assert_eq!(values.value(Variable::Prcp, 0), 1.0);
        assert!(values.value(Variable::Wind, 0).is_nan());
    }
}
