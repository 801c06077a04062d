/// Magnitudes above this are treated as unflagged fill.
pub const FILL_MAGNITUDE: f64 = 1e30;

/// CF packing attributes of one stored variable.
///
/// Fill values are matched against the stored value, so a packed file whose
/// `_FillValue` is `-9999` masks raw `-9999` regardless of `scale_factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct CfPacking {
    pub scale: f64,
    pub offset: f64,
    pub fills: Vec<f64>,
}

impl Default for CfPacking {
    fn default() -> Self {
        Self { scale: 1.0, offset: 0.0, fills: Vec::new() }
    }
}

impl CfPacking {
    /// Physical value of one stored value, or NaN when it is missing.
    #[inline]
    pub fn decode(&self, raw: f64) -> f64 {
        if !raw.is_finite() || raw.abs() > FILL_MAGNITUDE || self.fills.contains(&raw) {
            f64::NAN
        } else {
            raw * self.scale + self.offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_matched_before_scaling() {
        let packing = CfPacking { scale: 0.01, offset: 0.0, fills: vec![-9999.0] };

        assert!(packing.decode(-9999.0).is_nan());
        assert!((packing.decode(-999_900.0) + 9999.0).abs() < 1e-9);
        assert!((packing.decode(1234.0) - 12.34).abs() < 1e-12);
    }

    #[test]
    fn scale_then_offset() {
        let packing = CfPacking { scale: 0.5, offset: 273.15, fills: vec![] };
        assert!((packing.decode(10.0) - 278.15).abs() < 1e-12);
        assert_eq!(CfPacking::default().decode(-3.5), -3.5);
    }

    #[test]
    fn non_finite_and_huge_values_are_missing() {
        let packing = CfPacking::default();
        for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 9.96921e36, -1e31] {
            assert!(packing.decode(raw).is_nan(), "{raw}");
        }
        assert_eq!(packing.decode(1e30), 1e30);
    }

    #[test]
    fn any_listed_fill_masks() {
        let packing = CfPacking { scale: 1.0, offset: 0.0, fills: vec![-9999.0, -32768.0] };
        assert!(packing.decode(-9999.0).is_nan());
        assert!(packing.decode(-32768.0).is_nan());
        assert_eq!(packing.decode(0.0), 0.0);
    }
}
