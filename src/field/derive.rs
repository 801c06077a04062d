use std::collections::BTreeMap;

use anyhow::{ensure, Result};
use ndarray::{Array2, Zip};

use super::{RawMonth, Variable};

pub const KELVIN_OFFSET: f64 = 273.15;

// Source variable names in NLDAS-2 monthly forcing files.
pub(crate) const TAIR: &str = "Tair";
pub(crate) const WIND_E: &str = "Wind_E";
pub(crate) const WIND_N: &str = "Wind_N";
pub(crate) const RAINF: &str = "Rainf";
pub(crate) const QAIR: &str = "Qair";
pub(crate) const PSURF: &str = "PSurf";
pub(crate) const SWDOWN: &str = "SWdown";
pub(crate) const LWDOWN: &str = "LWdown";
pub(crate) const CAPE: &str = "CAPE";
pub(crate) const POTEVAP: &str = "PotEvap";

/// Every source variable the loader knows how to use.
#[cfg(feature = "netcdf")]
pub(crate) const SOURCE_VARIABLES: [&str; 10] = [TAIR, WIND_E, WIND_N, RAINF, QAIR, PSURF, SWDOWN, LWDOWN, CAPE, POTEVAP];

/// Relative humidity (%) from specific humidity `q` (kg/kg), air temperature
/// (K) and surface pressure (Pa).
///
/// Saturation vapour pressure uses the Magnus approximation
/// `es = 611.2 exp(17.67 Tc / (Tc + 243.5))` Pa; vapour pressure is
/// `e = q P / (0.622 + 0.378 q)`. The ratio is clipped to [0, 100].
/// Non-finite inputs or a non-finite/non-positive `es` give NaN.
pub fn relative_humidity(q: f64, t_kelvin: f64, p_pa: f64) -> f64 {
    if !(q.is_finite() && t_kelvin.is_finite() && p_pa.is_finite()) {
        return f64::NAN;
    }
    let tc = t_kelvin - KELVIN_OFFSET;
    let es = 6.112 * (17.67 * tc / (tc + 243.5)).exp() * 100.0; // hPa -> Pa
    if !es.is_finite() || es <= 0.0 {
        return f64::NAN;
    }
    let e = q * p_pa / (0.622 + 0.378 * q);
    (e / es * 100.0).clamp(0.0, 100.0)
}

/// Derive the physical variables available in one month of source data.
///
/// Variables whose inputs are absent are omitted. All source arrays must share
/// one shape.
pub fn derive_fields(raw: &RawMonth) -> Result<BTreeMap<Variable, Array2<f64>>> {
    let mut shapes = raw.iter().map(|(name, field)| (name, field.dim()));
    if let Some((first_name, first)) = shapes.next() {
        for (name, dim) in shapes {
            ensure!(dim == first, "variable {name} has shape {dim:?}, {first_name} has {first:?}");
        }
    }

    let mut out = BTreeMap::new();

    if let Some(t) = raw.get(TAIR) {
        out.insert(Variable::Tas, t.mapv(|k| k - KELVIN_OFFSET));
    }
    if let (Some(u), Some(v)) = (raw.get(WIND_E), raw.get(WIND_N)) {
        out.insert(Variable::Wind, Zip::from(u).and(v).map_collect(|&u, &v| u.hypot(v)));
    }
    if let Some(rain) = raw.get(RAINF) {
        // kg/m² accumulated over the month == mm/month
        out.insert(Variable::Prcp, rain.clone());
    }
    if let (Some(q), Some(t), Some(p)) = (raw.get(QAIR), raw.get(TAIR), raw.get(PSURF)) {
        out.insert(Variable::Rh, Zip::from(q).and(t).and(p).map_collect(|&q, &t, &p| relative_humidity(q, t, p)));
    }
    if let Some(sw) = raw.get(SWDOWN) {
        out.insert(Variable::Swrad, sw.clone());
    }
    if let Some(lw) = raw.get(LWDOWN) {
        out.insert(Variable::Lwrad, lw.clone());
    }
    if let Some(p) = raw.get(PSURF) {
        out.insert(Variable::Psurf, p.mapv(|pa| pa / 1000.0));
    }
    if let Some(cape) = raw.get(CAPE) {
        out.insert(Variable::Cape, cape.clone());
    }
    if let Some(pet) = raw.get(POTEVAP) {
        out.insert(Variable::Potevap, pet.clone());
    }

    Ok(out)
}
