use std::fmt;

/// How monthly values of a variable combine into an annual or seasonal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Intensive quantities: average over available months.
    Mean,
    /// Extensive (accumulated) quantities: total over available months.
    Sum,
}

impl Statistic {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
        }
    }

    /// Combine the non-NaN values; None if there are none.
    pub fn apply(self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let (count, total) = values.into_iter()
            .filter(|v| !v.is_nan())
            .fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
        match (self, count) {
            (_, 0) => None,
            (Self::Mean, n) => Some(total / n as f64),
            (Self::Sum, _) => Some(total),
        }
    }
}

/// Derived county-level climate variables, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// 2 m air temperature, °C.
    Tas,
    /// 10 m wind speed, m/s.
    Wind,
    /// Total precipitation, mm/month.
    Prcp,
    /// Relative humidity, %.
    Rh,
    /// Downward shortwave radiation, W/m².
    Swrad,
    /// Downward longwave radiation, W/m².
    Lwrad,
    /// Surface pressure, kPa.
    Psurf,
    /// Convective available potential energy, J/kg.
    Cape,
    /// Potential evaporation, mm/month.
    Potevap,
}

impl Variable {
    pub const ALL: [Variable; 9] = [
        Self::Tas, Self::Wind, Self::Prcp, Self::Rh, Self::Swrad,
        Self::Lwrad, Self::Psurf, Self::Cape, Self::Potevap,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tas => "tas",
            Self::Wind => "wind",
            Self::Prcp => "prcp",
            Self::Rh => "rh",
            Self::Swrad => "swrad",
            Self::Lwrad => "lwrad",
            Self::Psurf => "psurf",
            Self::Cape => "cape",
            Self::Potevap => "potevap",
        }
    }

    #[inline]
    pub fn statistic(self) -> Statistic {
        match self {
            Self::Prcp | Self::Potevap => Statistic::Sum,
            _ => Statistic::Mean,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
