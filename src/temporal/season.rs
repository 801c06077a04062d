use std::fmt;

/// Meteorological season. DJF takes December from the preceding year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season { Djf, Mam, Jja, Son }

impl Season {
    pub const ALL: [Season; 4] = [Self::Djf, Self::Mam, Self::Jja, Self::Son];

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Djf => "DJF",
            Self::Mam => "MAM",
            Self::Jja => "JJA",
            Self::Son => "SON",
        }
    }

    /// Calendar months of the season, December first for DJF.
    #[inline]
    pub fn months(self) -> [u32; 3] {
        match self {
            Self::Djf => [12, 1, 2],
            Self::Mam => [3, 4, 5],
            Self::Jja => [6, 7, 8],
            Self::Son => [9, 10, 11],
        }
    }

    pub fn of_month(month: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|season| season.months().contains(&month))
    }
}

/// Aggregation window of an output statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Annual,
    Season(Season),
}

impl Period {
    pub const ALL: [Period; 5] = [
        Self::Annual,
        Self::Season(Season::Djf),
        Self::Season(Season::Mam),
        Self::Season(Season::Jja),
        Self::Season(Season::Son),
    ];

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Season(season) => season.label(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_month_has_exactly_one_season() {
        for month in 1..=12 {
            let count = Season::ALL.iter().filter(|s| s.months().contains(&month)).count();
            assert_eq!(count, 1, "month {month}");
        }
        assert_eq!(Season::of_month(12), Some(Season::Djf));
        assert_eq!(Season::of_month(13), None);
    }
}
