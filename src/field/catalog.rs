use std::{collections::BTreeMap, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::{common, PanelError};

/// File-name pattern of NLDAS-2 monthly forcing files (`NLDAS_FORA0125_M.A199901.020.nc`).
pub const NLDAS_FILE_PATTERN: &str = r"^NLDAS_FORA0125_M\.A(?P<year>\d{4})(?P<month>\d{2})\.020\.nc";

/// Monthly gridded files found in an input directory, keyed by (year, month).
#[derive(Debug, Clone, Default)]
pub struct MonthlyCatalog {
    files: BTreeMap<(i32, u32), PathBuf>,
}

impl MonthlyCatalog {
    /// Scan `dir` (non-recursively) for files whose names match `pattern`.
    ///
    /// The pattern must define `year` and `month` capture groups. When several
    /// files match the same month, the first by file name wins.
    pub fn scan(dir: &Path, pattern: &Regex) -> Result<Self> {
        common::require_dir_exists(dir)?;
        for group in ["year", "month"] {
            if !pattern.capture_names().any(|name| name == Some(group)) {
                return Err(PanelError::config(format!("file pattern lacks a `{group}` capture group: {pattern}")).into());
            }
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            if !entry.file_type().is_file() { continue }

            let name = entry.file_name().to_string_lossy();
            let Some(caps) = pattern.captures(&name) else { continue };
            let (Ok(year), Ok(month)) = (caps["year"].parse::<i32>(), caps["month"].parse::<u32>()) else { continue };
            if !(1..=12).contains(&month) {
                debug!("[catalog] ignoring {name}: month {month} out of range");
                continue;
            }
            files.entry((year, month)).or_insert_with(|| entry.path().to_path_buf());
        }

        info!("[catalog] found {} monthly files in {}", files.len(), dir.display());
        Ok(Self { files })
    }

    /// Build a catalog from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = ((i32, u32), PathBuf)>) -> Self {
        Self { files: entries.into_iter().collect() }
    }

    #[inline] pub fn len(&self) -> usize { self.files.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.files.is_empty() }

    #[inline]
    pub fn path(&self, year: i32, month: u32) -> Option<&Path> {
        self.files.get(&(year, month)).map(PathBuf::as_path)
    }

    /// First file within `start - 1 .. end`, used as the grid geometry sample.
    pub fn sample(&self, start: i32, end: i32) -> Option<&Path> {
        self.files.range((start - 1, 12)..=(end, 12)).next().map(|(_, path)| path.as_path())
    }

    /// Log every missing month of `start..=end` and the bootstrap December.
    /// Returns the number of missing months (bootstrap excluded).
    pub fn report_gaps(&self, start: i32, end: i32) -> usize {
        if self.path(start - 1, 12).is_none() {
            warn!("[catalog] no {:04}-12 file; DJF of {start} will lack December", start - 1);
        }
        let mut missing = 0;
        for year in start..=end {
            for month in 1..=12 {
                if self.path(year, month).is_none() {
                    warn!("[catalog] no file for {year:04}-{month:02}");
                    missing += 1;
                }
            }
        }
        missing
    }
}
