use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{common, field::NLDAS_FILE_PATTERN, grid::NLDAS_HALF_WIDTH, panel::DEFAULT_PREFIX, PanelError};

/// Name of the weight cache directory under the output directory.
pub const DEFAULT_CACHE_NAME: &str = "county_grid_weights";

/// Settings of one panel run, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Directory holding the monthly gridded files.
    pub input_dir: PathBuf,
    /// County boundary shapefile (`.shp`).
    pub boundary_path: PathBuf,
    pub output_dir: PathBuf,
    /// Attribute column holding the county identifier.
    pub id_field: String,
    pub start_year: i32,
    pub end_year: i32,
    /// Keep only the first N counties (smoke runs).
    pub county_limit: Option<usize>,
    /// Weight cache directory; defaults to `<output_dir>/county_grid_weights`.
    pub cache_dir: Option<PathBuf>,
    /// Half the grid spacing, in degrees.
    pub half_width: f64,
    pub output_prefix: String,
    /// Regex over monthly file names with `year` and `month` groups.
    pub file_pattern: String,
    /// Recompute weights even if a matching cache exists.
    pub rebuild_weights: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            boundary_path: PathBuf::new(),
            output_dir: PathBuf::from("."),
            id_field: "GEOID".to_string(),
            start_year: 1999,
            end_year: 2019,
            county_limit: None,
            cache_dir: None,
            half_width: NLDAS_HALF_WIDTH,
            output_prefix: DEFAULT_PREFIX.to_string(),
            file_pattern: NLDAS_FILE_PATTERN.to_string(),
            rebuild_weights: false,
        }
    }
}

impl PanelConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PanelError::config(format!("invalid configuration: {e}")).into())
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        common::require_file_exists(path)?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("[config] Failed to parse {}", path.display()))
    }

    #[inline]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| self.output_dir.join(DEFAULT_CACHE_NAME))
    }

    pub fn file_regex(&self) -> Result<Regex> {
        let regex = Regex::new(&self.file_pattern)
            .map_err(|e| PanelError::config(format!("invalid file pattern {:?}: {e}", self.file_pattern)))?;
        for group in ["year", "month"] {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(PanelError::config(format!("file pattern has no `{group}` capture group")).into());
            }
        }
        Ok(regex)
    }

    /// Check every setting and create the output directory.
    pub fn validate(&self) -> Result<()> {
        common::require_dir_exists(&self.input_dir)?;
        common::require_file_exists(&self.boundary_path)?;

        if self.start_year > self.end_year {
            return Err(PanelError::config(format!(
                "start year {} is after end year {}", self.start_year, self.end_year
            )).into());
        }
        if !(self.half_width.is_finite() && self.half_width > 0.0) {
            return Err(PanelError::config(format!("half width must be positive, got {}", self.half_width)).into());
        }
        if self.id_field.trim().is_empty() {
            return Err(PanelError::config("identifier field is empty").into());
        }
        if self.output_prefix.trim().is_empty() {
            return Err(PanelError::config("output prefix is empty").into());
        }
        if self.county_limit == Some(0) {
            return Err(PanelError::config("county limit must be at least 1").into());
        }
        self.file_regex()?;

        common::ensure_dir_exists(&self.output_dir)
    }
}
