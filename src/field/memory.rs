use std::collections::BTreeMap;

use anyhow::Result;

use crate::{grid::GridAxes, PanelError};

use super::{MonthlySource, RawMonth};

#[derive(Debug, Clone)]
enum Entry {
    Ready(RawMonth),
    Unreadable(String),
}

/// A `MonthlySource` held entirely in memory.
///
/// Used to feed the engine from readers other than NetCDF and to build
/// synthetic grids.
#[derive(Debug, Clone)]
pub struct MemorySource {
    axes: GridAxes,
    months: BTreeMap<(i32, u32), Entry>,
}

impl MemorySource {
    pub fn new(axes: GridAxes) -> Self {
        Self { axes, months: BTreeMap::new() }
    }

    pub fn insert(&mut self, year: i32, month: u32, raw: RawMonth) -> &mut Self {
        self.months.insert((year, month), Entry::Ready(raw));
        self
    }

    /// Register a month whose file exists but cannot be read.
    pub fn insert_unreadable(&mut self, year: i32, month: u32, reason: &str) -> &mut Self {
        self.months.insert((year, month), Entry::Unreadable(reason.to_string()));
        self
    }

    pub fn remove(&mut self, year: i32, month: u32) -> &mut Self {
        self.months.remove(&(year, month));
        self
    }
}

impl MonthlySource for MemorySource {
    fn grid_axes(&self) -> Result<GridAxes> {
        Ok(self.axes.clone())
    }

    fn read_month(&self, year: i32, month: u32) -> Result<Option<RawMonth>> {
        match self.months.get(&(year, month)) {
            None => Ok(None),
            Some(Entry::Ready(raw)) => Ok(Some(raw.clone())),
            Some(Entry::Unreadable(reason)) => {
                let path = format!("memory://{year:04}-{month:02}");
                Err(PanelError::source_file(path.as_ref(), reason).into())
            }
        }
    }
}
