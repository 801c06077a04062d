use std::path::{Path, PathBuf};

use thiserror::Error;

/// Typed failure classes carried inside `anyhow::Error`.
///
/// Callers that need to tell a recoverable per-file failure from a fatal one
/// use `err.downcast_ref::<PanelError>()`. Coverage gaps are not errors: they
/// surface as NaN county values and null output cells.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A required input path, column, or setting is missing or malformed.
    /// Aborts the run before any year is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One monthly source file is unreadable or malformed.
    /// The affected (year, month) is skipped and processing continues.
    #[error("source file {}: {reason}", path.display())]
    SourceFile { path: PathBuf, reason: String },

    /// The on-disk weight cache was built for a different grid or boundary set.
    #[error(
        "weight cache at {} was built for a different {what} (cached {cached}, current {current}); rebuild the cache",
        path.display()
    )]
    CacheMismatch {
        path: PathBuf,
        what: &'static str,
        cached: String,
        current: String,
    },
}

impl PanelError {
    #[inline]
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    #[inline]
    pub(crate) fn source_file(path: &Path, reason: impl ToString) -> Self {
        Self::SourceFile { path: path.to_path_buf(), reason: reason.to_string() }
    }

    /// True for failures that only invalidate a single (year, month).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceFile { .. })
    }
}
