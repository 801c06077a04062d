use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::PanelError;

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PanelError::config(format!("path exists but is not a directory: {}", path.display())).into());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error unless the directory already exists.
pub(crate) fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PanelError::config(format!("directory does not exist: {}", path.display())).into());
    }
    if !path.is_dir() {
        return Err(PanelError::config(format!("path exists but is not a directory: {}", path.display())).into());
    }
    Ok(())
}

/// Error unless the regular file already exists.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PanelError::config(format!("file does not exist: {}", path.display())).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        // Idempotent on an existing directory
        ensure_dir_exists(&nested).unwrap();
    }

    #[test]
    fn missing_paths_are_configuration_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        for err in [require_dir_exists(&missing).unwrap_err(), require_file_exists(&missing).unwrap_err()] {
            assert!(matches!(err.downcast_ref::<PanelError>(), Some(PanelError::Configuration(_))));
        }
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_dir_exists(tmp.path()).is_err());
        assert!(require_dir_exists(tmp.path()).is_err());
        assert!(require_file_exists(tmp.path()).is_ok());
    }
}
