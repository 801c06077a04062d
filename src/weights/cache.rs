use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use anyhow::{ensure, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    boundary::Counties,
    common::{self, sha256_bytes},
    grid::GridGeometry,
    io::csr,
    PanelError,
};

use super::WeightMatrix;

const MANIFEST_FILE: &str = "manifest.json";
const WEIGHTS_FILE: &str = "weights.csr";
const GRID_FILE: &str = "grid.idx";
const CACHE_VERSION: &str = "1";

#[derive(Debug, Serialize, Deserialize)]
struct FileHash {
    sha256: String,
}

/// Describes what a cached weight matrix was built from.
#[derive(Debug, Serialize, Deserialize)]
struct CacheManifest {
    version: String,
    grid_fingerprint: String,
    boundary_fingerprint: String,
    grid_shape: [usize; 2],
    counties: usize,
    cells: usize,
    nnz: usize,
    files: BTreeMap<String, FileHash>,
}

/// On-disk cache directory for a weight matrix and its grid index.
///
/// Entries are keyed by content fingerprints of the grid axes and of the
/// county boundaries; loading against different inputs fails with
/// `PanelError::CacheMismatch` instead of silently reusing stale weights.
#[derive(Debug, Clone)]
pub struct WeightCache {
    dir: PathBuf,
}

impl WeightCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    /// True if a manifest is present (the entry may still be unreadable).
    #[inline] pub fn exists(&self) -> bool { self.dir.join(MANIFEST_FILE).is_file() }

    /// Persist `weights` with fingerprints of the inputs it was built from.
    pub fn save(&self, weights: &WeightMatrix, counties: &Counties, grid: &GridGeometry) -> Result<()> {
        common::ensure_dir_exists(&self.dir)?;

        let mut files = BTreeMap::new();
        for (name, bytes) in [
            (WEIGHTS_FILE, csr::write_weighted_csr_bytes(weights.csr())?),
            (GRID_FILE, csr::write_grid_index_bytes(weights.grid())?),
        ] {
            let path = self.dir.join(name);
            fs::write(&path, &bytes)
                .with_context(|| format!("[weights::cache] Failed to write {}", path.display()))?;
            files.insert(name.to_string(), FileHash { sha256: sha256_bytes(&bytes) });
        }

        let (rows, cols) = weights.grid().shape();
        let manifest = CacheManifest {
            version: CACHE_VERSION.into(),
            grid_fingerprint: grid.fingerprint().into(),
            boundary_fingerprint: counties.fingerprint().into(),
            grid_shape: [rows, cols],
            counties: weights.num_counties(),
            cells: weights.num_cells(),
            nnz: weights.nnz(),
            files,
        };

        // Manifest last: a partially written entry has no manifest and is rebuilt.
        let path = self.dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_vec_pretty(&manifest)?)
            .with_context(|| format!("[weights::cache] Failed to write {}", path.display()))?;

        info!("[weights::cache] saved weight matrix to {}", self.dir.display());
        Ok(())
    }

    /// Load the cached matrix, verifying it was built for these inputs.
    pub fn load(&self, counties: &Counties, grid: &GridGeometry) -> Result<WeightMatrix> {
        let path = self.dir.join(MANIFEST_FILE);
        let manifest: CacheManifest = serde_json::from_slice(
            &fs::read(&path).with_context(|| format!("[weights::cache] Failed to read {}", path.display()))?
        ).with_context(|| format!("[weights::cache] Failed to parse {}", path.display()))?;
        ensure!(manifest.version == CACHE_VERSION, "[weights::cache] unsupported cache version {}", manifest.version);

        if manifest.grid_fingerprint != grid.fingerprint() {
            return Err(self.mismatch("grid", &manifest.grid_fingerprint, grid.fingerprint()).into());
        }
        if manifest.boundary_fingerprint != counties.fingerprint() {
            return Err(self.mismatch("county boundary set", &manifest.boundary_fingerprint, counties.fingerprint()).into());
        }

        let weights = csr::read_weighted_csr_bytes(&self.read_verified(&manifest, WEIGHTS_FILE)?)?;
        let index = csr::read_grid_index_bytes(&self.read_verified(&manifest, GRID_FILE)?)?;
        ensure!(index == *grid.index(), "[weights::cache] cached grid index differs from the current grid");

        let matrix = WeightMatrix::from_csr(index, weights)?.stamped(grid);
        ensure!(
            matrix.num_counties() == counties.len(),
            "[weights::cache] cached matrix has {} rows for {} counties", matrix.num_counties(), counties.len()
        );

        info!("[weights::cache] loaded {} x {} weight matrix ({} non-zero)", matrix.num_counties(), matrix.num_cells(), matrix.nnz());
        Ok(matrix)
    }

    /// Load the cache if present, otherwise build and save it.
    ///
    /// `rebuild` forces recomputation. A corrupt entry is rebuilt with a
    /// warning; a fingerprint mismatch is returned as an error.
    pub fn load_or_build(&self, counties: &Counties, grid: &GridGeometry, rebuild: bool) -> Result<WeightMatrix> {
        if !rebuild && self.exists() {
            match self.load(counties, grid) {
                Ok(weights) => return Ok(weights),
                Err(err) if matches!(err.downcast_ref::<PanelError>(), Some(PanelError::CacheMismatch { .. })) => {
                    return Err(err);
                }
                Err(err) => warn!("[weights::cache] unreadable cache at {} ({err:#}); rebuilding", self.dir.display()),
            }
        }

        let weights = WeightMatrix::build(counties, grid)?;
        self.save(&weights, counties, grid)?;
        Ok(weights)
    }

    fn read_verified(&self, manifest: &CacheManifest, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(name);
        let bytes = fs::read(&path)
            .with_context(|| format!("[weights::cache] Failed to read {}", path.display()))?;
        let expected = manifest.files.get(name)
            .with_context(|| format!("[weights::cache] manifest has no entry for {name}"))?;
        ensure!(sha256_bytes(&bytes) == expected.sha256, "[weights::cache] checksum mismatch for {}", path.display());
        Ok(bytes)
    }

    fn mismatch(&self, what: &'static str, cached: &str, current: &str) -> PanelError {
        PanelError::CacheMismatch {
            path: self.dir.clone(),
            what,
            cached: cached.chars().take(12).collect(),
            current: current.chars().take(12).collect(),
        }
    }
}
