use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::parsing::{parse_multi_tle, parse_tle_block};
use super::{SourceError, TleLines, TleSource};

/// Element sets loaded from a folder of `.tle` / `.txt` files.
pub struct TleCatalog {
    tle_dir: PathBuf,
    satellites: HashMap<u32, TleLines>,
}

impl TleCatalog {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            satellites: HashMap::new(),
        }
    }

    /// Creates the catalog and loads it immediately.
    pub fn open(tle_dir: PathBuf) -> Result<Self, SourceError> {
        let mut catalog = Self::new(tle_dir);
        catalog.load_all()?;
        Ok(catalog)
    }

    /// Load all TLE files from the directory. Files are read in name order and
    /// later files win on duplicate catalog numbers.
    pub fn load_all(&mut self) -> Result<(), SourceError> {
        if !self.tle_dir.is_dir() {
            return Err(SourceError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .map(|ext| ext == "tle" || ext == "txt")
                .unwrap_or(false);
            if path.is_file() && is_tle {
                paths.push(path);
            }
        }
        paths.sort();

        let mut satellites = HashMap::new();
        for path in paths {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Failed to read TLE file {}: {}", path.display(), e);
                    continue;
                }
            };
            for tle in parse_multi_tle(&content) {
                match tle.catalog_id() {
                    Some(id) => {
                        satellites.insert(id, tle);
                    }
                    None => log::warn!(
                        "Skipping element set without numeric catalog number in {}",
                        path.display()
                    ),
                }
            }
        }

        self.satellites = satellites;
        log::info!(
            "Loaded {} element sets from {}",
            self.satellites.len(),
            self.tle_dir.display()
        );
        Ok(())
    }

    pub fn folder(&self) -> &Path {
        &self.tle_dir
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}

impl TleSource for TleCatalog {
    fn fetch(&self, catalog_id: u32) -> Result<TleLines, SourceError> {
        self.satellites
            .get(&catalog_id)
            .cloned()
            .ok_or(SourceError::NotFound(catalog_id))
    }
}

// The guarded value is only ever replaced whole (see `refresh`), so a
// poisoned lock still holds a consistent catalog.
impl<S: TleSource> TleSource for RwLock<S> {
    fn fetch(&self, catalog_id: u32) -> Result<TleLines, SourceError> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .fetch(catalog_id)
    }
}

/// Re-reads the catalog folder and swaps the result in. Readers keep seeing
/// the previous contents until loading has finished; on error nothing changes.
pub fn refresh(catalog: &RwLock<TleCatalog>) -> Result<usize, SourceError> {
    let folder = catalog
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .folder()
        .to_path_buf();
    let fresh = TleCatalog::open(folder)?;
    let count = fresh.len();
    *catalog.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    Ok(count)
}

/// Reads a file holding exactly one element set.
pub fn read_tle_file(path: &Path) -> Result<TleLines, SourceError> {
    let content = fs::read_to_string(path)?;
    parse_tle_block(&content)
}
