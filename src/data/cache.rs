use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use super::error::LoadError;
use super::loader::load_file;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Path-keyed dataset cache
// ---------------------------------------------------------------------------

/// Memoizes loaded datasets per path until explicitly invalidated.
///
/// Entries are handed out as `Arc<Dataset>`: every consumer shares the same
/// read-only table and derives its own copies from it. Failed loads are not
/// cached.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Dataset>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached dataset for `path`, loading it on first use.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = cache_key(path);
        if let Some(hit) = self.entries().get(&key) {
            log::debug!("dataset cache hit for {}", key.display());
            return Ok(Arc::clone(hit));
        }

        let dataset = Arc::new(load_file(path)?);
        log::info!("caching dataset for {}", key.display());
        self.entries().insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the entry for `path`. Returns whether one was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        let removed = self.entries().remove(&cache_key(path)).is_some();
        if removed {
            log::info!("invalidated cached dataset for {}", path.display());
        }
        removed
    }

    pub fn clear(&self) {
        self.entries().clear();
        log::info!("dataset cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Canonical path when resolvable, so `./a.csv` and `a.csv` share an entry.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Process-wide cache
// ---------------------------------------------------------------------------

static CACHE: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

/// Load `path` through the process-wide cache.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Dataset>, LoadError> {
    CACHE.get_or_load(path.as_ref())
}

/// Forget the cached dataset for `path` so the next [`load`] re-reads it.
pub fn invalidate(path: impl AsRef<Path>) -> bool {
    CACHE.invalidate(path.as_ref())
}

/// Empty the process-wide cache.
pub fn reset() {
    CACHE.clear();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn repeated_loads_share_one_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "p.csv", "Player,Gls\nA,1\n");
        let cache = DatasetCache::new();

        let first = cache.get_or_load(&path).unwrap();
        // content changes are not noticed until invalidation
        write_csv(&dir, "p.csv", "Player,Gls\nA,1\nB,2\n");
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        assert!(cache.invalidate(&path));
        let third = cache.get_or_load(&path).unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let cache = DatasetCache::new();
        assert!(cache.get_or_load(&path).is_err());
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&path));
    }

    #[test]
    fn clear_empties_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(&dir, "a.csv", "Player\nA\n");
        let b = write_csv(&dir, "b.csv", "Player\nB\n");
        let cache = DatasetCache::new();
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
