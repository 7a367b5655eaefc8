//! Session cache of layers already exported to SAGA grids.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Maps a source layer reference to the grid it was exported to.
///
/// An entry is only trusted while its file exists: `lookup` evicts entries
/// whose export has been deleted so the next run exports again.
#[derive(Debug, Default)]
pub struct ExportCache {
    entries: HashMap<String, PathBuf>,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exported path for `source`, if it is cached and still on disk.
    pub fn lookup(&mut self, source: &str) -> Option<PathBuf> {
        let path = self.entries.get(source)?;
        if path.exists() {
            debug!(source, path = %path.display(), "export cache hit");
            return Some(path.clone());
        }
        debug!(source, path = %path.display(), "evicting stale export");
        self.entries.remove(source);
        None
    }

    /// Record that `source` was exported to `path`.
    pub fn store(&mut self, source: impl Into<String>, path: impl AsRef<Path>) {
        self.entries.insert(source.into(), path.as_ref().to_path_buf());
    }

    /// Number of cached exports (stale ones included until looked up).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all cached exports.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_hit_while_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("dem.sgrd");
        std::fs::write(&grid, "").unwrap();

        let mut cache = ExportCache::new();
        cache.store("/data/dem.tif", &grid);
        assert_eq!(cache.lookup("/data/dem.tif"), Some(grid));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("dem.sgrd");
        std::fs::write(&grid, "").unwrap();

        let mut cache = ExportCache::new();
        cache.store("/data/dem.tif", &grid);
        std::fs::remove_file(&grid).unwrap();

        assert!(cache.lookup("/data/dem.tif").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_miss_on_unknown_source() {
        let mut cache = ExportCache::new();
        assert!(cache.lookup("nothing").is_none());
        cache.store("a", "/nowhere/a.sgrd");
        cache.clear();
        assert!(cache.is_empty());
    }
}
