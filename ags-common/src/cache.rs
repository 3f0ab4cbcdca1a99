// ags-common/src/cache.rs
// Handles caching of the raw catalog manifest between runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::error::{AgsError, Result};
use crate::Config;

/// Define how long cache entries are considered fresh
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60); // 24 hours

pub const MANIFEST_CACHE_FILE: &str = "manifest.json";
const MANIFEST_SOURCE_FILE: &str = "manifest.source";

/// Cache struct to manage cache operations
#[derive(Debug, Clone)]
pub struct Cache {
    cache_dir: PathBuf,
}

impl Cache {
    /// Create a new Cache using the config's cache_dir
    pub fn new(config: &Config) -> Result<Self> {
        Self::at(config.cache_dir())
    }

    pub fn at(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            cache_dir: dir.to_path_buf(),
        })
    }

    /// Gets the cache directory path
    pub fn get_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Stores raw string data in the cache
    pub fn store_raw(&self, filename: &str, data: &str) -> Result<()> {
        let path = self.cache_dir.join(filename);
        debug!("Saving raw data to cache file: {:?}", path);
        fs::write(&path, data)?;
        Ok(())
    }

    /// Loads raw string data from the cache
    pub fn load_raw(&self, filename: &str) -> Result<String> {
        let path = self.cache_dir.join(filename);
        debug!("Loading raw data from cache file: {:?}", path);

        if !path.exists() {
            return Err(AgsError::Cache(format!(
                "Cache file {filename} does not exist"
            )));
        }

        fs::read_to_string(&path).map_err(|e| AgsError::Cache(format!("IO error: {e}")))
    }

    /// Stores a fetched manifest together with the location it came from.
    pub fn store_manifest(&self, location: &str, raw: &str) -> Result<()> {
        self.store_raw(MANIFEST_CACHE_FILE, raw)?;
        self.store_raw(MANIFEST_SOURCE_FILE, location)
    }

    /// Loads the cached manifest, refusing a copy that was fetched from a different
    /// location than the one requested.
    pub fn load_manifest(&self, location: &str) -> Result<String> {
        let cached_source = self.load_raw(MANIFEST_SOURCE_FILE)?;
        if cached_source.trim() != location {
            return Err(AgsError::Cache(format!(
                "Cached manifest was fetched from '{}', not '{}'; run 'ags update'",
                cached_source.trim(),
                location
            )));
        }
        if !self.is_cache_valid(MANIFEST_CACHE_FILE)? {
            if let Some(age) = self.age(MANIFEST_CACHE_FILE)? {
                warn!(
                    "Cached manifest is {} old; run 'ags update' to refresh it",
                    humantime::format_duration(Duration::from_secs(age.as_secs()))
                );
            }
        }
        self.load_raw(MANIFEST_CACHE_FILE)
    }

    fn age(&self, filename: &str) -> Result<Option<Duration>> {
        let path = self.cache_dir.join(filename);
        if !path.exists() {
            return Ok(None);
        }
        let modified_time = fs::metadata(&path)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified_time)
            .map_err(|e| AgsError::Cache(format!("System time error: {e}")))?;
        Ok(Some(age))
    }

    /// Checks if a cache file exists and is valid (within TTL)
    pub fn is_cache_valid(&self, filename: &str) -> Result<bool> {
        Ok(self.age(filename)?.is_some_and(|age| age <= CACHE_TTL))
    }

    /// Clears a specific cache file
    pub fn clear_file(&self, filename: &str) -> Result<()> {
        let path = self.cache_dir.join(filename);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_for_same_location() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(&dir.path().join("nested")).unwrap();
        cache
            .store_manifest("https://example.com/m.json", "{\"categories\":{}}")
            .unwrap();
        assert!(cache.is_cache_valid(MANIFEST_CACHE_FILE).unwrap());
        let raw = cache.load_manifest("https://example.com/m.json").unwrap();
        assert_eq!(raw, "{\"categories\":{}}");
    }

    #[test]
    fn manifest_from_other_location_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path()).unwrap();
        cache.store_manifest("https://a.example/m.json", "{}").unwrap();
        let err = cache.load_manifest("https://b.example/m.json").unwrap_err();
        assert!(matches!(err, AgsError::Cache(_)));
    }

    #[test]
    fn missing_files_are_cache_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path()).unwrap();
        assert!(matches!(
            cache.load_raw("nope.json"),
            Err(AgsError::Cache(_))
        ));
        assert!(!cache.is_cache_valid("nope.json").unwrap());
        cache.clear_file("nope.json").unwrap();
    }

    #[test]
    fn empty_cache_has_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path()).unwrap();
        assert!(cache.load_manifest("https://a.example/m.json").is_err());
    }
}
