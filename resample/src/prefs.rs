//! Preference storage consulted when choosing a quality preset.
//!
//! A [`Prefs`] is a string-keyed integer store. The resampler only reads
//! from it, once, at construction. Two implementations are provided:
//!
//! - [`MemoryPrefs`]: thread-safe in-memory map, for tests and embedding.
//! - [`FilePrefs`]: flat YAML file, stored in ~/.giztoy/resample/config.yaml
//!   by default.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".giztoy";
/// Application directory under the base directory.
pub const DEFAULT_APP_NAME: &str = "resample";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Read-only integer preference lookup.
pub trait Prefs: Send + Sync {
    /// Returns the value stored under `key`, or `default` if there is none.
    fn read_int(&self, key: &str, default: i64) -> i64;
}

/// Preferences with nothing stored; every lookup yields its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefs;

impl Prefs for NoPrefs {
    fn read_int(&self, _key: &str, default: i64) -> i64 {
        default
    }
}

/// An in-memory preference store backed by a HashMap.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    data: RwLock<HashMap<String, i64>>,
}

impl MemoryPrefs {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn write_int(&self, key: &str, value: i64) {
        let mut data = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.insert(key.to_string(), value);
    }

    /// Remove `key` from the store.
    pub fn delete(&self, key: &str) {
        let mut data = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.remove(key);
    }
}

impl Prefs for MemoryPrefs {
    fn read_int(&self, key: &str, default: i64) -> i64 {
        let data = match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.get(key).copied().unwrap_or(default)
    }
}

/// Preferences persisted as a flat `key: integer` YAML mapping.
///
/// ```yaml
/// /Quality/LibsoxrSampleRateConverter: 1
/// /Quality/LibsoxrHQSampleRateConverter: 3
/// ```
#[derive(Debug, Clone)]
pub struct FilePrefs {
    values: BTreeMap<String, i64>,
    path: PathBuf,
}

impl FilePrefs {
    /// Gets the default config directory (~/.giztoy/resample).
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_APP_NAME))
    }

    /// Gets the default config file path (~/.giztoy/resample/config.yaml).
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Loads preferences from `custom_path`, or from the default path.
    ///
    /// A missing file is not an error; it yields an empty store that will be
    /// created on [`save`](Self::save).
    pub fn load(custom_path: Option<&Path>) -> Result<Self> {
        let path = match custom_path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path().ok_or(Error::NoConfigDir)?,
        };

        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = values.len(), "loaded resample prefs");
        Ok(Self { values, path })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets `key` to `value` in memory. Call [`save`](Self::save) to persist.
    pub fn write_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    /// Writes the preferences to disk, creating the parent directory.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Prefs for FilePrefs {
    fn read_int(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prefs_returns_default() {
        assert_eq!(NoPrefs.read_int("anything", 7), 7);
    }

    #[test]
    fn test_memory_prefs_read_write() {
        let prefs = MemoryPrefs::new();
        assert_eq!(prefs.read_int("k", 1), 1);

        prefs.write_int("k", 3);
        assert_eq!(prefs.read_int("k", 1), 3);

        prefs.write_int("k", 0);
        assert_eq!(prefs.read_int("k", 1), 0);

        prefs.delete("k");
        assert_eq!(prefs.read_int("k", 1), 1);
    }

    #[test]
    fn test_file_prefs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let prefs = FilePrefs::load(Some(&path)).unwrap();
        assert_eq!(prefs.path(), path.as_path());
        assert_eq!(prefs.read_int("/Quality/LibsoxrSampleRateConverter", 1), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_prefs_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut prefs = FilePrefs::load(Some(&path)).unwrap();
        prefs.write_int("/Quality/LibsoxrHQSampleRateConverter", 2);
        prefs.save().unwrap();
        assert!(path.exists());

        let reloaded = FilePrefs::load(Some(&path)).unwrap();
        assert_eq!(reloaded.read_int("/Quality/LibsoxrHQSampleRateConverter", 3), 2);
    }

    #[test]
    fn test_file_prefs_parse_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "/Quality/LibsoxrSampleRateConverter: 0\nother: 42\n").unwrap();

        let prefs = FilePrefs::load(Some(&path)).unwrap();
        assert_eq!(prefs.read_int("/Quality/LibsoxrSampleRateConverter", 1), 0);
        assert_eq!(prefs.read_int("other", 0), 42);
    }

    #[test]
    fn test_file_prefs_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        let prefs = FilePrefs::load(Some(&path)).unwrap();
        assert_eq!(prefs.read_int("missing", 5), 5);
    }

    #[test]
    fn test_file_prefs_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "key: not-a-number\n").unwrap();

        let err = FilePrefs::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = FilePrefs::default_config_path() {
            assert!(path.ends_with("resample/config.yaml"));
        }
    }
}
