//! Persistent key->blob storage for cached sheets.
//!
//! The coordinator only needs a synchronous string store that survives
//! restarts; `FileStore` backs it with one JSON file per key under the
//! user's cache directory. A read that fails for any reason is a cache
//! miss, never a hard error.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

/// Simple persistent key->string store.
///
/// `get` returning `None` covers both "absent" and "unreadable" - callers
/// treat either as a miss. `set` may fail (full disk, permissions); callers
/// treat that as a soft failure and keep running off memory and network.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// File-per-key store rooted in a cache directory.
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        // Keys are "sheet_<name>"; keep the filename tame for odd sheet names
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}.json", safe))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.blob_path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!(key, error = %e, "Failed to read cache blob, treating as miss");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.blob_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write cache blob {}", path.display()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.set("sheet_Events", r#"{"hello":"world"}"#).unwrap();
        assert_eq!(
            store.get("sheet_Events").as_deref(),
            Some(r#"{"hello":"world"}"#)
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.get("sheet_Nothing").is_none());
    }

    #[test]
    fn test_awkward_sheet_names_stay_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.set("sheet_Prize Draws/2024", "x").unwrap();
        assert_eq!(store.get("sheet_Prize Draws/2024").as_deref(), Some("x"));
        // Exactly one blob file, inside the cache dir
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.set("sheet_Courses", "old").unwrap();
        store.set("sheet_Courses", "new").unwrap();
        assert_eq!(store.get("sheet_Courses").as_deref(), Some("new"));
    }
}
