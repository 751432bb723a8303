//! Persisted permission decisions.
//!
//! Stores take `&self` and lock internally: reads run concurrently, writes are
//! serialised, and the last write wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::permission::PermissionDecision;
use crate::ConfigError;

/// Key under which the "may the app connect to Google?" decision is stored.
///
/// Both the short-link lookup and the map page fetch consult it.
pub const CONNECTION_PERMISSION_KEY: &str = "connection_permission";

/// Read/write access to persisted permission decisions.
pub trait PreferencesStore {
    /// Returns the stored decision, or [`PermissionDecision::Ask`] if unset.
    fn get(&self, key: &str) -> PermissionDecision;

    fn set(&self, key: &str, value: PermissionDecision);
}

impl<T: PreferencesStore + ?Sized> PreferencesStore for &T {
    fn get(&self, key: &str) -> PermissionDecision {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: PermissionDecision) {
        (**self).set(key, value);
    }
}

impl<T: PreferencesStore + ?Sized> PreferencesStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> PermissionDecision {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: PermissionDecision) {
        (**self).set(key, value);
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<BTreeMap<String, PermissionDecision>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one decision.
    #[must_use]
    pub fn with_value(key: &str, value: PermissionDecision) -> Self {
        let store = Self::default();
        store.set(key, value);
        store
    }
}

impl PreferencesStore for MemoryPreferences {
    fn get(&self, key: &str) -> PermissionDecision {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    fn set(&self, key: &str, value: PermissionDecision) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }
}

/// Store backed by a flat `key: decision` YAML file.
///
/// The file is read once on [`YamlPreferences::open`] and rewritten on every
/// [`PreferencesStore::set`].
#[derive(Debug)]
pub struct YamlPreferences {
    path: PathBuf,
    values: RwLock<BTreeMap<String, PermissionDecision>>,
}

impl YamlPreferences {
    /// Opens the store at `path`. A missing file is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PreferencesFileIo`] if the file exists but cannot
    /// be read, or [`ConfigError::PreferencesFileParse`] if it is not a valid
    /// decision map.
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let values = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_yaml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ConfigError::PreferencesFileIo {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, PermissionDecision>) {
        let yaml = match serde_yaml::to_string(values) {
            Ok(yaml) => yaml,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize preferences");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, yaml) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "could not write preferences file; keeping value in memory only"
            );
        }
    }
}

impl PreferencesStore for YamlPreferences {
    fn get(&self, key: &str) -> PermissionDecision {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    fn set(&self, key: &str, value: PermissionDecision) {
        // The write guard is held across the file write so that concurrent
        // writers cannot interleave their snapshots.
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value);
        self.persist(&values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_defaults_to_ask() {
        let store = MemoryPreferences::new();
        assert_eq!(
            store.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Ask
        );
    }

    #[test]
    fn memory_store_last_write_wins() {
        let store = MemoryPreferences::new();
        store.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Always);
        store.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Never);
        assert_eq!(
            store.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Never
        );
    }

    #[test]
    fn memory_store_concurrent_writers_leave_a_valid_value() {
        let store = std::sync::Arc::new(MemoryPreferences::new());
        let handles: Vec<_> = [PermissionDecision::Always, PermissionDecision::Never]
            .into_iter()
            .map(|value| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(CONNECTION_PERMISSION_KEY, value);
                        let _ = store.get(CONNECTION_PERMISSION_KEY);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_ne!(
            store.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Ask
        );
    }

    #[test]
    fn yaml_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlPreferences::open(&dir.path().join("prefs.yaml")).unwrap();
        assert_eq!(
            store.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Ask
        );
    }

    #[test]
    fn yaml_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.yaml");

        let store = YamlPreferences::open(&path).unwrap();
        store.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Always);
        drop(store);

        let reopened = YamlPreferences::open(&path).unwrap();
        assert_eq!(
            reopened.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Always
        );
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("connection_permission: always"), "got: {raw}");
    }

    #[test]
    fn yaml_store_rejects_unknown_decision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.yaml");
        std::fs::write(&path, "connection_permission: sometimes\n").unwrap();

        let result = YamlPreferences::open(&path);
        assert!(
            matches!(result, Err(ConfigError::PreferencesFileParse(_))),
            "expected PreferencesFileParse, got: {result:?}"
        );
    }

    #[test]
    fn yaml_store_unwritable_path_keeps_value_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("prefs.yaml");
        let store = YamlPreferences::open(&path).unwrap();

        store.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Never);
        assert_eq!(
            store.get(CONNECTION_PERMISSION_KEY),
            PermissionDecision::Never
        );
        assert!(!path.exists());
    }
}
