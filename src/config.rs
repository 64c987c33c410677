//! Configuration management

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Maximum number of remembered addresses
pub const MAX_RECENT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub recent_printers: Vec<String>,
    #[serde(default)]
    pub last_used_printer: String,
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
}

fn default_true() -> bool { true }

impl Default for SourceRecord {
    fn default() -> Self {
        Self {
            recent_printers: Vec::new(),
            last_used_printer: String::new(),
            include_timestamp: true,
        }
    }
}

impl SourceRecord {
    /// Drop blank and repeated entries, keep the first MAX_RECENT.
    fn normalized(mut self) -> Self {
        let mut seen: Vec<String> = Vec::with_capacity(MAX_RECENT);
        for address in self.recent_printers.drain(..) {
            let address = address.trim().to_string();
            if address.is_empty() || seen.contains(&address) {
                continue;
            }
            seen.push(address);
        }
        seen.truncate(MAX_RECENT);
        self.recent_printers = seen;
        self.last_used_printer = self.last_used_printer.trim().to_string();
        self
    }
}

/// Recently used source addresses plus the snapshot timestamp preference,
/// persisted after every change.
#[derive(Debug)]
pub struct RecentSourceStore {
    path: PathBuf,
    record: SourceRecord,
}

impl RecentSourceStore {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("streamy");
        path.push("streamy_config.json");
        path
    }

    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = if path.exists() {
            match read_record(&path) {
                Ok(record) => record.normalized(),
                Err(e) => {
                    warn!("Error loading config {}: {}", path.display(), e);
                    SourceRecord::default()
                }
            }
        } else {
            debug!("No config at {}, using defaults", path.display());
            SourceRecord::default()
        };

        Self { path, record }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &SourceRecord {
        &self.record
    }

    /// Move `address` to the front of the recent list and mark it last used.
    pub fn add_address(&mut self, address: &str) {
        let address = address.trim();
        if address.is_empty() {
            return;
        }

        self.record.recent_printers.retain(|a| a != address);
        self.record.recent_printers.insert(0, address.to_string());
        self.record.recent_printers.truncate(MAX_RECENT);
        self.record.last_used_printer = address.to_string();

        self.save();
    }

    pub fn set_include_timestamp(&mut self, value: bool) {
        self.record.include_timestamp = value;
        self.save();
    }

    pub fn recent_addresses(&self) -> &[String] {
        &self.record.recent_printers
    }

    pub fn last_used_address(&self) -> &str {
        &self.record.last_used_printer
    }

    pub fn include_timestamp(&self) -> bool {
        self.record.include_timestamp
    }

    /// Best-effort persist; failures are logged only.
    pub fn save(&self) {
        if let Err(e) = write_record(&self.path, &self.record) {
            warn!("Error saving config {}: {}", self.path.display(), e);
        }
    }
}

fn read_record(path: &Path) -> Result<SourceRecord, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_record(path: &Path, record: &SourceRecord) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(record)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RecentSourceStore {
        RecentSourceStore::load_from(dir.path().join("streamy_config.json"))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.recent_addresses().is_empty());
        assert_eq!(store.last_used_address(), "");
        assert!(store.include_timestamp());
    }

    #[test]
    fn test_add_moves_to_front_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_address("10.0.0.5");
        store.add_address("10.0.0.6");
        store.add_address("10.0.0.5");
        assert_eq!(store.recent_addresses(), ["10.0.0.5", "10.0.0.6"]);
        assert_eq!(store.last_used_address(), "10.0.0.5");
    }

    #[test]
    fn test_sixth_address_drops_oldest() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        for i in 1..=6 {
            store.add_address(&format!("10.0.0.{}", i));
        }
        assert_eq!(store.recent_addresses().len(), MAX_RECENT);
        assert_eq!(store.recent_addresses()[0], "10.0.0.6");
        assert!(!store.recent_addresses().iter().any(|a| a == "10.0.0.1"));
    }

    #[test]
    fn test_empty_address_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_address("");
        store.add_address("   ");
        assert!(store.recent_addresses().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_address("cam.local");
        store.add_address("192.168.1.20:8554");
        store.set_include_timestamp(false);

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.record(), store.record());
        assert!(!reloaded.include_timestamp());
    }

    #[test]
    fn test_partial_document_is_backfilled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("streamy_config.json");
        fs::write(&path, r#"{"recent_printers": ["a", "b"], "theme": "dark"}"#).unwrap();

        let store = RecentSourceStore::load_from(&path);
        assert_eq!(store.recent_addresses(), ["a", "b"]);
        assert_eq!(store.last_used_address(), "");
        assert!(store.include_timestamp());
    }

    #[test]
    fn test_malformed_document_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("streamy_config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = RecentSourceStore::load_from(&path);
        assert_eq!(store.record(), &SourceRecord::default());
    }

    #[test]
    fn test_loaded_list_is_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("streamy_config.json");
        fs::write(
            &path,
            r#"{"recent_printers": ["a", "", "a", "b", "c", "d", "e", "f"], "last_used_printer": "a"}"#,
        )
        .unwrap();

        let store = RecentSourceStore::load_from(&path);
        assert_eq!(store.recent_addresses(), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("streamy_config.json");
        fs::create_dir(&path).unwrap();

        let mut store = RecentSourceStore::load_from(&path);
        store.add_address("10.0.0.5");
        assert_eq!(store.last_used_address(), "10.0.0.5");
    }
}
