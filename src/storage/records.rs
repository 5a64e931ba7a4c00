//! Read-only access to the per-identifier JSON record tree
//!
//! Records live at `<base>/<year>/<CVE-ID>.json`, where the year is the
//! second dash-separated segment of the identifier.

use crate::error::{Result, VulnError};
use crate::model::{RawRecord, VulnerabilityRecord};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem-backed record store
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_path: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at the given directory
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Root directory of the record tree
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve the file path holding the record for `id`
    pub fn record_path(&self, id: &str) -> Result<PathBuf> {
        let partition = partition_key(id)?;
        Ok(self.base_path.join(partition).join(format!("{}.json", id)))
    }

    /// Load and default the record for `id`
    pub fn load(&self, id: &str) -> Result<VulnerabilityRecord> {
        let path = self.record_path(id)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VulnError::NotFound {
                    id: id.to_string(),
                    path,
                });
            }
            Err(e) => {
                return Err(VulnError::Io {
                    source: e,
                    context: format!("Failed to read record: {}", path.display()),
                });
            }
        };

        let corrupt = |e: serde_json::Error| VulnError::CorruptRecord {
            id: id.to_string(),
            path: path.clone(),
            source: e,
        };

        // Structs also deserialize from JSON arrays, so the shape is checked first
        let value: Value = serde_json::from_slice(&bytes).map_err(corrupt)?;
        if !value.is_object() {
            return Err(corrupt(serde::de::Error::custom("expected a JSON object")));
        }
        let raw: RawRecord = serde_json::from_value(value).map_err(corrupt)?;

        Ok(VulnerabilityRecord::from_raw(raw, id))
    }
}

/// Year segment of an identifier such as `CVE-2023-0001`
pub fn partition_key(id: &str) -> Result<&str> {
    // Identifiers become file names, so anything that could leave the tree is rejected
    if id.contains(['/', '\\', '\0']) || id.contains("..") {
        return Err(VulnError::InvalidIdentifierFormat { id: id.to_string() });
    }

    let segments: Vec<&str> = id.split('-').collect();
    if segments.len() < 3 {
        return Err(VulnError::InvalidIdentifierFormat { id: id.to_string() });
    }

    Ok(segments[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_record(dir: &Path, year: &str, id: &str, content: &str) {
        let year_dir = dir.join(year);
        fs::create_dir_all(&year_dir).unwrap();
        fs::write(year_dir.join(format!("{}.json", id)), content).unwrap();
    }

    #[test]
    fn test_partition_key() {
        assert_eq!(partition_key("CVE-2023-0001").unwrap(), "2023");
        assert_eq!(partition_key("CVE-1999-0001-extra").unwrap(), "1999");
        assert!(matches!(
            partition_key("CVE2023"),
            Err(VulnError::InvalidIdentifierFormat { .. })
        ));
        assert!(matches!(
            partition_key("CVE-2023"),
            Err(VulnError::InvalidIdentifierFormat { .. })
        ));
    }

    #[test]
    fn test_path_escape_is_rejected() {
        assert!(partition_key("CVE-2023-../../etc/passwd").is_err());
        assert!(partition_key("CVE-..-0001").is_err());
        assert!(partition_key("CVE-2023-0001\\x").is_err());
    }

    #[test]
    fn test_record_path_layout() {
        let store = RecordStore::new(PathBuf::from("/data"));
        assert_eq!(
            store.record_path("CVE-2023-0001").unwrap(),
            PathBuf::from("/data/2023/CVE-2023-0001.json")
        );
    }

    #[test]
    fn test_load_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        write_record(
            temp_dir.path(),
            "2023",
            "CVE-2023-0001",
            r#"{"id": "CVE-2023-0001", "reported_exploited": "True", "exploit_maturity": "POC"}"#,
        );

        let store = RecordStore::new(temp_dir.path().to_path_buf());
        let record = store.load("CVE-2023-0001").unwrap();
        assert_eq!(record.id, "CVE-2023-0001");
        assert_eq!(record.reported_exploited, "true");
        assert_eq!(record.exploit_maturity, "poc");
        assert!(record.exploits.is_empty());
    }

    #[test]
    fn test_load_missing_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().to_path_buf());

        match store.load("CVE-2023-9999") {
            Err(VulnError::NotFound { id, path }) => {
                assert_eq!(id, "CVE-2023-9999");
                assert!(path.ends_with("2023/CVE-2023-9999.json"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_corrupt_record() {
        let temp_dir = TempDir::new().unwrap();
        write_record(temp_dir.path(), "2023", "CVE-2023-0002", "{ truncated");
        write_record(temp_dir.path(), "2023", "CVE-2023-0003", "[1, 2, 3]");

        let store = RecordStore::new(temp_dir.path().to_path_buf());
        assert!(matches!(
            store.load("CVE-2023-0002"),
            Err(VulnError::CorruptRecord { .. })
        ));
        assert!(matches!(
            store.load("CVE-2023-0003"),
            Err(VulnError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_load_does_not_modify_file() {
        let temp_dir = TempDir::new().unwrap();
        write_record(temp_dir.path(), "2022", "CVE-2022-0001", "{}");

        let store = RecordStore::new(temp_dir.path().to_path_buf());
        let first = store.load("CVE-2022-0001").unwrap();
        let second = store.load("CVE-2022-0001").unwrap();
        assert_eq!(first, second);

        let on_disk = fs::read_to_string(temp_dir.path().join("2022/CVE-2022-0001.json")).unwrap();
        assert_eq!(on_disk, "{}");
    }
}
