//! Advisory-to-CVE mapping
//!
//! The mapping file is a JSON object of the form
//! `{"RHSA-2023:1234": ["CVE-2023-0001", "CVE-2023-0002"]}`.
//! It is re-read for every request and never cached.

use crate::error::{Result, VulnError};
use crate::patterns::ADVISORY_PREFIX;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Where the mapping came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOrigin {
    /// Parsed from the file
    Loaded { path: PathBuf, entries: usize },
    /// File does not exist
    Missing { path: PathBuf },
    /// File exists but could not be read or parsed
    Unreadable { path: PathBuf, reason: String },
    /// Built in memory
    Inline,
}

/// Result of expanding advisories without failing on unknown ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LenientExpansion {
    pub cves: Vec<String>,
    pub unknown: Vec<String>,
}

/// Immutable advisory mapping
#[derive(Debug, Clone)]
pub struct AdvisoryMap {
    entries: HashMap<String, Vec<String>>,
    origin: MappingOrigin,
}

impl AdvisoryMap {
    /// Load the mapping file; a missing or unreadable file yields an empty mapping
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Self::empty(MappingOrigin::Missing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Self::empty(MappingOrigin::Unreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        match serde_json::from_str::<HashMap<String, Vec<String>>>(&content) {
            Ok(entries) => Self {
                origin: MappingOrigin::Loaded {
                    path: path.to_path_buf(),
                    entries: entries.len(),
                },
                entries,
            },
            Err(e) => Self::empty(MappingOrigin::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Build a mapping from in-memory entries
    pub fn from_entries(entries: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries,
            origin: MappingOrigin::Inline,
        }
    }

    fn empty(origin: MappingOrigin) -> Self {
        Self {
            entries: HashMap::new(),
            origin,
        }
    }

    pub fn origin(&self) -> &MappingOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// CVE identifiers mapped to an advisory, in mapping order
    pub fn get(&self, advisory: &str) -> Option<&[String]> {
        self.entries.get(advisory).map(Vec::as_slice)
    }

    /// Expand advisory identifiers into their CVEs and pass everything else through.
    ///
    /// Inputs are trimmed. Fails on the first advisory missing from the mapping.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<String>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref().trim();
            if id.starts_with(ADVISORY_PREFIX) {
                let cves = self
                    .get(id)
                    .ok_or_else(|| VulnError::UnknownAdvisory { id: id.to_string() })?;
                resolved.extend(cves.iter().cloned());
            } else {
                resolved.push(id.to_string());
            }
        }
        Ok(resolved)
    }

    /// Expand advisories, collecting unknown ones instead of failing
    pub fn expand_lenient<S: AsRef<str>>(&self, advisories: &[S]) -> LenientExpansion {
        let mut expansion = LenientExpansion::default();
        for advisory in advisories {
            let advisory = advisory.as_ref().trim();
            match self.get(advisory) {
                Some(cves) => expansion.cves.extend(cves.iter().cloned()),
                None => expansion.unknown.push(advisory.to_string()),
            }
        }
        expansion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> AdvisoryMap {
        let mut entries = HashMap::new();
        entries.insert(
            "RHSA-2023:9999".to_string(),
            vec!["CVE-2023-0002".to_string(), "CVE-2023-0003".to_string()],
        );
        AdvisoryMap::from_entries(entries)
    }

    #[test]
    fn test_resolve_expands_in_order() {
        let map = sample();
        let resolved = map
            .resolve(&["CVE-2023-0001", " RHSA-2023:9999 ", "CVE-2023-0004"])
            .unwrap();
        assert_eq!(
            resolved,
            vec![
                "CVE-2023-0001",
                "CVE-2023-0002",
                "CVE-2023-0003",
                "CVE-2023-0004"
            ]
        );
    }

    #[test]
    fn test_resolve_unknown_advisory_fails() {
        let map = sample();
        match map.resolve(&["CVE-2023-0001", "RHSA-2020:0001"]) {
            Err(VulnError::UnknownAdvisory { id }) => assert_eq!(id, "RHSA-2020:0001"),
            other => panic!("expected UnknownAdvisory, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_lenient_collects_unknown() {
        let map = sample();
        let expansion = map.expand_lenient(&["RHSA-2023:9999", "RHSA-2020:0001"]);
        assert_eq!(expansion.cves, vec!["CVE-2023-0002", "CVE-2023-0003"]);
        assert_eq!(expansion.unknown, vec!["RHSA-2020:0001"]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rhsa_to_cve.json");
        let map = AdvisoryMap::load(&path);

        assert!(map.is_empty());
        assert_eq!(map.origin(), &MappingOrigin::Missing { path });
        assert!(matches!(
            map.resolve(&["RHSA-2023:9999"]),
            Err(VulnError::UnknownAdvisory { .. })
        ));
    }

    #[test]
    fn test_load_unparseable_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rhsa_to_cve.json");
        std::fs::write(&path, "not json").unwrap();

        let map = AdvisoryMap::load(&path);
        assert!(map.is_empty());
        assert!(matches!(map.origin(), MappingOrigin::Unreadable { .. }));
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rhsa_to_cve.json");
        std::fs::write(
            &path,
            r#"{"RHSA-2023:9999": ["CVE-2023-0002", "CVE-2023-0003"], "RHSA-2023:1000": []}"#,
        )
        .unwrap();

        let map = AdvisoryMap::load(&path);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("RHSA-2023:9999").unwrap(),
            &["CVE-2023-0002".to_string(), "CVE-2023-0003".to_string()]
        );
        assert_eq!(map.get("RHSA-2023:1000").unwrap().len(), 0);
    }
}
