//! Identifier lookup: advisory expansion followed by fail-fast record loading

use crate::error::{Result, VulnError};
use crate::model::VulnerabilityRecord;
use crate::storage::{AdvisoryMap, Dataset};

/// Resolves comma-separated CVE / RHSA identifiers to records
#[derive(Debug, Clone)]
pub struct LookupService {
    dataset: Dataset,
}

impl LookupService {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Look up every identifier in `raw_ids`, expanding advisories.
    ///
    /// Records come back in the order of the expanded identifier list. The
    /// first identifier that cannot be loaded aborts the whole lookup.
    pub fn get_records(&self, raw_ids: &str) -> Result<Vec<VulnerabilityRecord>> {
        let advisories = self.dataset.load_advisories();
        self.get_records_with(raw_ids, &advisories)
    }

    /// Same as [`get_records`](Self::get_records) against an already loaded mapping
    pub fn get_records_with(
        &self,
        raw_ids: &str,
        advisories: &AdvisoryMap,
    ) -> Result<Vec<VulnerabilityRecord>> {
        let ids = split_ids(raw_ids);
        let expanded = advisories.resolve(&ids)?;
        self.load_all(&expanded)
    }

    /// Load records for identifiers that are already CVE IDs
    pub fn load_all<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<VulnerabilityRecord>> {
        if ids.is_empty() {
            return Err(VulnError::NoValidIdentifiers);
        }

        ids.iter()
            .map(|id| self.dataset.records().load(id.as_ref()))
            .collect()
    }
}

/// Split on commas, trim, and drop empty entries
pub fn split_ids(raw_ids: &str) -> Vec<&str> {
    raw_ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LookupService) {
        let temp_dir = TempDir::new().unwrap();
        let records = temp_dir.path().join("records");
        fs::create_dir_all(records.join("2023")).unwrap();
        for (id, maturity) in [
            ("CVE-2023-0001", "poc"),
            ("CVE-2023-0002", "weaponized"),
            ("CVE-2023-0003", "exploited"),
        ] {
            fs::write(
                records.join("2023").join(format!("{}.json", id)),
                format!(r#"{{"id": "{}", "exploit_maturity": "{}"}}"#, id, maturity),
            )
            .unwrap();
        }

        let mapping = temp_dir.path().join("rhsa_to_cve.json");
        fs::write(
            &mapping,
            r#"{"RHSA-2023:9999": ["CVE-2023-0002", "CVE-2023-0003"]}"#,
        )
        .unwrap();

        let service = LookupService::new(Dataset::new(records, mapping));
        (temp_dir, service)
    }

    fn ids(records: &[VulnerabilityRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_split_ids() {
        assert_eq!(
            split_ids(" CVE-2023-0001 ,, RHSA-2023:9999"),
            vec!["CVE-2023-0001", "RHSA-2023:9999"]
        );
        assert!(split_ids("").is_empty());
        assert!(split_ids(" , ").is_empty());
    }

    #[test]
    fn test_mixed_lookup_preserves_order() {
        let (_temp_dir, service) = setup();
        let records = service
            .get_records("CVE-2023-0001,RHSA-2023:9999")
            .unwrap();
        assert_eq!(
            ids(&records),
            vec!["CVE-2023-0001", "CVE-2023-0002", "CVE-2023-0003"]
        );
    }

    #[test]
    fn test_empty_input() {
        let (_temp_dir, service) = setup();
        assert!(matches!(
            service.get_records(""),
            Err(VulnError::NoValidIdentifiers)
        ));
    }

    #[test]
    fn test_unknown_advisory() {
        let (_temp_dir, service) = setup();
        assert!(matches!(
            service.get_records("CVE-2023-0001,RHSA-2023:0001"),
            Err(VulnError::UnknownAdvisory { .. })
        ));
    }

    #[test]
    fn test_fail_fast_on_missing_record() {
        let (_temp_dir, service) = setup();
        match service.get_records("CVE-2023-0001,CVE-2023-4040,CVE-2023-0002") {
            Err(VulnError::NotFound { id, .. }) => assert_eq!(id, "CVE-2023-4040"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_identifier() {
        let (_temp_dir, service) = setup();
        assert!(matches!(
            service.get_records("CVE2023"),
            Err(VulnError::InvalidIdentifierFormat { .. })
        ));
    }

    #[test]
    fn test_missing_mapping_file_only_affects_advisories() {
        let (temp_dir, _) = setup();
        let service = LookupService::new(Dataset::new(
            temp_dir.path().join("records"),
            Path::new("/nonexistent/rhsa_to_cve.json").to_path_buf(),
        ));

        assert_eq!(service.get_records("CVE-2023-0001").unwrap().len(), 1);
        assert!(matches!(
            service.get_records("RHSA-2023:9999"),
            Err(VulnError::UnknownAdvisory { .. })
        ));
    }
}
