//! Shared dataset fixture for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vulnlens::storage::Dataset;

/// Temporary record tree plus advisory mapping
pub struct Fixture {
    pub temp_dir: TempDir,
    pub dataset: Dataset,
}

pub fn write_record(records_dir: &Path, id: &str, content: &str) {
    let year = id.split('-').nth(1).unwrap();
    let dir = records_dir.join(year);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.json", id)), content).unwrap();
}

pub fn fixture() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let records_dir = temp_dir.path().join("ssvc.me");

    write_record(
        &records_dir,
        "CVE-2023-0001",
        r#"{
            "id": "CVE-2023-0001",
            "reported_exploited": true,
            "exploit_maturity": "poc",
            "counts": {"public_exploit_count": 2},
            "timeline": {"nvd_published": "2023-01-10T15:15:00"},
            "exploits": [
                {"name": "PoC for CVE-2023-0001", "url": "https://github.com/example/poc",
                 "source": "github", "date_added": "2023-01-12"}
            ]
        }"#,
    );
    write_record(
        &records_dir,
        "CVE-2023-0002",
        r#"{"id": "CVE-2023-0002", "reported_exploited": "false", "exploit_maturity": "weaponized"}"#,
    );
    write_record(
        &records_dir,
        "CVE-2023-0003",
        r#"{"id": "CVE-2023-0003", "reported_exploited": "TRUE", "exploit_maturity": "Exploited"}"#,
    );
    // Sparse record: every field must be defaulted on load
    write_record(&records_dir, "CVE-2022-1234", r#"{"id": "CVE-2022-1234"}"#);

    let advisories_file = records_dir.join("rhsa_to_cve.json");
    fs::write(
        &advisories_file,
        r#"{
            "RHSA-2023:9999": ["CVE-2023-0002", "CVE-2023-0003"],
            "RHSA-2022:0001": ["CVE-2022-1234"]
        }"#,
    )
    .unwrap();

    Fixture {
        temp_dir,
        dataset: Dataset::new(records_dir, advisories_file),
    }
}
