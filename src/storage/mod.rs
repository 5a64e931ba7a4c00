//! Storage layer for vulnlens
//!
//! Read-only access to the record tree and the advisory mapping file

pub mod advisories;
pub mod records;

pub use advisories::{AdvisoryMap, LenientExpansion, MappingOrigin};
pub use records::{partition_key, RecordStore};

use crate::config::DataConfig;
use std::path::{Path, PathBuf};

/// Dataset locations shared by every request
#[derive(Debug, Clone)]
pub struct Dataset {
    records: RecordStore,
    advisories_file: PathBuf,
}

impl Dataset {
    pub fn new(records_dir: PathBuf, advisories_file: PathBuf) -> Self {
        Self {
            records: RecordStore::new(records_dir),
            advisories_file,
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.records_dir.clone(), config.advisories_file.clone())
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn advisories_file(&self) -> &Path {
        &self.advisories_file
    }

    /// Fresh read of the advisory mapping
    pub fn load_advisories(&self) -> AdvisoryMap {
        AdvisoryMap::load(&self.advisories_file)
    }
}
