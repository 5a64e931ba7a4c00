//! Identifier patterns for CVE and RHSA references in free text

use crate::error::{Result, VulnError};
use regex::Regex;

/// CVE identifier, e.g. `CVE-2023-12345`
pub const CVE_PATTERN: &str = r"CVE-\d{4}-\d+";

/// Red Hat Security Advisory identifier, e.g. `RHSA-2023:1234`
pub const RHSA_PATTERN: &str = r"RHSA-\d{4}:\d+";

/// Prefix marking an identifier as an advisory rather than a CVE
pub const ADVISORY_PREFIX: &str = "RHSA-";

/// Identifiers found in a piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIdentifiers {
    pub cves: Vec<String>,
    pub advisories: Vec<String>,
}

/// Pre-compiled identifier patterns
#[derive(Debug, Clone)]
pub struct IdentifierPatterns {
    cve: Regex,
    rhsa: Regex,
}

impl IdentifierPatterns {
    /// Compile the CVE and RHSA patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            cve: compile("cve", CVE_PATTERN)?,
            rhsa: compile("rhsa", RHSA_PATTERN)?,
        })
    }

    /// Whether the text contains at least one CVE or RHSA identifier
    pub fn is_match(&self, text: &str) -> bool {
        self.cve.is_match(text) || self.rhsa.is_match(text)
    }

    /// Extract every CVE and RHSA identifier, in order of appearance
    pub fn extract(&self, text: &str) -> ExtractedIdentifiers {
        ExtractedIdentifiers {
            cves: self
                .cve
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            advisories: self
                .rhsa
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
        }
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| VulnError::Config(format!("Invalid {} pattern '{}': {}", name, pattern, e)))
}
