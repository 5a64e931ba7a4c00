//! Bulk enrichment of uploaded CSV reports
//!
//! The column holding the most CVE / RHSA references is located, every
//! identifier in it is resolved, and two columns with the worst-case
//! exploitation status per row are appended.

use crate::error::{Result, VulnError};
use crate::model::{title_case, SeverityOrder, VulnerabilityRecord};
use crate::patterns::IdentifierPatterns;
use crate::service::LookupService;
use crate::storage::MappingOrigin;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::collections::{HashMap, HashSet};

/// Name of the appended reported-exploited column
pub const REPORTED_EXPLOITED_COLUMN: &str = "reported_exploited";

/// Name of the appended exploit-maturity column
pub const EXPLOIT_MATURITY_COLUMN: &str = "exploit_maturity";

/// Outcome of a successful enrichment
#[derive(Debug, Clone)]
pub struct EnrichmentReport {
    /// Augmented CSV document
    pub csv: Vec<u8>,
    /// Header of the column identifiers were read from
    pub target_column: String,
    /// Number of data rows
    pub rows: usize,
    /// Distinct CVE identifiers looked up
    pub unique_cves: usize,
    /// Advisories referenced in the report but missing from the mapping
    pub skipped_advisories: Vec<String>,
    /// Where the advisory mapping was read from
    pub mapping: MappingOrigin,
}

/// Parsed input table
struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

/// Appends exploitation status columns to CSV reports
#[derive(Debug, Clone)]
pub struct EnrichmentService {
    lookup: LookupService,
    patterns: IdentifierPatterns,
}

impl EnrichmentService {
    pub fn new(lookup: LookupService, patterns: IdentifierPatterns) -> Self {
        Self { lookup, patterns }
    }

    /// Enrich a CSV document
    pub fn enrich(&self, table: &[u8]) -> Result<EnrichmentReport> {
        let text = std::str::from_utf8(table).map_err(|e| VulnError::Decode { source: e })?;
        let table = parse_table(text)?;

        let target = self
            .select_target_column(&table)
            .ok_or(VulnError::NoIdentifiersFound)?;

        let advisories = self.lookup.dataset().load_advisories();
        let mut skipped_advisories = Vec::new();
        let mut row_ids: Vec<Vec<String>> = Vec::with_capacity(table.rows.len());
        let mut unique = Vec::new();
        let mut seen = HashSet::new();

        for row in &table.rows {
            let found = self.patterns.extract(row.get(target).unwrap_or(""));
            let expansion = advisories.expand_lenient(&found.advisories);
            skipped_advisories.extend(expansion.unknown);

            let mut ids = Vec::new();
            for id in found.cves.into_iter().chain(expansion.cves) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            for id in &ids {
                if seen.insert(id.clone()) {
                    unique.push(id.clone());
                }
            }
            row_ids.push(ids);
        }

        if unique.is_empty() {
            return Err(VulnError::NoValidIdentifiersAfterMapping);
        }

        let records: HashMap<String, VulnerabilityRecord> = unique
            .iter()
            .cloned()
            .zip(self.lookup.load_all(&unique)?)
            .collect();

        let csv = write_table(&table, &row_ids, &records)?;

        Ok(EnrichmentReport {
            csv,
            target_column: table.headers.get(target).unwrap_or("").to_string(),
            rows: table.rows.len(),
            unique_cves: unique.len(),
            skipped_advisories,
            mapping: advisories.origin().clone(),
        })
    }

    /// Index of the column with the most rows containing an identifier.
    ///
    /// Ties go to the leftmost column; `None` when no column matches at all.
    fn select_target_column(&self, table: &Table) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for column in 0..table.headers.len() {
            let matches = table
                .rows
                .iter()
                .filter(|row| self.patterns.is_match(row.get(column).unwrap_or("")))
                .count();
            if matches > best.map_or(0, |(_, count)| count) {
                best = Some((column, matches));
            }
        }
        best.map(|(column, _)| column)
    }
}

fn parse_table(text: &str) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| VulnError::MalformedTable {
            detail: e.to_string(),
        })?
        .clone();

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| VulnError::MalformedTable {
            detail: e.to_string(),
        })?;

    Ok(Table { headers, rows })
}

fn write_table(
    table: &Table,
    row_ids: &[Vec<String>],
    records: &HashMap<String, VulnerabilityRecord>,
) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_error = |e: csv::Error| VulnError::Csv {
        source: e,
        context: "Failed to write enriched report".to_string(),
    };

    writer
        .write_record(
            table
                .headers
                .iter()
                .chain([REPORTED_EXPLOITED_COLUMN, EXPLOIT_MATURITY_COLUMN]),
        )
        .map_err(csv_error)?;

    for (row, ids) in table.rows.iter().zip(row_ids) {
        let matched: Vec<&VulnerabilityRecord> =
            ids.iter().filter_map(|id| records.get(id)).collect();

        let reported = SeverityOrder::ReportedExploited
            .worst(matched.iter().map(|r| r.reported_exploited.as_str()));
        let maturity = SeverityOrder::ExploitMaturity
            .worst(matched.iter().map(|r| r.exploit_maturity.as_str()));

        let reported = title_case(reported);
        let maturity = title_case(maturity);
        writer
            .write_record(row.iter().chain([reported.as_str(), maturity.as_str()]))
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(|e| VulnError::Io {
        source: e.into_error(),
        context: "Failed to flush enriched report".to_string(),
    })
}
