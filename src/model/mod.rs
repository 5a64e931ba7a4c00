//! Domain types shared by storage and services

mod record;
mod severity;

pub use record::{
    Counts, Exploit, RawCounts, RawExploit, RawRecord, RawTimeline, Timeline,
    VulnerabilityRecord,
};
pub use severity::{title_case, SeverityOrder};
