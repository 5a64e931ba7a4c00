//! Vulnerability record as returned to API callers
//!
//! Stored documents are first deserialized into [`RawRecord`], where every
//! field is optional and loosely typed, then turned into a fully populated
//! [`VulnerabilityRecord`] by [`VulnerabilityRecord::from_raw`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exploit counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub public_exploit_count: u64,
}

/// Publication timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub nvd_published: String,
}

/// Known public exploit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exploit {
    pub name: String,
    pub url: String,
    pub source: String,
    pub date_added: String,
}

/// Vulnerability record with every field present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    /// Lowercase, empty when unknown
    pub reported_exploited: String,
    /// Lowercase, empty when unknown
    pub exploit_maturity: String,
    pub counts: Counts,
    pub timeline: Timeline,
    pub exploits: Vec<Exploit>,
}

/// Stored document before defaulting
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub reported_exploited: Option<Value>,
    #[serde(default)]
    pub exploit_maturity: Option<Value>,
    #[serde(default)]
    pub counts: Option<RawCounts>,
    #[serde(default)]
    pub timeline: Option<RawTimeline>,
    #[serde(default)]
    pub exploits: Option<Vec<RawExploit>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCounts {
    #[serde(default)]
    pub public_exploit_count: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTimeline {
    #[serde(default)]
    pub nvd_published: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExploit {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub date_added: Option<Value>,
}

impl VulnerabilityRecord {
    /// Build a record from a stored document, filling every missing field.
    ///
    /// `requested_id` is used when the document carries no `id` of its own.
    pub fn from_raw(raw: RawRecord, requested_id: &str) -> Self {
        let id = match text(raw.id) {
            id if id.is_empty() => requested_id.to_string(),
            id => id,
        };

        Self {
            id,
            reported_exploited: text(raw.reported_exploited).to_lowercase(),
            exploit_maturity: text(raw.exploit_maturity).to_lowercase(),
            counts: Counts {
                public_exploit_count: raw
                    .counts
                    .and_then(|c| c.public_exploit_count)
                    .map(count)
                    .unwrap_or(0),
            },
            timeline: Timeline {
                nvd_published: text(raw.timeline.and_then(|t| t.nvd_published)),
            },
            exploits: raw
                .exploits
                .unwrap_or_default()
                .into_iter()
                .map(|e| Exploit {
                    name: text(e.name),
                    url: text(e.url),
                    source: text(e.source),
                    date_added: text(e.date_added),
                })
                .collect(),
        }
    }
}

/// Render any scalar as a string; absent and null become empty
fn text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn count(value: Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
