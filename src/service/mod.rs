//! Request-level services built on the storage layer
//!
//! Services hold only immutable dataset locations and compiled patterns;
//! the advisory mapping and records are re-read on every call.

mod enrichment;
mod lookup;

pub use enrichment::{
    EnrichmentReport, EnrichmentService, EXPLOIT_MATURITY_COLUMN, REPORTED_EXPLOITED_COLUMN,
};
pub use lookup::{split_ids, LookupService};
