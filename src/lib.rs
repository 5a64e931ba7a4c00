//! vulnlens - CVE exploitation status lookup service
//!
//! Serves per-CVE JSON records from a read-only directory tree, expands
//! Red Hat Security Advisories into their CVEs, and enriches uploaded CSV
//! reports with worst-case exploitation status columns.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod patterns;
pub mod server;
pub mod service;
pub mod storage;

pub use error::{Result, VulnError};
