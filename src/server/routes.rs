//! Request routing for the HTTP API
//!
//! The router maps a method, URL and body to a reply plus an [`Outcome`]
//! describing what happened; logging is left to the caller.

use super::assets::{StaticFiles, INDEX_FILE};
use super::upload::report_bytes;
use crate::error::VulnError;
use crate::service::{split_ids, EnrichmentReport, EnrichmentService, LookupService};
use crate::storage::MappingOrigin;
use serde::Serialize;
use std::path::PathBuf;
use tiny_http::Method;

/// Lookup endpoint path
pub const VULN_PATH: &str = "/v1/vuln";

/// Report enrichment endpoint path
pub const REPORT_PATH: &str = "/v1/report";

/// Upload path used by the browser client
pub const UPLOAD_CSV_PATH: &str = "/v1/upload_csv";

/// Prefix of the browser client's assets
pub const STATIC_PREFIX: &str = "/static/";

/// File name offered for enriched report downloads
pub const REPORT_FILENAME: &str = "enhanced_report.csv";

/// Response ready to be written to the client
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl HttpReply {
    /// JSON reply
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                headers: Vec::new(),
                body,
            },
            Err(e) => Self::detail(500, &format!("Failed to serialize response: {}", e)),
        }
    }

    /// JSON `{"detail": ...}` reply
    pub fn detail(status: u16, detail: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            headers: Vec::new(),
            body: serde_json::to_vec(&ErrorBody { detail }).unwrap_or_default(),
        }
    }

    /// Reply describing an error
    pub fn error(err: &VulnError) -> Self {
        Self::detail(err.status_code(), &err.to_string())
    }

    /// Enriched CSV offered as a download
    pub fn csv(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "text/csv; charset=utf-8",
            headers: vec![(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            )],
            body,
        }
    }
}

/// What a request resolved to
#[derive(Debug)]
pub enum Outcome {
    /// Records returned by the lookup endpoint
    Records {
        requested: usize,
        returned: usize,
        mapping: MappingOrigin,
    },
    /// Report enriched
    Report {
        target_column: String,
        rows: usize,
        unique_cves: usize,
        skipped_advisories: Vec<String>,
        mapping: MappingOrigin,
    },
    /// File served from the static directory
    Asset { path: PathBuf, bytes: usize },
    /// Request failed with a domain or infrastructure error
    Failed(VulnError),
    /// Unknown path or unsupported method
    Unrouted,
}

/// Reply and outcome for one request
#[derive(Debug)]
pub struct Routed {
    pub reply: HttpReply,
    pub outcome: Outcome,
}

impl Routed {
    fn failed(err: VulnError) -> Self {
        Self {
            reply: HttpReply::error(&err),
            outcome: Outcome::Failed(err),
        }
    }

    fn unrouted(status: u16, detail: &str) -> Self {
        Self {
            reply: HttpReply::detail(status, detail),
            outcome: Outcome::Unrouted,
        }
    }
}

/// Dispatches API requests to the services
#[derive(Debug, Clone)]
pub struct Router {
    lookup: LookupService,
    enrichment: EnrichmentService,
    static_files: Option<StaticFiles>,
}

impl Router {
    pub fn new(lookup: LookupService, enrichment: EnrichmentService) -> Self {
        Self {
            lookup,
            enrichment,
            static_files: None,
        }
    }

    /// Serve the browser upload page from `files`
    pub fn with_static_files(mut self, files: StaticFiles) -> Self {
        self.static_files = Some(files);
        self
    }

    /// Whether the request carries a body the router will read
    pub fn accepts_body(method: &Method, url: &str) -> bool {
        *method == Method::Post && matches!(split_url(url).0, REPORT_PATH | UPLOAD_CSV_PATH)
    }

    /// Route a request
    ///
    /// `content_type` is the request's `Content-Type` header, used to tell
    /// multipart uploads from raw CSV bodies.
    pub fn route(
        &self,
        method: &Method,
        url: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Routed {
        let (path, query) = split_url(url);
        match (method, path) {
            (Method::Get, VULN_PATH) => self.get_vuln(query),
            (Method::Post, REPORT_PATH) | (Method::Post, UPLOAD_CSV_PATH) => {
                self.post_report(content_type, body)
            }
            (Method::Get, "/") => self.get_asset(INDEX_FILE),
            (Method::Get, path) if path.starts_with(STATIC_PREFIX) => {
                self.get_asset(&path[STATIC_PREFIX.len()..])
            }
            (_, VULN_PATH) | (_, REPORT_PATH) | (_, UPLOAD_CSV_PATH) | (_, "/") => {
                Routed::unrouted(405, "Method Not Allowed")
            }
            _ => Routed::unrouted(404, "Not Found"),
        }
    }

    fn get_asset(&self, relative: &str) -> Routed {
        let files = match &self.static_files {
            Some(files) => files,
            None => return Routed::unrouted(404, "Not Found"),
        };

        match files.load(relative) {
            Ok(Some(asset)) => Routed {
                outcome: Outcome::Asset {
                    path: asset.path,
                    bytes: asset.body.len(),
                },
                reply: HttpReply {
                    status: 200,
                    content_type: asset.content_type,
                    headers: Vec::new(),
                    body: asset.body,
                },
            },
            Ok(None) => Routed::unrouted(404, "Not Found"),
            Err(e) => Routed::failed(e),
        }
    }

    fn get_vuln(&self, query: &str) -> Routed {
        let raw_ids = query_param(query, "vulnIds").unwrap_or_default();
        let advisories = self.lookup.dataset().load_advisories();

        match self.lookup.get_records_with(&raw_ids, &advisories) {
            Ok(records) => Routed {
                reply: HttpReply::json(200, &records),
                outcome: Outcome::Records {
                    requested: split_ids(&raw_ids).len(),
                    returned: records.len(),
                    mapping: advisories.origin().clone(),
                },
            },
            Err(e) => Routed::failed(e),
        }
    }

    fn post_report(&self, content_type: Option<&str>, body: &[u8]) -> Routed {
        let table = match report_bytes(content_type, body) {
            Ok(table) => table,
            Err(e) => return Routed::failed(e),
        };

        match self.enrichment.enrich(&table) {
            Ok(EnrichmentReport {
                csv,
                target_column,
                rows,
                unique_cves,
                skipped_advisories,
                mapping,
            }) => Routed {
                reply: HttpReply::csv(csv),
                outcome: Outcome::Report {
                    target_column,
                    rows,
                    unique_cves,
                    skipped_advisories,
                    mapping,
                },
            },
            Err(e) => Routed::failed(e),
        }
    }
}

/// Split a request target into path and query string
fn split_url(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

/// First value of a percent-decoded query parameter
fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        assert_eq!(
            split_url("/v1/vuln?vulnIds=CVE-2023-0001"),
            ("/v1/vuln", "vulnIds=CVE-2023-0001")
        );
        assert_eq!(split_url("/v1/report"), ("/v1/report", ""));
    }

    #[test]
    fn test_query_param_decoding() {
        let query = "other=1&vulnIds=CVE-2023-0001%2CRHSA-2023%3A9999";
        assert_eq!(
            query_param(query, "vulnIds").as_deref(),
            Some("CVE-2023-0001,RHSA-2023:9999")
        );
        assert_eq!(query_param(query, "missing"), None);
    }

    #[test]
    fn test_error_reply_body() {
        let reply = HttpReply::error(&VulnError::NoValidIdentifiers);
        assert_eq!(reply.status, 400);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["detail"], "No valid vulnerability identifiers provided");
    }

    #[test]
    fn test_accepts_body() {
        assert!(Router::accepts_body(&Method::Post, "/v1/report"));
        assert!(Router::accepts_body(&Method::Post, "/v1/upload_csv"));
        assert!(!Router::accepts_body(&Method::Get, "/v1/report"));
        assert!(!Router::accepts_body(&Method::Post, "/v1/vuln"));
    }
}
