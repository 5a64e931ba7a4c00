// HTTP server: tiny_http listener driven from the tokio runtime

mod assets;
mod routes;
mod signals;
mod upload;

pub use assets::StaticFiles;
pub use routes::{
    HttpReply, Outcome, Routed, Router, REPORT_FILENAME, REPORT_PATH, STATIC_PREFIX,
    UPLOAD_CSV_PATH, VULN_PATH,
};
pub use signals::SignalHandler;
pub use upload::{report_bytes, UPLOAD_FIELD};

use crate::config::Config;
use crate::error::{Result, VulnError};
use crate::patterns::IdentifierPatterns;
use crate::service::{EnrichmentService, LookupService};
use crate::storage::{Dataset, MappingOrigin};
use std::future::Future;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tokio::task;

/// HTTP front end for the lookup and enrichment services
pub struct HttpServer {
    server: Arc<Server>,
    router: Arc<Router>,
    max_upload: usize,
}

impl HttpServer {
    /// Build the services from configuration and bind the listener
    pub fn from_config(config: &Config) -> Result<Self> {
        let config = config.expanded()?;
        let dataset = Dataset::from_config(&config.data);
        let lookup = LookupService::new(dataset);
        let enrichment = EnrichmentService::new(lookup.clone(), IdentifierPatterns::new()?);
        let router = Router::new(lookup, enrichment)
            .with_static_files(StaticFiles::new(config.server.static_dir.clone()));

        Self::bind(
            &config.server.address(),
            router,
            config.server.max_upload_bytes()?,
        )
    }

    /// Bind to an address such as `0.0.0.0:8080`
    pub fn bind(addr: &str, router: Router, max_upload: usize) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| VulnError::Server(format!("Failed to bind {}: {}", addr, e)))?;

        let listening = server
            .server_addr()
            .to_ip()
            .map(|a| a.to_string())
            .unwrap_or_else(|| addr.to_string());
        tracing::info!("HTTP server listening on http://{}", listening);

        Ok(Self {
            server: Arc::new(server),
            router: Arc::new(router),
            max_upload,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until `shutdown` resolves.
    ///
    /// Each request is handled on the blocking pool; handlers share only
    /// the immutable router.
    pub async fn serve_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let server = Arc::clone(&self.server);
            let accept = task::spawn_blocking(move || server.recv());

            tokio::select! {
                accepted = accept => {
                    match accepted {
                        Ok(Ok(request)) => {
                            let router = Arc::clone(&self.router);
                            let max_upload = self.max_upload;
                            task::spawn_blocking(move || handle_request(request, &router, max_upload));
                        }
                        Ok(Err(e)) => tracing::warn!("Failed to accept request: {}", e),
                        Err(e) => {
                            return Err(VulnError::Server(format!("Accept task failed: {}", e)));
                        }
                    }
                }

                _ = &mut shutdown => {
                    // Wakes the pending recv() so its blocking task can finish
                    self.server.unblock();
                    break;
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Read the body, route the request, log the outcome and respond
fn handle_request(mut request: Request, router: &Router, max_upload: usize) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string());

    let routed = if Router::accepts_body(&method, &url) {
        match read_body(&mut request, max_upload) {
            Ok(body) => router.route(&method, &url, content_type.as_deref(), &body),
            Err(e) => Routed {
                reply: HttpReply::error(&e),
                outcome: Outcome::Failed(e),
            },
        }
    } else {
        router.route(&method, &url, None, &[])
    };

    log_outcome(&method, &url, &routed);

    if let Err(e) = request.respond(into_response(routed.reply)) {
        tracing::warn!("Failed to send response for {} {}: {}", method, url, e);
    }
}

/// Read at most `limit` bytes of request body
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>> {
    if let Some(size) = request.body_length() {
        if size > limit {
            return Err(VulnError::PayloadTooLarge { size, limit });
        }
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| VulnError::Io {
            source: e,
            context: "Failed to read request body".to_string(),
        })?;

    if body.len() > limit {
        return Err(VulnError::PayloadTooLarge {
            size: body.len(),
            limit,
        });
    }

    Ok(body)
}

fn into_response(reply: HttpReply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response =
        Response::from_data(reply.body).with_status_code(StatusCode(reply.status));

    let headers = std::iter::once(("Content-Type", reply.content_type.to_string()))
        .chain(reply.headers);
    for (name, value) in headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => tracing::warn!("Dropping invalid response header {}", name),
        }
    }

    response
}

fn log_outcome(method: &tiny_http::Method, url: &str, routed: &Routed) {
    let status = routed.reply.status;
    match &routed.outcome {
        Outcome::Records {
            requested,
            returned,
            mapping,
        } => {
            log_mapping(mapping);
            tracing::info!(
                "{} {} -> {}: {} identifiers, {} records",
                method,
                url,
                status,
                requested,
                returned
            );
        }
        Outcome::Report {
            target_column,
            rows,
            unique_cves,
            skipped_advisories,
            mapping,
        } => {
            log_mapping(mapping);
            for advisory in skipped_advisories {
                tracing::warn!("Skipping unknown advisory {} in report", advisory);
            }
            tracing::info!(
                "{} {} -> {}: {} rows enriched from column '{}', {} unique CVEs",
                method,
                url,
                status,
                rows,
                target_column,
                unique_cves
            );
        }
        Outcome::Failed(e) if e.is_client_error() => {
            tracing::warn!("{} {} -> {}: {}", method, url, status, e.log_message());
        }
        Outcome::Failed(e) => {
            tracing::error!("{} {} -> {}: {}", method, url, status, e.log_message());
        }
        Outcome::Asset { path, bytes } => {
            tracing::debug!(
                "{} {} -> {}: served {} ({} bytes)",
                method,
                url,
                status,
                path.display(),
                bytes
            );
        }
        Outcome::Unrouted => {
            tracing::debug!("{} {} -> {}", method, url, status);
        }
    }
}

fn log_mapping(mapping: &MappingOrigin) {
    match mapping {
        MappingOrigin::Loaded { path, entries } => {
            tracing::debug!(
                "Loaded {} advisory mappings from {}",
                entries,
                path.display()
            );
        }
        MappingOrigin::Missing { path } => {
            tracing::debug!(
                "Advisory mapping {} not found, using empty mapping",
                path.display()
            );
        }
        MappingOrigin::Unreadable { path, reason } => {
            tracing::warn!(
                "Advisory mapping {} unreadable, using empty mapping: {}",
                path.display(),
                reason
            );
        }
        MappingOrigin::Inline => {}
    }
}
