//! Static files for the browser upload page

use crate::error::{Result, VulnError};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Page served for `GET /`
pub const INDEX_FILE: &str = "index.html";

/// A file read from the static directory
#[derive(Debug, Clone)]
pub struct Asset {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Read-only view of the static directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a file by its path relative to the root.
    ///
    /// Returns `Ok(None)` for missing files, directories and any path that
    /// would leave the root.
    pub fn load(&self, relative: &str) -> Result<Option<Asset>> {
        if self.root.as_os_str().is_empty() {
            return Ok(None);
        }

        let relative = Path::new(relative);
        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Ok(None);
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            return Ok(None);
        }

        match std::fs::read(&path) {
            Ok(body) => Ok(Some(Asset {
                content_type: content_type(&path),
                path,
                body,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VulnError::Io {
                source: e,
                context: format!("Failed to read static file: {}", path.display()),
            }),
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
