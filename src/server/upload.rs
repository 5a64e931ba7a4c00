//! Report upload decoding
//!
//! The browser client posts the report as a `multipart/form-data` form with
//! the file in the [`UPLOAD_FIELD`] field. Any other content type is taken
//! to be the CSV itself.

use crate::error::{Result, VulnError};
use mime::Mime;
use multipart::server::Multipart;
use std::borrow::Cow;
use std::io::Read;

/// Form field carrying the report in multipart uploads
pub const UPLOAD_FIELD: &str = "file";

/// Report bytes carried by a request body
pub fn report_bytes<'a>(content_type: Option<&str>, body: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    let parsed = match content_type.and_then(|ct| ct.parse::<Mime>().ok()) {
        Some(m) if m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA => m,
        _ => return Ok(Cow::Borrowed(body)),
    };

    let boundary = parsed
        .get_param(mime::BOUNDARY)
        .map(|b| b.as_str().trim_matches('"').to_string())
        .ok_or_else(|| VulnError::InvalidUpload {
            detail: "multipart body without boundary".to_string(),
        })?;

    extract_field(body, &boundary, UPLOAD_FIELD).map(Cow::Owned)
}

fn extract_field(body: &[u8], boundary: &str, name: &str) -> Result<Vec<u8>> {
    let invalid = |e: std::io::Error| VulnError::InvalidUpload {
        detail: e.to_string(),
    };

    let mut form = Multipart::with_body(body, boundary);
    while let Some(mut field) = form.read_entry().map_err(invalid)? {
        if &*field.headers.name == name {
            let mut data = Vec::new();
            field.data.read_to_end(&mut data).map_err(invalid)?;
            return Ok(data);
        }
    }

    Err(VulnError::InvalidUpload {
        detail: format!("form has no '{}' field", name),
    })
}
