use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vulnlens
#[derive(Error, Debug)]
pub enum VulnError {
    /// Identifier does not have the `<prefix>-<year>-<sequence>` shape
    #[error("Invalid vulnerability identifier format: {id}")]
    InvalidIdentifierFormat { id: String },

    /// No record stored for the identifier
    #[error("CVE {id} not found")]
    NotFound { id: String, path: PathBuf },

    /// Stored record is not a valid JSON object
    #[error("Corrupt record for {id} at {path:?}: {source}")]
    CorruptRecord {
        id: String,
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Advisory identifier missing from the mapping
    #[error("Advisory {id} not found")]
    UnknownAdvisory { id: String },

    /// Request reduced to an empty identifier list
    #[error("No valid vulnerability identifiers provided")]
    NoValidIdentifiers,

    /// Uploaded report is not UTF-8
    #[error("Failed to decode report as UTF-8: {source}")]
    Decode { source: std::str::Utf8Error },

    /// Uploaded report could not be parsed as delimited text
    #[error("Malformed report: {detail}")]
    MalformedTable { detail: String },

    /// No column of the report contains a CVE or RHSA identifier
    #[error("No CVE or RHSA identifiers found in any column")]
    NoIdentifiersFound,

    /// Every identifier in the report was an unknown advisory
    #[error("No valid CVE identifiers remain after advisory mapping")]
    NoValidIdentifiersAfterMapping,

    /// Multipart upload could not be decoded
    #[error("Invalid upload: {detail}")]
    InvalidUpload { detail: String },

    /// Upload exceeds the configured limit
    #[error("Payload too large: {size} bytes (max: {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// CSV serialization errors
    #[error("CSV error: {context}: {source}")]
    Csv {
        source: csv::Error,
        context: String,
    },
}

impl VulnError {
    /// HTTP status code reported to API callers for this error
    pub fn status_code(&self) -> u16 {
        match self {
            VulnError::InvalidIdentifierFormat { .. }
            | VulnError::NoValidIdentifiers
            | VulnError::Decode { .. }
            | VulnError::MalformedTable { .. }
            | VulnError::InvalidUpload { .. }
            | VulnError::NoIdentifiersFound
            | VulnError::NoValidIdentifiersAfterMapping => 400,
            VulnError::NotFound { .. } | VulnError::UnknownAdvisory { .. } => 404,
            VulnError::PayloadTooLarge { .. } => 413,
            _ => 500,
        }
    }

    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message for logs, including the file looked up when a record is missing
    pub fn log_message(&self) -> String {
        match self {
            VulnError::NotFound { path, .. } => {
                format!("{} (looked in {})", self, path.display())
            }
            _ => self.to_string(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for vulnlens operations
pub type Result<T> = std::result::Result<T, VulnError>;
