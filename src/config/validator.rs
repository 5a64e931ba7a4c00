use crate::config::{parse_size, Config};
use crate::error::{Result, ValidationError, VulnError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_data(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(VulnError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_server(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.server.bind.trim().is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "Bind address cannot be empty",
            ));
        }

        if config.server.port == 0 {
            errors.push(ValidationError::new(
                "server.port",
                "Port must be greater than 0",
            ));
        }

        let size_str = &config.server.max_upload_size;
        match parse_size(size_str) {
            Some(0) => errors.push(ValidationError::new(
                "server.max_upload_size",
                "Upload limit must be greater than 0",
            )),
            Some(_) => {}
            None => errors.push(ValidationError::new(
                "server.max_upload_size",
                format!("Invalid size format: {}", size_str),
            )),
        }
    }

    fn validate_data(config: &Config, errors: &mut Vec<ValidationError>) {
        // Paths are not required to exist yet
        if config.data.records_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.records_dir",
                "Records directory cannot be empty",
            ));
        }

        if config.data.advisories_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.advisories_file",
                "Advisories file path cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_records_dir() {
        let mut config = Config::default();
        config.data.records_dir = PathBuf::new();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.server.port = 0;
        config.server.max_upload_size = "huge".to_string();
        config.meta.schema_version = "2.0.0".to_string();

        match ConfigValidator::validate(&config) {
            Err(VulnError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "_meta.schema_version",
                        "server.port",
                        "server.max_upload_size"
                    ]
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_upload_limit() {
        let mut config = Config::default();
        config.server.max_upload_size = "0MB".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
