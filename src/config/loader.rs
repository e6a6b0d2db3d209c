//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::RouteConfig;

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Returns the raw file configuration alongside the immutable route it
/// describes.
pub fn load_config(path: &Path) -> Result<(ProxyConfig, RouteConfig), ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<(ProxyConfig, RouteConfig), ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    let route = validate_config(&config).map_err(ConfigError::Validation)?;
    Ok((config, route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PathRewrite;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [target]
            host = "api.internal"
            port = 9000
            credentials = "svc:s3cret"

            [routing]
            prefix_path = "/v1"
            source_path = "/ext"
            destination_path = "/int"
            "#
        )
        .unwrap();

        let (config, route) = load_config(file.path()).unwrap();
        assert_eq!(config.target.host, "api.internal");
        assert_eq!(route.target_authority(), "api.internal:9000");
        assert_eq!(
            route.path_rewrite,
            PathRewrite::Substitute {
                from: "/ext".into(),
                to: "/int".into()
            }
        );
        let creds = route.credentials.unwrap();
        assert_eq!(creds.username, "svc");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_non_numeric_port_is_parse_error() {
        let err = parse_config(
            r#"
            [target]
            host = "api.internal"
            port = "eighty"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_host_is_validation_error() {
        let err = parse_config("[target]\nport = 8080\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.contains(&ValidationError::MissingTargetHost));
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = parse_config("").unwrap_err().to_string();
        assert!(msg.starts_with("Validation failed: "));
    }
}
