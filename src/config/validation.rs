//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Select exactly one path rewrite strategy
//! - Validate value ranges (ports, sizes, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<RouteConfig, Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::routing::{Credentials, PathRewrite, RouteConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target.host must be set")]
    MissingTargetHost,

    #[error("target.port must be non-zero")]
    InvalidTargetPort,

    #[error("target.credentials must be in 'user:password' form")]
    MalformedCredentials,

    #[error("routing.remove_prefix cannot be combined with routing.source_path")]
    ConflictingPathRewrite,

    #[error("uploads.max_file_upload_size must be greater than zero")]
    InvalidUploadSize,

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate the file configuration and derive the immutable route from it.
pub fn validate_config(config: &ProxyConfig) -> Result<RouteConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let target_host = config.target.host.trim();
    if target_host.is_empty() {
        errors.push(ValidationError::MissingTargetHost);
    }
    if config.target.port == 0 {
        errors.push(ValidationError::InvalidTargetPort);
    }

    let credentials = match config.target.credentials.as_deref() {
        None | Some("") => None,
        Some(raw) => match parse_credentials(raw) {
            Some(creds) => Some(creds),
            None => {
                errors.push(ValidationError::MalformedCredentials);
                None
            }
        },
    };

    let routing = &config.routing;
    let path_rewrite = if routing.remove_prefix {
        if !routing.source_path.is_empty() {
            errors.push(ValidationError::ConflictingPathRewrite);
        }
        PathRewrite::StripAll
    } else if !routing.source_path.is_empty() {
        PathRewrite::Substitute {
            from: routing.source_path.clone(),
            to: routing.destination_path.clone(),
        }
    } else {
        PathRewrite::PassThrough
    };

    if config.uploads.max_file_upload_size == 0 {
        errors.push(ValidationError::InvalidUploadSize);
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let forward_types = routing
        .forward_types
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(RouteConfig {
        target_host: target_host.to_string(),
        target_port: config.target.port,
        use_tls: config.target.ssl,
        credentials,
        proxy_path_prefix: routing.prefix_path.clone(),
        redirect_path: routing
            .proxy_path
            .clone()
            .unwrap_or_else(|| routing.prefix_path.clone()),
        path_rewrite,
        context_path: config.listener.context_path.clone(),
        max_upload_bytes: config.uploads.max_file_upload_size,
        upload_dir: config
            .uploads
            .temp_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir),
        follow_redirects: routing.follow_redirects,
        rewrite_mime_type: routing.mime_type.clone(),
        forward_types,
    })
}

fn parse_credentials(raw: &str) -> Option<Credentials> {
    let (username, password) = raw.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.target.host = "api.internal".into();
        config
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let route = validate_config(&base_config()).unwrap();
        assert_eq!(route.target_host, "api.internal");
        assert_eq!(route.target_port, 80);
        assert_eq!(route.path_rewrite, PathRewrite::PassThrough);
        assert_eq!(route.rewrite_mime_type, "text/x-gwt-rpc");
        assert!(route.credentials.is_none());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.target.port = 0;
        config.target.credentials = Some("nocolon".into());
        config.uploads.max_file_upload_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingTargetHost,
                ValidationError::InvalidTargetPort,
                ValidationError::MalformedCredentials,
                ValidationError::InvalidUploadSize,
            ]
        );
    }

    #[test]
    fn test_rewrite_strategies_are_exclusive() {
        let mut config = base_config();
        config.routing.remove_prefix = true;
        assert_eq!(
            validate_config(&config).unwrap().path_rewrite,
            PathRewrite::StripAll
        );

        config.routing.source_path = "/ext".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ConflictingPathRewrite]
        );
    }

    #[test]
    fn test_password_may_contain_colon() {
        let mut config = base_config();
        config.target.credentials = Some("user:pa:ss".into());
        let creds = validate_config(&config).unwrap().credentials.unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn test_redirect_path_defaults_to_prefix() {
        let mut config = base_config();
        config.routing.prefix_path = "/v1".into();
        assert_eq!(validate_config(&config).unwrap().redirect_path, "/v1");

        config.routing.proxy_path = Some("/legacy".into());
        assert_eq!(validate_config(&config).unwrap().redirect_path, "/legacy");
    }

    #[test]
    fn test_forward_types_are_split() {
        let mut config = base_config();
        config.routing.forward_types = "text/html, application/json,,".into();
        assert_eq!(
            validate_config(&config).unwrap().forward_types,
            vec!["text/html".to_string(), "application/json".to_string()]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = base_config();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidAddress { field: "observability.metrics_address", .. }]
        ));
    }
}
