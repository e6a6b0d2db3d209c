//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default MIME type whose payloads get the client origin rewritten.
pub const DEFAULT_REWRITE_MIME_TYPE: &str = "text/x-gwt-rpc";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// The single upstream target.
    pub target: TargetConfig,

    /// Path and payload rewriting.
    pub routing: RoutingConfig,

    /// Multipart upload handling.
    pub uploads: UploadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Context path the proxy is mounted under, as seen by callers.
    /// Used when rewriting upstream redirects.
    pub context_path: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            context_path: String::new(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Target host name. Required.
    pub host: String,

    /// Target port.
    pub port: u16,

    /// Use https towards the target (accepting any certificate).
    pub ssl: bool,

    /// Optional credentials in `user:password` form.
    pub credentials: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 80,
            ssl: false,
            credentials: None,
        }
    }
}

/// Path and payload rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefix prepended to every upstream path.
    pub prefix_path: String,

    /// Prefix stripped from upstream redirect locations.
    /// Falls back to `prefix_path` when unset.
    pub proxy_path: Option<String>,

    /// Drop the inbound path entirely and address the target root.
    pub remove_prefix: bool,

    /// Path fragment replaced by `destination_path`.
    pub source_path: String,

    /// Replacement for `source_path`.
    pub destination_path: String,

    /// Content type prefix whose bodies get the client origin rewritten.
    pub mime_type: String,

    /// Comma-separated content types (carried, not interpreted).
    pub forward_types: String,

    /// Let the upstream client follow redirects itself.
    pub follow_redirects: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            prefix_path: String::new(),
            proxy_path: None,
            remove_prefix: false,
            source_path: String::new(),
            destination_path: String::new(),
            mime_type: DEFAULT_REWRITE_MIME_TYPE.to_string(),
            forward_types: String::new(),
            follow_redirects: false,
        }
    }
}

/// Multipart upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Items larger than this many bytes are spooled to disk.
    pub max_file_upload_size: usize,

    /// Directory for spooled items. Defaults to the OS temp dir.
    pub temp_dir: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_upload_size: 5 * 1024 * 1024, // 5MB
            temp_dir: None,
        }
    }
}

/// Timeout configuration for the upstream client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds (0 disables).
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
