//! The validated, immutable route to the upstream target.

use std::path::PathBuf;

/// How the inbound path is mapped onto the upstream path.
///
/// Exactly one strategy is chosen when the configuration is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRewrite {
    /// Address the target root; the inbound path is discarded.
    StripAll,
    /// Replace every occurrence of `from` with `to`.
    Substitute { from: String, to: String },
    /// Forward the inbound path unchanged.
    PassThrough,
}

impl PathRewrite {
    /// Apply the strategy to an inbound path.
    ///
    /// Returns `None` when no path should be appended at all.
    pub fn apply<'a>(&self, path: &'a str) -> Option<std::borrow::Cow<'a, str>> {
        match self {
            PathRewrite::StripAll => None,
            PathRewrite::Substitute { from, to } if path.contains(from.as_str()) => {
                Some(path.replace(from.as_str(), to).into())
            }
            PathRewrite::Substitute { .. } | PathRewrite::PassThrough => Some(path.into()),
        }
    }
}

/// Username and password sent preemptively to the target.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Process-wide routing configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Target host name (never empty).
    pub target_host: String,
    /// Target port; omitted from the authority when it is 80.
    pub target_port: u16,
    /// Talk https to the target.
    pub use_tls: bool,
    /// Optional credentials for the target.
    pub credentials: Option<Credentials>,
    /// Prefix prepended to every upstream path.
    pub proxy_path_prefix: String,
    /// Prefix stripped from upstream redirect locations.
    pub redirect_path: String,
    /// Path rewrite strategy.
    pub path_rewrite: PathRewrite,
    /// Context path of the proxy as seen by callers.
    pub context_path: String,
    /// Per-item threshold above which uploads are spooled to disk.
    pub max_upload_bytes: usize,
    /// Directory for spooled uploads.
    pub upload_dir: PathBuf,
    /// Whether the upstream client follows redirects itself.
    pub follow_redirects: bool,
    /// Content type prefix whose bodies get the client origin rewritten.
    pub rewrite_mime_type: String,
    /// Configured forward types. Carried for completeness; not interpreted.
    pub forward_types: Vec<String>,
}

impl RouteConfig {
    /// A route to `host:port` with every other setting at its default.
    pub fn new(target_host: impl Into<String>, target_port: u16) -> Self {
        Self {
            target_host: target_host.into(),
            target_port,
            use_tls: false,
            credentials: None,
            proxy_path_prefix: String::new(),
            redirect_path: String::new(),
            path_rewrite: PathRewrite::PassThrough,
            context_path: String::new(),
            max_upload_bytes: 5 * 1024 * 1024,
            upload_dir: std::env::temp_dir(),
            follow_redirects: false,
            rewrite_mime_type: crate::config::schema::DEFAULT_REWRITE_MIME_TYPE.to_string(),
            forward_types: Vec::new(),
        }
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// `targetHost`, or `targetHost:targetPort` when the port is not 80.
    pub fn target_authority(&self) -> String {
        host_and_port(&self.target_host, self.target_port)
    }
}

/// Render `host[:port]`, omitting the port when it is 80.
pub fn host_and_port(host: &str, port: u16) -> String {
    if port == 80 {
        host.to_string()
    } else {
        format!("{host}:{port}")
    }
}
