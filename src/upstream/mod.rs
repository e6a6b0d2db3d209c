//! Outbound side of the proxy.
//!
//! # Data Flow
//! ```text
//! Translator
//!     → UpstreamRequest (method, absolute URL, headers, optional body)
//!     → UpstreamClient::execute (client.rs, one exchange, no retries)
//!     → UpstreamResponse (status, headers, fully buffered body)
//! ```

pub mod client;

use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;

use crate::proxy::error::TranslateError;
use crate::routing::{Credentials, RouteConfig};

pub use client::HttpUpstream;

/// A fully prepared request to the target.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// `None` for bodiless methods.
    pub body: Option<Bytes>,
}

/// The target's reply, buffered in full.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Executes one request against the target.
///
/// Implementations must not follow redirects unless configured to, and must
/// not transparently decompress response bodies.
pub trait UpstreamClient: Send + Sync + 'static {
    fn execute(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, TranslateError>> + Send;
}

/// How the target's TLS certificate is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsTrust {
    /// Standard certificate verification.
    #[default]
    Verify,
    /// Accept any certificate. Only for targets with self-signed certificates.
    AcceptAny,
}

/// Settings for building an [`HttpUpstream`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// `None` leaves connection establishment unbounded.
    pub connect_timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub tls_trust: TlsTrust,
    pub credentials: Option<Credentials>,
}

impl ClientSettings {
    /// Settings for talking to the target of `route`.
    ///
    /// TLS targets are trusted unconditionally.
    pub fn for_route(route: &RouteConfig, connect_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            follow_redirects: route.follow_redirects,
            tls_trust: if route.use_tls {
                TlsTrust::AcceptAny
            } else {
                TlsTrust::Verify
            },
            credentials: route.credentials.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_follow_route() {
        let mut route = RouteConfig::new("secure.internal", 443);
        route.use_tls = true;
        route.follow_redirects = true;

        let settings = ClientSettings::for_route(&route, Some(Duration::from_secs(3)));
        assert_eq!(settings.tls_trust, TlsTrust::AcceptAny);
        assert!(settings.follow_redirects);
        assert!(settings.credentials.is_none());
        assert_eq!(settings.connect_timeout, Some(Duration::from_secs(3)));

        let plain = ClientSettings::for_route(&RouteConfig::new("h", 80), None);
        assert_eq!(plain.tls_trust, TlsTrust::Verify);
        assert!(!plain.follow_redirects);
    }
}
