//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the caller sent none
//! - Derive the caller-facing server identity from `Host`
//! - Turn the request line, headers and buffered body into an
//!   [`InboundRequest`]

use axum::http::{header, uri::Authority, HeaderMap, HeaderName, Method, Request, Uri};
use bytes::Bytes;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::net::ConnectionInfo;
use crate::proxy::InboundRequest;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> &str {
        self.get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Host and port the caller addressed, from `Host` (or the URI authority for
/// absolute-form requests). Port defaults to 80.
fn server_identity(uri: &Uri, headers: &HeaderMap) -> Option<(String, u16)> {
    let authority = match headers.get(header::HOST) {
        Some(value) => value.to_str().ok()?.parse::<Authority>().ok()?,
        None => uri.authority()?.clone(),
    };
    Some((
        authority.host().to_string(),
        authority.port_u16().unwrap_or(80),
    ))
}

/// Build the translator's view of a request.
pub fn inbound_request(
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Bytes,
    conn: &ConnectionInfo,
) -> InboundRequest {
    let (server_name, server_port) =
        server_identity(uri, &headers).unwrap_or_else(|| (conn.local_name(), conn.local_port()));

    InboundRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
        server_name,
        server_port,
        local_name: conn.local_name(),
        local_port: conn.local_port(),
    }
}
