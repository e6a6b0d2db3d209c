//! Response translation.
//!
//! Maps an [`UpstreamResponse`] onto the response delivered to the caller:
//!
//! ```text
//! 300..=303  → redirect rewritten to the proxy (or legacy gzip echo)
//! 304        → Content-Length: 0, nothing else
//! otherwise  → status + filtered headers + body (gunzipped when flagged
//!               and a body is present)
//! ```

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::proxy::error::TranslateError;
use crate::proxy::gzip::gunzip;
use crate::proxy::inbound::InboundRequest;
use crate::routing::{host_and_port, RouteConfig};
use crate::upstream::UpstreamResponse;

const GZIP: &str = "gzip";
const CHUNKED: &str = "chunked";

/// The response handed back to the caller.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ClientResponse {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Translate the upstream reply for the caller of `inbound`.
pub fn translate_response(
    upstream: UpstreamResponse,
    inbound: &InboundRequest,
    route: &RouteConfig,
) -> Result<ClientResponse, TranslateError> {
    let status = upstream.status;

    if is_rewritable_redirect(status) {
        let location = location(&upstream)?;

        if !route.follow_redirects {
            if status == StatusCode::FOUND && has_gzip_value(&upstream.headers) {
                return Ok(legacy_gzip_echo(&upstream.headers, location));
            }

            let rewritten = rewrite_location(location, inbound, route);
            tracing::debug!(
                status = status.as_u16(),
                location = %location,
                rewritten = %rewritten,
                "Rewriting upstream redirect"
            );
            return redirect_to(&rewritten);
        }
    } else if status == StatusCode::NOT_MODIFIED {
        let mut response = ClientResponse::empty(status);
        response
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
        return Ok(response);
    }

    let mut headers = HeaderMap::with_capacity(upstream.headers.len());
    copy_response_headers(&upstream.headers, &mut headers);

    let inflate = has_gzip_value(&upstream.headers)
        && carries_body(&inbound.method, status)
        && !upstream.body.is_empty();

    let body = if inflate {
        let decoded = gunzip(&upstream.body)?;
        tracing::trace!(
            compressed = upstream.body.len(),
            decompressed = decoded.len(),
            "Decompressed upstream body"
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(decoded.len()));
        Bytes::from(decoded)
    } else {
        upstream.body
    };

    Ok(ClientResponse {
        status,
        headers,
        body,
    })
}

/// 300 through 303. 304 has its own handling and 307/308 pass through.
fn is_rewritable_redirect(status: StatusCode) -> bool {
    (300..304).contains(&status.as_u16())
}

/// HEAD replies and 1xx, 204 and 304 statuses never carry a body, whatever
/// their headers announce.
fn carries_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !status.is_informational()
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

fn location(upstream: &UpstreamResponse) -> Result<&str, TranslateError> {
    let value = upstream.headers.get(header::LOCATION).ok_or_else(|| {
        TranslateError::Protocol(format!(
            "Received status code: {} but no Location header was found in the response",
            upstream.status.as_u16()
        ))
    })?;
    value
        .to_str()
        .map_err(|e| TranslateError::Protocol(format!("unreadable Location header: {e}")))
}

/// Point an upstream redirect target back at the proxy.
pub fn rewrite_location(location: &str, inbound: &InboundRequest, route: &RouteConfig) -> String {
    let caller_host = format!(
        "{}{}",
        host_and_port(&inbound.server_name, inbound.server_port),
        route.context_path
    );
    let upstream_base = format!("{}{}", route.target_authority(), route.redirect_path);
    location.replace(&upstream_base, &caller_host)
}

fn redirect_to(location: &str) -> Result<ClientResponse, TranslateError> {
    let value = HeaderValue::from_str(location)
        .map_err(|e| TranslateError::Protocol(format!("invalid redirect location: {e}")))?;
    let mut response = ClientResponse::empty(StatusCode::FOUND);
    response.headers.insert(header::LOCATION, value);
    Ok(response)
}

/// Legacy integration quirk: a gzip-flagged 302 is answered with a 200 whose
/// body is the redirect target, so the caller can follow it itself.
fn legacy_gzip_echo(upstream_headers: &HeaderMap, location: &str) -> ClientResponse {
    let mut headers = HeaderMap::with_capacity(upstream_headers.len());
    copy_response_headers(upstream_headers, &mut headers);

    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(header::LOCATION, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(location.len()));

    tracing::debug!(location = %location, "Echoing gzip-flagged redirect as body");
    ClientResponse {
        status: StatusCode::OK,
        headers,
        body: Bytes::copy_from_slice(location.as_bytes()),
    }
}

/// Copy every header except `Transfer-Encoding: chunked` and
/// `Content-Encoding: gzip`. Repeated headers stay repeated.
fn copy_response_headers(upstream: &HeaderMap, client: &mut HeaderMap) {
    for (name, value) in upstream.iter() {
        let skip = (name == header::TRANSFER_ENCODING && value == CHUNKED)
            || (name == header::CONTENT_ENCODING && value == GZIP);
        if !skip {
            client.append(name.clone(), value.clone());
        }
    }
}

/// True when any header value is exactly `gzip`.
fn has_gzip_value(headers: &HeaderMap) -> bool {
    headers.values().any(|v| v == GZIP)
}
