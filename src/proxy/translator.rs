//! Per-request orchestration.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Method};

use crate::proxy::body::RequestBody;
use crate::proxy::error::TranslateError;
use crate::proxy::headers::forward_headers;
use crate::proxy::inbound::InboundRequest;
use crate::proxy::response::{translate_response, ClientResponse};
use crate::routing::{build_target_url, RouteConfig};
use crate::upstream::{UpstreamClient, UpstreamRequest};

/// How a method is proxied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodKind {
    Bodiless,
    WithBody,
}

fn classify_method(method: &Method) -> Result<MethodKind, TranslateError> {
    match *method {
        Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS => Ok(MethodKind::Bodiless),
        Method::POST | Method::PUT | Method::PATCH => Ok(MethodKind::WithBody),
        _ => Err(TranslateError::MethodNotAllowed(method.clone())),
    }
}

/// Translates inbound requests into upstream exchanges for one route.
///
/// Holds no per-request state; one instance is shared by every request.
#[derive(Debug)]
pub struct Translator<C> {
    route: Arc<RouteConfig>,
    client: C,
}

impl<C: UpstreamClient> Translator<C> {
    /// Create a translator for `route` sending through `client`.
    pub fn new(route: Arc<RouteConfig>, client: C) -> Self {
        Self { route, client }
    }

    /// The route this translator serves.
    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    /// Run one full request/response cycle against the target.
    pub async fn translate(&self, inbound: &InboundRequest) -> Result<ClientResponse, TranslateError> {
        let kind = classify_method(&inbound.method)?;
        let route = &*self.route;

        let url = build_target_url(inbound, route);
        let authority = HeaderValue::from_str(&route.target_authority())
            .map_err(|e| TranslateError::Protocol(format!("invalid target authority: {e}")))?;

        let mut headers = HeaderMap::with_capacity(inbound.headers.len());
        forward_headers(&inbound.headers, &mut headers, &authority);

        let body = match kind {
            MethodKind::Bodiless => None,
            MethodKind::WithBody => {
                let decoded = RequestBody::decode(inbound, route).await?;
                tracing::debug!(kind = ?decoded.kind(), "Encoding request body");
                let encoded = decoded.encode().await?;
                encoded.apply_content_type(&mut headers)?;
                Some(encoded.bytes)
            }
        };

        tracing::debug!(
            method = %inbound.method,
            target_url = %url,
            body_bytes = body.as_ref().map_or(0, |b| b.len()),
            "Forwarding to target"
        );

        let upstream = self
            .client
            .execute(UpstreamRequest {
                method: inbound.method.clone(),
                url,
                headers,
                body,
            })
            .await?;

        tracing::trace!(status = upstream.status.as_u16(), "Target responded");
        translate_response(upstream, inbound, route)
    }
}
