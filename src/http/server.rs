//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Buffer each inbound request and hand it to the translator
//! - Record per-request metrics and log the outcome
//! - Stop accepting on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        ConnectInfo, DefaultBodyLimit, State,
    },
    http::{HeaderMap, Method, Request, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{inbound_request, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::lifecycle::shutdown::wait_for;
use crate::net::ConnectionInfo;
use crate::observability::metrics;
use crate::proxy::{TranslateError, Translator};
use crate::routing::RouteConfig;
use crate::upstream::{ClientSettings, HttpUpstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator<HttpUpstream>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server and its upstream client for `route`.
    pub fn new(config: &ProxyConfig, route: RouteConfig) -> Result<Self, TranslateError> {
        let connect_timeout = match config.timeouts.connect_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = HttpUpstream::new(ClientSettings::for_route(&route, connect_timeout))?;

        let state = AppState {
            translator: Arc::new(Translator::new(Arc::new(route), client)),
            max_body_bytes: config.listener.max_body_bytes,
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let body_limit = state.max_body_bytes;

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<axum::body::Body>| {
                            tracing::info_span!(
                                "request",
                                request_id = %request.headers().request_id(),
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<ConnectionInfo>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(conn): ConnectInfo<ConnectionInfo>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id().to_string();
    let method_label = method.to_string();

    let body = match body {
        Ok(body) => body,
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
            let err = TranslateError::PayloadTooLarge {
                limit: state.max_body_bytes,
            };
            return failure(err, &request_id, &method_label, start);
        }
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                error = %rejection,
                "Failed to read request body"
            );
            let response = rejection.into_response();
            metrics::record_request(&method_label, response.status().as_u16(), start);
            return response;
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        remote = %conn.remote,
        "Proxying request"
    );

    let inbound = inbound_request(method, &uri, headers, body, &conn);

    match state.translator.translate(&inbound).await {
        Ok(response) => {
            let status = response.status.as_u16();
            tracing::info!(
                request_id = %request_id,
                method = %method_label,
                path = %inbound.path,
                status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            metrics::record_request(&method_label, status, start);
            response.into_response()
        }
        Err(err) => failure(err, &request_id, &method_label, start),
    }
}

fn failure(err: TranslateError, request_id: &str, method: &str, start: Instant) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(request_id = %request_id, kind = err.kind(), error = %err, "Translation failed");
    } else {
        tracing::warn!(request_id = %request_id, kind = err.kind(), error = %err, "Request rejected");
    }
    metrics::record_error(err.kind());
    metrics::record_request(method, status.as_u16(), start);
    err.into_response()
}
