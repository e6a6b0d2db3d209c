//! reqwest-backed upstream client.

use reqwest::{header::AUTHORIZATION, redirect, Client};

use crate::proxy::error::TranslateError;
use crate::routing::Credentials;
use crate::upstream::{ClientSettings, TlsTrust, UpstreamClient, UpstreamRequest, UpstreamResponse};

const MAX_FOLLOWED_REDIRECTS: usize = 10;

/// Shared HTTP client for the target. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpUpstream {
    /// Build the client from per-route settings.
    pub fn new(settings: ClientSettings) -> Result<Self, TranslateError> {
        let redirect_policy = if settings.follow_redirects {
            redirect::Policy::limited(MAX_FOLLOWED_REDIRECTS)
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(settings.tls_trust == TlsTrust::AcceptAny)
            .no_proxy()
            .build()
            .map_err(TranslateError::transport)?;

        Ok(Self {
            client,
            credentials: settings.credentials,
        })
    }
}

impl UpstreamClient for HttpUpstream {
    async fn execute(
        &self,
        mut request: UpstreamRequest,
    ) -> Result<UpstreamResponse, TranslateError> {
        // Configured credentials replace whatever the caller sent.
        if self.credentials.is_some() {
            request.headers.remove(AUTHORIZATION);
        }

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(TranslateError::transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(TranslateError::transport)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_target_is_transport_error() {
        let upstream = HttpUpstream::new(ClientSettings {
            connect_timeout: Some(Duration::from_millis(500)),
            follow_redirects: false,
            tls_trust: TlsTrust::Verify,
            credentials: None,
        })
        .unwrap();

        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = upstream
            .execute(UpstreamRequest {
                method: axum::http::Method::GET,
                url: format!("http://{addr}/"),
                headers: Default::default(),
                body: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
