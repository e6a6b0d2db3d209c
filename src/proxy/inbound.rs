//! The inbound request as seen by the translator.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;

/// One request received from a caller, fully buffered.
///
/// Besides the request itself this carries the caller-facing identity of the
/// proxy (`server_*`, derived from the `Host` header) and the local socket the
/// request arrived on (`local_*`).
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Request path, exactly as received.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub server_name: String,
    pub server_port: u16,
    pub local_name: String,
    pub local_port: u16,
}

impl InboundRequest {
    /// A bodiless request for `path_and_query`, as if received on
    /// `localhost:80`.
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path_and_query.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            server_name: "localhost".to_string(),
            server_port: 80,
            local_name: "127.0.0.1".to_string(),
            local_port: 80,
        }
    }

    /// A GET request for `path_and_query`.
    pub fn get(path_and_query: &str) -> Self {
        Self::new(Method::GET, path_and_query)
    }

    /// A POST request for `path_and_query`.
    pub fn post(path_and_query: &str) -> Self {
        Self::new(Method::POST, path_and_query)
    }

    /// Append a header value.
    pub fn with_header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.append(name, HeaderValue::from_static(value));
        self
    }

    /// Replace the buffered body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The raw `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// The charset declared in the content type, if any.
    pub fn character_encoding(&self) -> Option<String> {
        let mime: mime::Mime = self.content_type()?.parse().ok()?;
        mime.get_param(mime::CHARSET).map(|c| c.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_path_and_query() {
        let req = InboundRequest::get("/a/b?x=1&y=2");
        assert_eq!(req.path, "/a/b");
        assert_eq!(req.query.as_deref(), Some("x=1&y=2"));

        let req = InboundRequest::get("/a");
        assert_eq!(req.query, None);
    }

    #[test]
    fn test_character_encoding_from_content_type() {
        let req = InboundRequest::post("/")
            .with_header(header::CONTENT_TYPE, "text/plain; charset=UTF-8");
        assert!(req.character_encoding().unwrap().eq_ignore_ascii_case("utf-8"));

        let req = InboundRequest::post("/").with_header(header::CONTENT_TYPE, "application/json");
        assert_eq!(req.character_encoding(), None);
        assert_eq!(req.content_type(), Some("application/json"));
    }
}
