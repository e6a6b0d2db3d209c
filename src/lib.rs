//! Reverse HTTP proxy with request and response rewriting.
//!
//! Every inbound request is translated for one fixed target: the path is
//! remapped, headers are forwarded with `Host` rewritten, POST-like bodies are
//! re-encoded (form, multipart or raw text) and the target's response is
//! mapped back, with redirects pointed at the proxy and gzip bodies inflated.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{TranslateError, Translator};
pub use routing::RouteConfig;
