//! Request/response translation subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (inbound.rs)
//!     → routing::url (target URL)
//!     → headers.rs (forwarded headers, Host rewritten)
//!     → body.rs / multipart.rs (POST, PUT, PATCH only)
//!     → UpstreamClient::execute
//!     → response.rs (redirects, 304, header filter, gzip.rs)
//!     → ClientResponse
//! ```
//!
//! translator.rs sequences the steps; every failure is a [`TranslateError`].

pub mod body;
pub mod error;
pub mod gzip;
pub mod headers;
pub mod inbound;
pub mod multipart;
pub mod response;
pub mod translator;

pub use error::TranslateError;
pub use inbound::InboundRequest;
pub use response::ClientResponse;
pub use translator::Translator;
