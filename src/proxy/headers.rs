//! Request header forwarding.
//!
//! Every inbound value is forwarded as its own entry (never comma-joined),
//! except `Content-Length`, which is recomputed for the outbound body, and
//! `Host`, which is pointed at the target.

use axum::http::{header, HeaderMap, HeaderValue};

/// Copy `inbound` headers onto `outbound`, rewriting `Host` to
/// `target_authority`.
pub fn forward_headers(inbound: &HeaderMap, outbound: &mut HeaderMap, target_authority: &HeaderValue) {
    for (name, value) in inbound.iter() {
        if name == header::CONTENT_LENGTH {
            continue;
        }
        if name == header::HOST {
            outbound.append(name.clone(), target_authority.clone());
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
}
