//! Upstream URL construction.
//!
//! The inbound path and query are passed through byte-for-byte; nothing is
//! percent-decoded or re-encoded here.

use crate::proxy::inbound::InboundRequest;
use crate::routing::route::RouteConfig;

/// Compute the absolute upstream URL for an inbound request.
pub fn build_target_url(inbound: &InboundRequest, route: &RouteConfig) -> String {
    target_url_for(&inbound.path, inbound.query.as_deref(), route)
}

/// Compute the absolute upstream URL for a raw path and query.
pub fn target_url_for(path: &str, query: Option<&str>, route: &RouteConfig) -> String {
    let mut url = format!("{}://{}", route.scheme(), route.target_authority());

    if let Some(rewritten) = route.path_rewrite.apply(path) {
        url.push_str(&route.proxy_path_prefix);
        url.push_str(&rewritten);
    }

    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }

    url
}
