//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RouteConfig (validated at startup)
//!     → route.rs (PathRewrite strategy, target authority)
//!     → url.rs (absolute upstream URL per request)
//! ```
//!
//! # Design Decisions
//! - A single fixed upstream target; no matching, no load balancing
//! - The rewrite strategy is a tagged variant chosen once, never a
//!   combination of independent flags

pub mod route;
pub mod url;

pub use route::{host_and_port, Credentials, PathRewrite, RouteConfig};
pub use url::{build_target_url, target_url_for};
