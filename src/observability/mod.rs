//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler and translator produce:
//!     → logging.rs (structured tracing events, request_id on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (when enabled)
//! ```

pub mod logging;
pub mod metrics;
