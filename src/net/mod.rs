//! Network layer.
//!
//! # Data Flow
//! ```text
//! TcpListener (bound in main.rs)
//!     → axum::serve accept loop
//!     → connection.rs (local + remote address per connection)
//!     → Hand off to HTTP layer
//! ```

pub mod connection;

pub use connection::ConnectionInfo;
