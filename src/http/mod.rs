//! HTTP surface of the proxy.
//!
//! # Data Flow
//! ```text
//! inbound connection
//!     → server.rs (axum catch-all, body buffered once, dispatcher call)
//!     → handlers decide cache/origin
//!     → headers.rs (hop-specific header cleanup, Location rewriting)
//!     → response.rs (MIME fallback, axum response)
//! ```

pub mod headers;
pub mod response;
pub mod server;
pub mod url;

pub use response::Outbound;
pub use server::HttpServer;
