//! Caching reverse proxy library.
//!
//! Sits in front of an origin server and persists successful responses to a
//! content-addressed on-disk cache keyed by URL (and request body for POST).
//! Three run modes share one request pipeline:
//!
//! - `proxy`: always fetch from the origin, cache GET/POST responses as a
//!   side effect.
//! - `local`: serve purely from cache, 404 on miss, never touch the origin.
//! - `hybrid`: cache first, fall back to the origin on miss and cache the
//!   result.

pub mod cache;
pub mod config;
pub mod handlers;
pub mod http;
pub mod origin;

pub use config::schema::MirrorConfig;
pub use handlers::Dispatcher;
pub use http::HttpServer;
