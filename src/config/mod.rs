//! Process configuration: TOML schema, file loading, semantic validation.
//! Loaded once at startup and immutable afterwards; the run mode is never
//! renegotiated per request.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{MirrorConfig, RunMode};
pub use validation::validate_config;
