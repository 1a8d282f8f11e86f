//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, with
//! defaults so a minimal file (or none at all) is enough to run in proxy
//! mode against a configured origin.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How requests are routed, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Always fetch from the origin; cache GET/POST responses as a side
    /// effect.
    #[default]
    Proxy,
    /// Serve purely from cache; 404 on miss, no origin traffic.
    Local,
    /// Cache first, fetch-and-store on miss.
    Hybrid,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Proxy => "proxy",
            RunMode::Local => "local",
            RunMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MirrorConfig {
    pub mode: RunMode,

    pub listener: ListenerConfig,

    pub origin: OriginConfig,

    pub cache: CacheConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum inbound request body size in bytes. Bodies are fully buffered
    /// (POST keys depend on the whole body), so this bounds memory per
    /// request.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin (required for proxy and hybrid modes). In
    /// local mode it only anchors cache key derivation and defaults to
    /// `http://localhost`.
    pub base_url: Option<String>,
}

/// Cache storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory, created at startup if absent.
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./cache"),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total origin request timeout in seconds. Also bounds the inbound
    /// request through the server timeout layer.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
