//! Semantic configuration validation. Serde handles the syntactic layer;
//! this collects every semantic problem instead of stopping at the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::{MirrorConfig, RunMode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("origin.base_url is required in {0} mode")]
    MissingOriginUrl(RunMode),

    #[error("origin.base_url is not a valid http(s) url: {0}")]
    InvalidOriginUrl(String),

    #[error("listener.bind_address is not a valid socket address: {0}")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

pub fn validate_config(config: &MirrorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match &config.origin.base_url {
        Some(base_url) => {
            let valid = Url::parse(base_url)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
                .unwrap_or(false);
            if !valid {
                errors.push(ValidationError::InvalidOriginUrl(base_url.clone()));
            }
        }
        None if config.mode != RunMode::Local => {
            errors.push(ValidationError::MissingOriginUrl(config.mode));
        }
        None => {}
    }

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
