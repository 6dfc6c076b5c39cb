//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, token TTL within service limits)
//! - Check that at least one deadline-bearing path is watched
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::WatchConfig;
use crate::signal::SignalKind;

/// Longest session token lifetime the metadata service grants.
pub const MAX_TOKEN_TTL_SECS: u64 = 21600;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("metadata.endpoint '{0}' is not a valid http(s) URL")]
    InvalidEndpoint(String),

    #[error("metadata.token_ttl_secs must be between 1 and 21600, got {0}")]
    TokenTtlOutOfRange(u64),

    #[error("metadata.fetch_timeout_secs must be greater than zero")]
    ZeroFetchTimeout,

    #[error("poller.poll_interval_secs must be greater than zero")]
    ZeroPollInterval,

    #[error("poller.paths must not be empty")]
    NoPaths,

    #[error("poller.paths contains an empty path")]
    EmptyPath,

    #[error("poller.paths lists '{0}' more than once")]
    DuplicatePath(String),

    #[error("poller.paths has no instance-action path; no deadline can ever be observed")]
    NoActionPath,

    #[error("actions.command_timeout_secs must be greater than zero")]
    ZeroCommandTimeout,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &WatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.metadata.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidEndpoint(
            config.metadata.endpoint.clone(),
        )),
    }

    let ttl = config.metadata.token_ttl_secs;
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
        errors.push(ValidationError::TokenTtlOutOfRange(ttl));
    }

    if config.metadata.fetch_timeout_secs == 0 {
        errors.push(ValidationError::ZeroFetchTimeout);
    }

    if config.poller.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    let paths = &config.poller.paths;
    if paths.is_empty() {
        errors.push(ValidationError::NoPaths);
    } else {
        let mut seen = HashSet::new();
        for entry in paths {
            let trimmed = entry.path.trim_matches('/');
            if trimmed.is_empty() {
                errors.push(ValidationError::EmptyPath);
            } else if !seen.insert(trimmed) {
                errors.push(ValidationError::DuplicatePath(trimmed.to_string()));
            }
        }
        if !paths.iter().any(|p| p.kind == SignalKind::Action) {
            errors.push(ValidationError::NoActionPath);
        }
    }

    if config.actions.command_timeout_secs == 0 {
        errors.push(ValidationError::ZeroCommandTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
