//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs parse
//! - Validate value ranges (poll cap > 0, multipliers > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::AgentConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "endpoints.warpcast_api", &config.endpoints.warpcast_api);
    check_url(&mut errors, "endpoints.neynar_api", &config.endpoints.neynar_api);
    check_url(&mut errors, "endpoints.hub_api", &config.endpoints.hub_api);
    check_url(&mut errors, "endpoints.relay_api", &config.endpoints.relay_api);

    if config.timing.poll_max_attempts == 0 {
        errors.push(ValidationError::new(
            "timing.poll_max_attempts",
            "must be at least 1",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be positive"));
    }

    for (i, chain) in config.chains.endpoints.iter().enumerate() {
        check_url(&mut errors, &format!("chains.endpoints[{}].rpc_url", i), &chain.rpc_url);
    }
    check_url(&mut errors, "chains.fallback_rpc_url", &config.chains.fallback_rpc_url);

    if config.bridge.fee_multiplier == 0 {
        errors.push(ValidationError::new("bridge.fee_multiplier", "must be at least 1"));
    }
    if config.bridge.gas_limit < 21_000 {
        errors.push(ValidationError::new(
            "bridge.gas_limit",
            "must cover the 21000 base transaction cost",
        ));
    }
    if alloy::primitives::utils::parse_ether(&config.bridge.default_amount_eth).is_err() {
        errors.push(ValidationError::new(
            "bridge.default_amount_eth",
            format!("'{}' is not an ETH amount", config.bridge.default_amount_eth),
        ));
    }

    if config.messaging.app_version.trim().is_empty() {
        errors.push(ValidationError::new("messaging.app_version", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
