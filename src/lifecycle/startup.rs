//! Startup for one CLI invocation.
//!
//! Config first (file, environment overrides, validation), then logging.
//! Any failure here is fatal and happens before a network call.

use std::path::Path;

use crate::config::{resolve_config, AgentConfig, ConfigError};
use crate::observability::logging;

/// Resolve and validate configuration, then install logging.
pub fn bootstrap(config_path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    let config = resolve_config(config_path)?;
    logging::init(&config.observability);

    tracing::debug!(
        hub_api = %config.endpoints.hub_api,
        xmtp_env = config.messaging.env.as_str(),
        verify_delay_ms = config.timing.verify_delay_ms,
        poll_max_attempts = config.timing.poll_max_attempts,
        "Configuration loaded"
    );

    Ok(config)
}
