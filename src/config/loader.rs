//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::AgentConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_PATH_ENV_VAR: &str = "FARCASTER_AGENT_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let config: AgentConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration for one CLI invocation.
///
/// File selection: explicit path, else `FARCASTER_AGENT_CONFIG`, else
/// built-in defaults. Environment overrides (`XMTP_ENV`, `DEBUG`) are applied
/// last and the result is validated again.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    let env_path = std::env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from);
    let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
        Some(path) => load_config(&path)?,
        None => AgentConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides through a lookup function.
pub fn apply_env_overrides<F>(config: &mut AgentConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup("XMTP_ENV").filter(|v| !v.is_empty()) {
        config.messaging.env = env.parse().map_err(|message| {
            ConfigError::Validation(vec![ValidationError {
                field: "XMTP_ENV".to_string(),
                message,
            }])
        })?;
    }

    if let Some(debug) = lookup("DEBUG") {
        config.observability.debug = !matches!(debug.as_str(), "" | "0" | "false");
    }

    Ok(())
}
