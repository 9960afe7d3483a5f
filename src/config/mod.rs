//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!     → passed by reference into each flow constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; one config per CLI invocation
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - Credentials are NOT part of this config (see `credentials`)

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    AgentConfig, BridgeConfig, ChainEndpoint, ChainsConfig, CredentialStoreConfig, EndpointConfig,
    MessagingConfig,
    ObservabilityConfig, TimeoutConfig, TimingConfig, XmtpEnv,
};
pub use validation::ValidationError;
