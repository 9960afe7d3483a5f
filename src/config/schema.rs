//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URLs of the remote services.
    pub endpoints: EndpointConfig,

    /// Verification delay and bounded poll settings.
    pub timing: TimingConfig,

    /// HTTP client timeouts.
    pub timeouts: TimeoutConfig,

    /// Chain RPC endpoints used by wallet flows.
    pub chains: ChainsConfig,

    /// Relay bridge settings.
    pub bridge: BridgeConfig,

    /// XMTP messaging settings.
    pub messaging: MessagingConfig,

    /// Credential store location.
    pub credentials: CredentialStoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Base URLs for every remote API the agent talks to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Warpcast API (direct casts).
    pub warpcast_api: String,

    /// Neynar REST API (channel and group lookups).
    pub neynar_api: String,

    /// Farcaster hub HTTP API (message submission and reads).
    pub hub_api: String,

    /// Relay.link API (bridge quotes and intent status).
    pub relay_api: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            warpcast_api: "https://api.warpcast.com".to_string(),
            neynar_api: "https://api.neynar.com".to_string(),
            hub_api: "https://hub-api.neynar.com".to_string(),
            relay_api: "https://api.relay.link".to_string(),
        }
    }
}

/// Delays for eventual-consistency checks.
///
/// The defaults are the values the agent has always used; they are not tied
/// to any documented propagation latency of the remote services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait between a successful submit and the verification read.
    pub verify_delay_ms: u64,

    /// Maximum number of status queries in a bounded poll.
    pub poll_max_attempts: u32,

    /// Wait before each status query in a bounded poll.
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            verify_delay_ms: 2000,
            poll_max_attempts: 60,
            poll_interval_ms: 5000,
        }
    }
}

impl TimingConfig {
    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Timeout configuration for the HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 30,
        }
    }
}

/// RPC endpoint for a single chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainEndpoint {
    /// Chain ID (e.g., 8453 for Base, 10 for Optimism).
    pub chain_id: u64,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainsConfig {
    /// Known chains.
    pub endpoints: Vec<ChainEndpoint>,

    /// Fallback RPC for chains not listed above.
    pub fallback_rpc_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                ChainEndpoint {
                    chain_id: 8453,
                    rpc_url: "https://mainnet.base.org".to_string(),
                    failover_urls: Vec::new(),
                },
                ChainEndpoint {
                    chain_id: 10,
                    rpc_url: "https://mainnet.optimism.io".to_string(),
                    failover_urls: Vec::new(),
                },
                ChainEndpoint {
                    chain_id: 1,
                    rpc_url: "https://eth.llamarpc.com".to_string(),
                    failover_urls: Vec::new(),
                },
            ],
            fallback_rpc_url: "https://eth.llamarpc.com".to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

impl ChainsConfig {
    /// Endpoint for a chain, falling back to `fallback_rpc_url`.
    pub fn endpoint(&self, chain_id: u64) -> ChainEndpoint {
        self.endpoints
            .iter()
            .find(|e| e.chain_id == chain_id)
            .cloned()
            .unwrap_or_else(|| ChainEndpoint {
                chain_id,
                rpc_url: self.fallback_rpc_url.clone(),
                failover_urls: Vec::new(),
            })
    }
}

/// Relay bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Gas limit for the bridge deposit transaction.
    pub gas_limit: u64,

    /// Multiplier applied to the quoted fee caps.
    pub fee_multiplier: u64,

    /// Amount bridged when none is given on the command line.
    pub default_amount_eth: String,

    /// Origin chain when none is given.
    pub default_origin_chain: u64,

    /// Destination chain when none is given.
    pub default_destination_chain: u64,

    /// Seconds to wait for the deposit receipt.
    pub receipt_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            gas_limit: 100_000,
            fee_multiplier: 2,
            default_amount_eth: "0.0006".to_string(),
            default_origin_chain: 8453,
            default_destination_chain: 10,
            receipt_timeout_secs: 120,
        }
    }
}

/// XMTP network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum XmtpEnv {
    #[default]
    Production,
    Dev,
    Local,
}

impl XmtpEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            XmtpEnv::Production => "production",
            XmtpEnv::Dev => "dev",
            XmtpEnv::Local => "local",
        }
    }
}

impl std::str::FromStr for XmtpEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "dev" => Ok(Self::Dev),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown XMTP environment '{}'", other)),
        }
    }
}

/// XMTP messaging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Network environment.
    pub env: XmtpEnv,

    /// Directory holding database keys and local databases.
    pub data_dir: PathBuf,

    /// App version reported to the network.
    pub app_version: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            env: XmtpEnv::Production,
            data_dir: PathBuf::from(".xmtp-data"),
            app_version: "farcaster-agent/1.0".to_string(),
        }
    }
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialStoreConfig {
    /// Path of the JSON credential store.
    pub store_path: PathBuf,
}

impl Default for CredentialStoreConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(".farcaster-agent/credentials.json"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Print raw response bodies after formatted output.
    pub debug: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
        }
    }
}
