//! Command-line surface of the `farcaster-agent` binary.
//!
//! Positional arguments carry targets and content; credentials come from
//! the environment (or the credential store) and never from flags.

pub mod commands;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use commands::run;

#[derive(Parser, Debug)]
#[command(name = "farcaster-agent", version)]
#[command(about = "Post casts, send messages and bridge funds from the command line", long_about = None)]
pub struct Cli {
    /// TOML config file (defaults to $FARCASTER_AGENT_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish casts through a hub
    #[command(subcommand)]
    Cast(CastCommand),
    /// Look up channels
    #[command(subcommand)]
    Channel(ChannelCommand),
    /// Look up Warpcast groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Warpcast direct casts
    #[command(subcommand)]
    Dm(DmCommand),
    /// Wallet-to-wallet XMTP messaging
    #[command(subcommand)]
    Xmtp(XmtpCommand),
    /// Bridge native currency between chains via Relay
    Bridge(BridgeArgs),
    /// Saved accounts
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Subcommand, Debug)]
pub enum CastCommand {
    /// Cast into a channel
    Channel {
        channel_id: String,
        text: String,
        /// URL to embed (repeatable)
        #[arg(long = "embed")]
        embeds: Vec<String>,
        /// Reuse a key from an earlier attempt
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Cast into a Warpcast group
    Group {
        group_id: String,
        text: String,
        #[arg(long = "embed")]
        embeds: Vec<String>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Check whether a hub has a cast
    Verify { fid: u64, hash: String },
}

#[derive(Subcommand, Debug)]
pub enum ChannelCommand {
    Info { id: String },
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    Info {
        id: String,
    },
    Feed {
        id: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum DmCommand {
    /// Send a direct cast
    #[command(subcommand)]
    Send(DmTarget),
    /// List inbox conversations
    Inbox {
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Read one conversation
    Conversation {
        id: String,
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DmTarget {
    User {
        fid: u64,
        message: String,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    Conversation {
        id: String,
        message: String,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum XmtpCommand {
    /// Whether an address can receive XMTP messages
    Check { address: String },
    /// Send a DM to an address
    Dm { address: String, message: String },
    /// Send to a group you belong to
    Group { group_id: String, message: String },
    /// Create a group from comma-separated addresses
    CreateGroup {
        name: String,
        addresses: String,
        message: Option<String>,
    },
    /// List conversations
    List,
    /// Read recent messages
    Read {
        conversation_id: String,
        limit: Option<usize>,
    },
    /// Print incoming messages until Ctrl-C
    Stream,
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Amount in ether (defaults to bridge.default_amount_eth)
    pub amount: Option<String>,
    /// Origin chain id
    pub from_chain: Option<u64>,
    /// Destination chain id
    pub to_chain: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Save the credentials currently in the environment
    Save {
        name: String,
        #[arg(long)]
        activate: bool,
    },
    List,
    /// Make a saved account active
    Use { name: String },
    /// Print the credential store location
    Path,
}
