//! Command execution.
//!
//! Each handler resolves the credentials it needs before its first network
//! call, so a missing key fails fast with guidance.

use alloy::primitives::utils::parse_ether;
use serde_json::json;

use crate::blockchain::BlockchainClient;
use crate::bridge::{RelayBridge, RelayClient};
use crate::cli::output::{self, DirectCastReport};
use crate::cli::{
    AccountCommand, BridgeArgs, CastCommand, ChannelCommand, Commands, DmCommand, DmTarget, GroupCommand,
    XmtpCommand,
};
use crate::config::AgentConfig;
use crate::credentials::{self, CredentialStore, Credentials};
use crate::error::{AgentError, AgentResult};
use crate::farcaster::format::{format_feed_cast, format_time, ConversationSummary, MessageLine};
use crate::farcaster::{channel_url, group_url, DirectCastClient, HubService, NeynarClient};
use crate::http::{build_http_client, ApiClient, Auth, RemoteError};
use crate::lifecycle::Shutdown;
#[cfg(test)]
use crate::messaging::LoopbackNetwork;
use crate::messaging::{pump_until_shutdown, ClientOptions, LoopbackTransport, MessagingError, Messenger};
use crate::publish::{Destination, IdempotencyKey, OutboundMessage, Publisher};

const NEYNAR_KEY_HEADER: &str = "x-api-key";

/// Run one parsed command to completion.
pub async fn run(command: Commands, config: &AgentConfig, shutdown: &Shutdown) -> AgentResult<()> {
    let ctx = Context::new(config, shutdown);
    match command {
        Commands::Cast(cmd) => cast(&ctx, cmd).await,
        Commands::Channel(cmd) => channel(&ctx, cmd).await,
        Commands::Group(cmd) => group(&ctx, cmd).await,
        Commands::Dm(cmd) => dm(&ctx, cmd).await,
        Commands::Xmtp(cmd) => xmtp(&ctx, cmd).await,
        Commands::Bridge(args) => bridge(&ctx, args).await,
        Commands::Account(cmd) => account(&ctx, cmd),
    }
}

struct Context<'a> {
    config: &'a AgentConfig,
    shutdown: &'a Shutdown,
    store: CredentialStore,
    #[cfg(test)]
    loopback: Option<LoopbackNetwork>,
}

impl<'a> Context<'a> {
    fn new(config: &'a AgentConfig, shutdown: &'a Shutdown) -> Self {
        Self {
            config,
            shutdown,
            store: CredentialStore::new(config.credentials.store_path.clone()),
            #[cfg(test)]
            loopback: None,
        }
    }

    fn credentials(&self) -> AgentResult<Credentials> {
        Ok(credentials::resolve(&self.store)?)
    }

    fn http(&self) -> AgentResult<reqwest::Client> {
        build_http_client(&self.config.timeouts)
            .map_err(|source| AgentError::Remote(RemoteError::Transport { service: "http", source }))
    }

    fn debug(&self) -> bool {
        self.config.observability.debug
    }

    fn neynar(&self, http: &reqwest::Client, key: &str) -> NeynarClient {
        NeynarClient::new(ApiClient::new(
            http.clone(),
            "neynar",
            &self.config.endpoints.neynar_api,
            api_key(key),
        ))
    }

    /// Hub client; the Neynar key doubles as the hub key when present.
    fn hub(&self, http: &reqwest::Client, neynar_key: Option<&str>) -> ApiClient {
        ApiClient::new(
            http.clone(),
            "hub",
            &self.config.endpoints.hub_api,
            neynar_key.map(api_key).unwrap_or(Auth::None),
        )
    }

    fn direct_casts(&self, http: &reqwest::Client, key: &str) -> DirectCastClient {
        DirectCastClient::new(ApiClient::new(
            http.clone(),
            "warpcast",
            &self.config.endpoints.warpcast_api,
            Auth::Bearer(key.to_string()),
        ))
    }

    /// Credentials and the database key are checked before the transport.
    fn messenger(&self) -> AgentResult<Messenger<LoopbackTransport>> {
        let wallet = self.credentials()?.wallet()?;
        let options = ClientOptions::for_wallet(&self.config.messaging, &wallet)?;
        #[cfg(test)]
        {
            if let Some(network) = &self.loopback {
                return Ok(Messenger::new(network.connect(&options)));
            }
        }
        Err(MessagingError::NoTransport(options.env.as_str()).into())
    }
}

fn api_key(key: &str) -> Auth {
    Auth::ApiKey {
        header: NEYNAR_KEY_HEADER,
        value: key.to_string(),
    }
}

fn outbound(
    text: String,
    destination: Destination,
    embeds: Vec<String>,
    idempotency_key: Option<String>,
) -> AgentResult<OutboundMessage> {
    let mut message = OutboundMessage::new(text, destination).with_embeds(embeds);
    if let Some(raw) = idempotency_key {
        message = message.with_idempotency_key(raw.parse::<IdempotencyKey>()?);
    }
    message.validate()?;
    Ok(message)
}

async fn cast(ctx: &Context<'_>, cmd: CastCommand) -> AgentResult<()> {
    match cmd {
        CastCommand::Channel {
            channel_id,
            text,
            embeds,
            idempotency_key,
        } => {
            let creds = ctx.credentials()?;
            let fid = creds.fid()?;
            let signer = creds.content_signer()?;
            let neynar_key = creds.neynar_api_key()?;
            let message = outbound(text, Destination::Channel(channel_id.clone()), embeds, idempotency_key)?;

            let http = ctx.http()?;
            let hub = HubService::new(ctx.hub(&http, Some(neynar_key)), Some(ctx.neynar(&http, neynar_key)), fid);
            println!("Posting to {}", channel_url(&channel_id));
            let result = Publisher::new(hub, signer, &ctx.config.timing)
                .publish_until(&message, &mut ctx.shutdown.subscribe())
                .await?;
            output::print_cast(&result)
        }
        CastCommand::Group {
            group_id,
            text,
            embeds,
            idempotency_key,
        } => {
            let creds = ctx.credentials()?;
            let fid = creds.fid()?;
            let signer = creds.content_signer()?;
            let neynar_key = creds.neynar_api_key().ok();
            let message = outbound(text, Destination::Group(group_id.clone()), embeds, idempotency_key)?;

            let http = ctx.http()?;
            let neynar = neynar_key.map(|key| ctx.neynar(&http, key));
            let hub = HubService::new(ctx.hub(&http, neynar_key), neynar, fid);
            println!("Posting to {}", group_url(&group_id));
            let result = Publisher::new(hub, signer, &ctx.config.timing)
                .publish_until(&message, &mut ctx.shutdown.subscribe())
                .await?;
            output::print_cast(&result)
        }
        CastCommand::Verify { fid, hash } => {
            let neynar_key = ctx.credentials()?.neynar_api_key().ok().map(str::to_string);
            let http = ctx.http()?;
            let hub = HubService::new(ctx.hub(&http, neynar_key.as_deref()), None, fid);
            let found = hub.cast_exists(fid, &hash).await?;
            output::print_json(&json!({ "fid": fid, "hash": hash, "found": found }))
        }
    }
}

async fn channel(ctx: &Context<'_>, cmd: ChannelCommand) -> AgentResult<()> {
    let creds = ctx.credentials()?;
    let http = ctx.http()?;
    let neynar = ctx.neynar(&http, creds.neynar_api_key()?);
    match cmd {
        ChannelCommand::Info { id } => {
            let channel = neynar
                .channel(&id)
                .await?
                .ok_or_else(|| AgentError::NotFound(format!("channel '{}'", id)))?;
            output::print_json(&channel)
        }
        ChannelCommand::Search { query } => {
            let channels = neynar.search_channels(&query).await?;
            if channels.is_empty() {
                println!("No channels match '{}'.", query);
                return Ok(());
            }
            for ch in &channels {
                println!(
                    "{}  {}  ({} followers)",
                    ch.id,
                    ch.name.as_deref().unwrap_or(""),
                    ch.follower_count.unwrap_or(0)
                );
            }
            Ok(())
        }
    }
}

async fn group(ctx: &Context<'_>, cmd: GroupCommand) -> AgentResult<()> {
    let creds = ctx.credentials()?;
    let http = ctx.http()?;
    let neynar = ctx.neynar(&http, creds.neynar_api_key()?);
    match cmd {
        GroupCommand::Info { id } => {
            let group = neynar
                .group(&id)
                .await?
                .ok_or_else(|| AgentError::NotFound(format!("group '{}'", id)))?;
            output::print_json(&group)
        }
        GroupCommand::Feed { id, limit } => {
            let casts = neynar.group_feed(&id, limit).await?;
            println!("{} casts in {}\n", casts.len(), group_url(&id));
            for cast in &casts {
                println!("{}\n", format_feed_cast(cast));
            }
            Ok(())
        }
    }
}

async fn dm(ctx: &Context<'_>, cmd: DmCommand) -> AgentResult<()> {
    let creds = ctx.credentials()?;
    let client = ctx.direct_casts(&ctx.http()?, creds.warpcast_api_key()?);
    match cmd {
        DmCommand::Send(target) => {
            let (destination, text, key) = match target {
                DmTarget::User {
                    fid,
                    message,
                    idempotency_key,
                } => (Destination::User(fid), message, idempotency_key),
                DmTarget::Conversation {
                    id,
                    message,
                    idempotency_key,
                } => (Destination::Conversation(id), message, idempotency_key),
            };
            let message = outbound(text, destination, Vec::new(), key)?;
            let result = client.send(&message).await?;
            println!("Direct cast sent to {}", message.destination);
            output::print_json(&DirectCastReport::from(&result))
        }
        DmCommand::Inbox { limit, cursor } => {
            let fetched = client.inbox(limit, cursor.as_deref()).await?;
            output::debug_raw(ctx.debug(), &fetched.raw);
            let conversations = fetched.parsed.conversations();
            println!("{} conversations\n", conversations.len());
            for conv in conversations {
                println!("{}\n", ConversationSummary::from(conv));
            }
            if let Some(next) = fetched.parsed.next_cursor() {
                println!("Next cursor: {}", next);
            }
            Ok(())
        }
        DmCommand::Conversation { id, limit, cursor } => {
            let fetched = client.conversation(&id, limit, cursor.as_deref()).await?;
            output::debug_raw(ctx.debug(), &fetched.raw);
            let messages = fetched.parsed.messages();
            println!("{} messages in {}\n", messages.len(), id);
            for msg in messages {
                println!("{}\n", MessageLine::from(msg));
            }
            if let Some(next) = fetched.parsed.next_cursor() {
                println!("Next cursor: {}", next);
            }
            Ok(())
        }
    }
}

async fn xmtp(ctx: &Context<'_>, cmd: XmtpCommand) -> AgentResult<()> {
    let messenger = ctx.messenger()?;
    match cmd {
        XmtpCommand::Check { address } => {
            let reachable = messenger.check(&address).await?;
            output::print_json(&json!({ "address": address, "canMessage": reachable }))
        }
        XmtpCommand::Dm { address, message } => {
            let sent = messenger.send_dm(&address, &message).await?;
            output::print_json(&sent)
        }
        XmtpCommand::Group { group_id, message } => {
            let sent = messenger.send_to_group(&group_id, &message).await?;
            output::print_json(&sent)
        }
        XmtpCommand::CreateGroup {
            name,
            addresses,
            message,
        } => {
            let members: Vec<String> = addresses
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            if members.is_empty() {
                return Err(AgentError::usage("at least one member address is required"));
            }
            let created = messenger
                .create_group(Some(name.as_str()), &members, message.as_deref())
                .await?;
            output::print_json(&created)
        }
        XmtpCommand::List => {
            let conversations = messenger.list().await?;
            output::print_json(&conversations)
        }
        XmtpCommand::Read { conversation_id, limit } => {
            let messages = messenger.read(&conversation_id, limit).await?;
            for msg in &messages {
                println!("[{}] {}: {}", format_time(Some(msg.sent_at)), msg.short_sender(), msg.content);
            }
            if ctx.debug() {
                output::print_json(&messages)?;
            }
            Ok(())
        }
        XmtpCommand::Stream => {
            let subscription = messenger.stream().await?;
            println!("Streaming messages. Press Ctrl+C to stop.");
            let mut shutdown = ctx.shutdown.subscribe();
            let handled = pump_until_shutdown(subscription, &mut shutdown, |msg| {
                println!(
                    "[{}] {} in {}: {}",
                    format_time(Some(msg.sent_at)),
                    msg.short_sender(),
                    msg.conversation_id,
                    msg.content
                );
            })
            .await;
            tracing::info!(handled, "Stream closed");
            Ok(())
        }
    }
}

async fn bridge(ctx: &Context<'_>, args: BridgeArgs) -> AgentResult<()> {
    let settings = &ctx.config.bridge;
    let raw_amount = args.amount.unwrap_or_else(|| settings.default_amount_eth.clone());
    let amount = parse_ether(&raw_amount)
        .map_err(|e| AgentError::usage(format!("invalid amount '{}': {}", raw_amount, e)))?;
    let origin = args.from_chain.unwrap_or(settings.default_origin_chain);
    let destination = args.to_chain.unwrap_or(settings.default_destination_chain);

    let wallet = ctx.credentials()?.wallet()?;
    let endpoint = ctx.config.chains.endpoint(origin);
    let chain = BlockchainClient::connect(&endpoint, &wallet, ctx.config.chains.rpc_timeout_secs)?;
    let relay = RelayClient::new(ApiClient::new(
        ctx.http()?,
        "relay",
        &ctx.config.endpoints.relay_api,
        Auth::None,
    ));

    println!("Bridging {} ETH from chain {} to chain {}", raw_amount, origin, destination);
    let bridge = RelayBridge::new(relay, chain, wallet.address(), settings, &ctx.config.timing);
    let outcome = bridge.bridge(amount, destination, &mut ctx.shutdown.subscribe()).await?;
    output::print_bridge(&outcome)
}

fn account(ctx: &Context<'_>, cmd: AccountCommand) -> AgentResult<()> {
    match cmd {
        AccountCommand::Save { name, activate } => {
            let creds = Credentials::from_env()?;
            if creds == Credentials::default() {
                return Err(AgentError::usage(
                    "no credentials found in the environment; set PRIVATE_KEY, SIGNER_PRIVATE_KEY, FID or API keys first",
                ));
            }
            ctx.store.save(&name, &creds, activate)?;
            println!("Saved account '{}' to {}", name, ctx.store.path().display());
            Ok(())
        }
        AccountCommand::List => {
            let accounts = ctx.store.list()?;
            if accounts.is_empty() {
                println!("No saved accounts.");
                return Ok(());
            }
            for a in &accounts {
                let marker = if a.active { "*" } else { " " };
                let fid = a.fid.map(|f| f.to_string()).unwrap_or_else(|| "-".to_string());
                println!("{} {}  fid={}  signer={}", marker, a.name, fid, a.has_signer);
            }
            Ok(())
        }
        AccountCommand::Use { name } => {
            ctx.store.set_active(&name)?;
            println!("Active account: {}", name);
            Ok(())
        }
        AccountCommand::Path => {
            println!("{}", ctx.store.path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config(dir: &tempfile::TempDir) -> AgentConfig {
        let mut config = AgentConfig::default();
        config.messaging.data_dir = dir.path().join("xmtp");
        config.credentials.store_path = dir.path().join("credentials.json");
        let account = Credentials {
            private_key: Some(DEV_KEY.to_string()),
            ..Default::default()
        };
        CredentialStore::new(config.credentials.store_path.clone())
            .save("main", &account, true)
            .unwrap();
        config
    }

    fn check() -> XmtpCommand {
        XmtpCommand::Check {
            address: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
        }
    }

    #[tokio::test]
    async fn test_messaging_without_transport_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let shutdown = Shutdown::new();
        let ctx = Context::new(&config, &shutdown);

        let err = xmtp(&ctx, check()).await.unwrap_err();

        assert!(matches!(err, AgentError::Messaging(MessagingError::NoTransport(_))));
        assert!(err.is_config());
        assert!(err.to_string().contains("no messaging transport"));
    }

    #[tokio::test]
    async fn test_messaging_runs_over_configured_transport() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let shutdown = Shutdown::new();
        let mut ctx = Context::new(&config, &shutdown);
        ctx.loopback = Some(LoopbackNetwork::new());

        xmtp(&ctx, check()).await.unwrap();
    }
}
