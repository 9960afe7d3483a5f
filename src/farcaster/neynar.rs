//! Neynar REST reads: channels and groups.

use crate::farcaster::types::{
    Channel, ChannelResponse, ChannelSearchResponse, FeedCast, Group, GroupFeedResponse, GroupResponse,
};
use crate::http::{ApiClient, RemoteError};

/// Neynar API wrapper.
#[derive(Debug, Clone)]
pub struct NeynarClient {
    api: ApiClient,
}

impl NeynarClient {
    /// `api` should carry the `x-api-key` header.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Look a channel up by id. `None` when the service does not know it.
    pub async fn channel(&self, id: &str) -> Result<Option<Channel>, RemoteError> {
        let response = self
            .api
            .get("/v2/farcaster/channel", &[("id", id.to_string())])
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        let parsed: ChannelResponse = response.error_for_status()?.json()?;
        Ok(parsed.channel)
    }

    /// Search channels by name. Non-success is an error.
    pub async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, RemoteError> {
        let response = self
            .api
            .get("/v2/farcaster/channel/search", &[("q", query.to_string())])
            .await?
            .error_for_status()?;
        Ok(response.json::<ChannelSearchResponse>()?.channels)
    }

    /// Look a group up by identifier. `None` when the service does not know it.
    pub async fn group(&self, id: &str) -> Result<Option<Group>, RemoteError> {
        let response = self
            .api
            .get("/v2/farcaster/group", &[("identifier", id.to_string())])
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        let parsed: GroupResponse = response.error_for_status()?.json()?;
        Ok(parsed.group)
    }

    /// Latest casts in a group.
    pub async fn group_feed(&self, id: &str, limit: u32) -> Result<Vec<FeedCast>, RemoteError> {
        let response = self
            .api
            .get(
                "/v2/farcaster/group/feed",
                &[("group_id", id.to_string()), ("limit", limit.to_string())],
            )
            .await?
            .error_for_status()?;
        Ok(response.json::<GroupFeedResponse>()?.casts)
    }
}
