//! Relay.link API wrapper.

use crate::bridge::types::{BridgeError, IntentStatus, QuoteRequest, RelayQuote};
use crate::http::{ApiClient, RemoteError};

#[derive(Debug, Clone)]
pub struct RelayClient {
    api: ApiClient,
}

impl RelayClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Request a quote. Error documents become `BridgeError::QuoteRejected`.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<RelayQuote, BridgeError> {
        let response = self.api.send_json(reqwest::Method::POST, "/quote", request).await?;
        match response.body.as_json() {
            Some(body) => RelayQuote::from_response(response.status, body),
            None => Err(BridgeError::QuoteRejected {
                status: response.status,
                body: response.body.render(),
            }),
        }
    }

    /// Current status of a bridge intent.
    pub async fn status(&self, request_id: &str) -> Result<IntentStatus, RemoteError> {
        self.api
            .get("/intents/status", &[("requestId", request_id.to_string())])
            .await?
            .error_for_status()?
            .json()
    }
}
