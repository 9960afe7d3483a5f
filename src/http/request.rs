//! Request building for remote API calls.
//!
//! # Responsibilities
//! - Build one shared `reqwest::Client` from configured timeouts
//! - Join base URL and path, attach query parameters
//! - Attach authentication (bearer token or API key header)
//!
//! # Design Decisions
//! - One client per invocation, passed explicitly (no global client)
//! - Credentials are redacted from `Debug` output
//! - Requests are sent exactly once; retries belong to the caller

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::http::response::{ApiResponse, RemoteError, ResponseBody};

/// Build the HTTP client shared by every API wrapper.
pub fn build_http_client(timeouts: &TimeoutConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .user_agent(concat!("farcaster-agent/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Authentication attached to every request of an `ApiClient`.
#[derive(Clone)]
pub enum Auth {
    None,
    Bearer(String),
    ApiKey { header: &'static str, value: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => write!(f, "None"),
            Auth::Bearer(_) => write!(f, "Bearer(<redacted>)"),
            Auth::ApiKey { header, .. } => write!(f, "ApiKey({}: <redacted>)", header),
        }
    }
}

/// Thin wrapper binding a client to one service's base URL and credentials.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    service: &'static str,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(http: Client, service: &'static str, base_url: impl Into<String>, auth: Auth) -> Self {
        Self {
            http,
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Absolute URL for a path on this service.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET with query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, RemoteError> {
        let builder = self.http.get(self.url(path)).query(query);
        self.execute(builder).await
    }

    /// Send a JSON body with the given method.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, RemoteError> {
        let builder = self.http.request(method, self.url(path)).json(body);
        self.execute(builder).await
    }

    /// POST raw bytes.
    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &'static str,
    ) -> Result<ApiResponse, RemoteError> {
        let builder = self
            .http
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        self.execute(builder).await
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<ApiResponse, RemoteError> {
        let builder = match &self.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::ApiKey { header, value } => builder.header(*header, value),
        };

        let response = builder.send().await.map_err(|source| RemoteError::Transport {
            service: self.service,
            source,
        })?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|source| RemoteError::Transport {
            service: self.service,
            source,
        })?;

        tracing::debug!(service = self.service, status, bytes = bytes.len(), "Remote response");

        Ok(ApiResponse {
            service: self.service,
            status,
            body: ResponseBody::parse(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new(Client::new(), "relay", "https://api.relay.link/", Auth::None);
        assert_eq!(client.url("/quote"), "https://api.relay.link/quote");
        assert_eq!(client.url("intents/status"), "https://api.relay.link/intents/status");
    }

    #[test]
    fn test_auth_debug_is_redacted() {
        let auth = Auth::Bearer("wc_secret".to_string());
        assert!(!format!("{:?}", auth).contains("wc_secret"));
        let auth = Auth::ApiKey { header: "x-api-key", value: "neynar_secret".to_string() };
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("x-api-key"));
        assert!(!rendered.contains("neynar_secret"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&TimeoutConfig::default()).is_ok());
    }
}
