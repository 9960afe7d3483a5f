//! Response handling for remote API calls.
//!
//! # Responsibilities
//! - Capture status and body of every remote response
//! - Parse JSON bodies, keep raw text when the body is not JSON
//! - Map non-success statuses to `RemoteError::Rejected`
//!
//! # Design Decisions
//! - The body is always read in full; responses here are small JSON documents
//! - Rejections carry the body verbatim for diagnosis
//! - 401 rejections get service-specific guidance via `auth_guidance`

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors talking to a remote API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("{service} transport error: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} rejected the request with status {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered 2xx but the body did not have the expected shape.
    #[error("{service} returned an unexpected response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
}

impl RemoteError {
    /// HTTP status for rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Guidance for authentication failures, if this is one.
    pub fn auth_guidance(&self) -> Option<&'static str> {
        match self {
            RemoteError::Rejected { service, status: 401 | 403, .. } => Some(match *service {
                "warpcast" => {
                    "Make sure your Warpcast API key is valid. Get a new one from \
                     Warpcast > Settings > Developer Mode > API Keys"
                }
                "neynar" | "hub" => {
                    "Make sure NEYNAR_API_KEY is valid. Keys are issued at https://neynar.com"
                }
                _ => "Check the credentials configured for this service",
            }),
            _ => None,
        }
    }
}

/// Body of a remote response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parse bytes as JSON, falling back to text.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }

    /// Pretty rendering used in error messages and debug output.
    pub fn render(&self) -> String {
        match self {
            ResponseBody::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            ResponseBody::Text(t) => t.clone(),
        }
    }
}

/// Status and body of a completed remote call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub service: &'static str,
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success status into `RemoteError::Rejected`.
    pub fn error_for_status(self) -> Result<Self, RemoteError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RemoteError::Rejected {
                service: self.service,
                status: self.status,
                body: self.body.render(),
            })
        }
    }

    /// Deserialize a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        let value = self.body.as_json().ok_or_else(|| RemoteError::Decode {
            service: self.service,
            reason: "body is not JSON".to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| RemoteError::Decode {
            service: self.service,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn response(status: u16, body: &[u8]) -> ApiResponse {
        ApiResponse {
            service: "warpcast",
            status,
            body: ResponseBody::parse(body),
        }
    }

    #[test]
    fn test_body_falls_back_to_text() {
        assert!(matches!(ResponseBody::parse(b"{\"ok\":true}"), ResponseBody::Json(_)));
        assert_eq!(
            ResponseBody::parse(b"Bad Gateway"),
            ResponseBody::Text("Bad Gateway".to_string())
        );
    }

    #[test]
    fn test_rejection_carries_status_and_body() {
        let err = response(401, b"{\"errors\":[{\"message\":\"Unauthorized\"}]}")
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Unauthorized"));
        assert!(err.auth_guidance().unwrap().contains("Warpcast"));
    }

    #[test]
    fn test_no_guidance_for_server_errors() {
        let err = response(500, b"oops").error_for_status().unwrap_err();
        assert!(err.auth_guidance().is_none());
    }

    #[test]
    fn test_json_decode_error() {
        #[derive(Debug, Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            id: u64,
        }
        let err = response(200, b"{\"id\":\"x\"}").json::<Shape>().unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
        let err = response(200, b"plain").json::<Shape>().unwrap_err();
        assert!(err.to_string().contains("not JSON"));
    }
}
