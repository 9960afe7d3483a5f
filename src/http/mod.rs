//! HTTP client layer for remote APIs.
//!
//! # Data Flow
//! ```text
//! flow (hub, neynar, warpcast, relay)
//!     → ApiClient (request.rs): base URL + auth + one shared reqwest::Client
//!     → ApiResponse (response.rs): status + JSON-or-text body
//!     → error_for_status → RemoteError::Rejected on non-2xx
//! ```

pub mod request;
pub mod response;

pub use request::{build_http_client, ApiClient, Auth};
pub use response::{ApiResponse, RemoteError, ResponseBody};
