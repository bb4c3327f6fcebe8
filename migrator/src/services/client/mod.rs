// Platform client for the ownership migration service
//
// This module provides:
// - The `Transport` seam every kind handler and the audit sink talk through
// - A reqwest implementation with per-request retry
// - Principal lookups and account cleanup calls

pub mod accounts;
pub mod domo_client;
pub mod errors;
pub mod retry;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use domo_client::DomoClient;
pub use errors::{ClientError, ClientResult};
pub use retry::RetryPolicy;
pub use types::{ClientCredentials, HttpMethod, RequestBody};

/// A single `request(method, path, body) -> response` capability.
///
/// Implementations surface non-2xx answers as [`ClientError::RequestFailed`]
/// with the status and body text kept for diagnostics.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value>;

    /// One attempt, never retried. For calls that are unsafe to repeat, such
    /// as dataset appends.
    async fn request_once(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value> {
        self.request(method, path, body).await
    }
}
