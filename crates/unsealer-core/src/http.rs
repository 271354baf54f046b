//! HTTP implementation of [`VaultClient`] over the vault's REST API.
//!
//! Speaks to the three `sys` endpoints the orchestrator consumes. Request
//! and response bodies are the vault's own wire shapes; no auth token is
//! required for any of them (seal-status, unseal, and init are unauthenticated
//! by design — they are what you call before the vault can authenticate
//! anything).

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::{InitResponse, SealStatus, VaultClient};
use crate::error::ClientError;

/// A [`VaultClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpVaultClient {
    http: reqwest::Client,
    addr: String,
}

#[derive(Serialize)]
struct UnsealRequest<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct InitRequest {
    secret_shares: u32,
    secret_threshold: u32,
}

impl HttpVaultClient {
    /// Create a client for the vault at `addr` (e.g. `https://vault:8200`).
    ///
    /// A trailing slash on `addr` is tolerated.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        let mut addr = addr.into();
        while addr.ends_with('/') {
            addr.pop();
        }
        Self {
            http: reqwest::Client::new(),
            addr,
        }
    }

    /// Create a client reusing an existing `reqwest::Client` (custom TLS
    /// roots, timeouts).
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, addr: impl Into<String>) -> Self {
        let mut addr = addr.into();
        while addr.ends_with('/') {
            addr.pop();
        }
        Self { http, addr }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ClientError::Request {
                reason: e.to_string(),
            })?;
        handle_response(resp).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Request {
                reason: e.to_string(),
            })?;
        handle_response(resp).await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| ClientError::Request {
        reason: format!("failed to read response body: {e}"),
    })?;
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        reason: e.to_string(),
    })
}

#[async_trait::async_trait]
impl VaultClient for HttpVaultClient {
    async fn seal_status(&self) -> Result<SealStatus, ClientError> {
        self.get_json("/v1/sys/seal-status").await
    }

    async fn unseal(&self, share: &str) -> Result<SealStatus, ClientError> {
        self.put_json("/v1/sys/unseal", &UnsealRequest { key: share })
            .await
    }

    async fn init(&self, shares: u32, threshold: u32) -> Result<InitResponse, ClientError> {
        self.put_json(
            "/v1/sys/init",
            &InitRequest {
                secret_shares: shares,
                secret_threshold: threshold,
            },
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slashes() {
        let client = HttpVaultClient::new("http://127.0.0.1:8200//");
        assert_eq!(client.url("/v1/sys/seal-status"), "http://127.0.0.1:8200/v1/sys/seal-status");
    }

    #[test]
    fn seal_status_wire_shape_decodes() {
        let status: SealStatus = serde_json::from_str(
            r#"{"type":"shamir","initialized":true,"sealed":true,"t":3,"n":5,"progress":1,"version":"1.15.0"}"#,
        )
        .unwrap();
        assert!(status.sealed);
        assert_eq!(status.t, 3);
        assert_eq!(status.n, 5);
        assert_eq!(status.progress, 1);
    }

    #[test]
    fn seal_status_missing_counters_default_to_zero() {
        let status: SealStatus = serde_json::from_str(r#"{"sealed":false}"#).unwrap();
        assert!(!status.sealed);
        assert_eq!(status.progress, 0);
    }

    #[test]
    fn init_response_wire_shape_decodes() {
        let resp: InitResponse = serde_json::from_str(
            r#"{"keys":["a","b"],"keys_base64":["YQ==","Yg=="],"root_token":"s.xyz"}"#,
        )
        .unwrap();
        assert_eq!(resp.keys, vec!["a", "b"]);
        assert_eq!(resp.root_token, "s.xyz");
    }

    #[tokio::test]
    async fn unreachable_server_yields_request_error() {
        // Port 1 is never listening.
        let client = HttpVaultClient::new("http://127.0.0.1:1");
        let err = client.seal_status().await.unwrap_err();
        assert!(matches!(err, ClientError::Request { .. }));
    }
}
