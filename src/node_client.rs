//! Owner-to-owner peer transport.
//!
//! Grounded on `original_source/client/etcd/node.go`: a remote node is
//! addressed by URL, `Get`/`Set`/`Delete` map to HTTP verbs against
//! `<base>/<group>/<key>`, and the response carries a `success` flag plus a
//! `message` that becomes the error text on failure. The original marshals
//! `proto.Message` records; this crate marshals the same shape with
//! `bincode`, since no `.proto` wire contract is specified and the pack's
//! `bincode` usage covers this exact "internal binary record" role.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire record returned by a successful or failed `Get`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    pub message: String,
    pub value: Vec<u8>,
    pub expire: i64,
}

/// Wire record returned by a successful or failed `Set`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub success: bool,
    pub message: String,
    pub value: Vec<u8>,
    pub expire: i64,
}

/// Wire record returned by a successful or failed `Delete`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// A result fetched or echoed back by a remote owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteValue {
    pub bytes: Bytes,
    pub expire: i64,
}

/// Owner-to-owner transport for a single group. One implementation per peer
/// address; the group coordinator holds one per known node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> CacheResult<RemoteValue>;
    async fn set(&self, group: &str, key: &str, value: Bytes) -> CacheResult<RemoteValue>;
    async fn delete(&self, group: &str, key: &str) -> CacheResult<()>;
}

/// An HTTP `NodeClient` backed by `reqwest`, reused across calls so the
/// underlying connection pool (TCP/TLS) is shared rather than a fresh dial
/// per request.
pub struct HttpNodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNodeClient {
    /// `base_url` is the peer's reachable endpoint, e.g. `http://10.0.0.5:8080/cache`.
    pub fn new(base_url: impl Into<String>, dial_timeout: Duration) -> CacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(dial_timeout)
            .build()
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, group: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencode(group),
            urlencode(key)
        )
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get(&self, group: &str, key: &str) -> CacheResult<RemoteValue> {
        let resp = self
            .client
            .get(self.url(group, key))
            .send()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        let decoded: GetResponse = decode_response(resp).await?;
        if !decoded.success {
            return Err(CacheError::Peer(decoded.message));
        }
        Ok(RemoteValue {
            bytes: Bytes::from(decoded.value),
            expire: decoded.expire,
        })
    }

    async fn set(&self, group: &str, key: &str, value: Bytes) -> CacheResult<RemoteValue> {
        let resp = self
            .client
            .post(self.url(group, key))
            .header("content-type", "application/octet-stream")
            .body(value.to_vec())
            .send()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        let decoded: SetResponse = decode_response(resp).await?;
        if !decoded.success {
            return Err(CacheError::Peer(decoded.message));
        }
        Ok(RemoteValue {
            bytes: Bytes::from(decoded.value),
            expire: decoded.expire,
        })
    }

    async fn delete(&self, group: &str, key: &str) -> CacheResult<()> {
        let resp = self
            .client
            .delete(self.url(group, key))
            .send()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        let decoded: DeleteResponse = decode_response(resp).await?;
        if !decoded.success {
            return Err(CacheError::Peer(decoded.message));
        }
        Ok(())
    }
}

async fn decode_response<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
) -> CacheResult<T> {
    if !resp.status().is_success() {
        return Err(CacheError::Transport(format!(
            "peer returned status {}",
            resp.status()
        )));
    }
    let body = resp
        .bytes()
        .await
        .map_err(|e| CacheError::Transport(e.to_string()))?;
    bincode::deserialize(&body).map_err(|e| CacheError::Decode(e.to_string()))
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
