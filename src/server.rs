//! Inbound peer-facing serve endpoint.
//!
//! Mirrors `original_source/client/etcd/node.go`'s request shape from the
//! server side: `GET|POST|DELETE /<basepath>/<group>/<key>`, `axum` standing
//! in for the Go source's bare `net/http` handlers the way `velesdb-server`
//! uses `axum` for its own wire-facing layer. Bodies are the same
//! `bincode`-encoded records [`crate::node_client::HttpNodeClient`] sends.

use crate::consts::DEFAULT_AUTO_GROUP_MAX_BYTES;
use crate::hub::Hub;
use crate::node_client::{DeleteResponse, GetResponse, SetResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the router for a single basepath, e.g. `/cache`.
pub fn router(hub: Arc<Hub>, basepath: &str) -> Router {
    let path = format!("{}/{{group}}/{{key}}", basepath.trim_end_matches('/'));
    Router::new()
        .route(&path, get(handle_get).post(handle_set).delete(handle_delete))
        .with_state(hub)
}

async fn handle_get(
    State(hub): State<Arc<Hub>>,
    Path((group, key)): Path<(String, String)>,
) -> Response {
    let group_handle = hub.get_or_create_group(&group, DEFAULT_AUTO_GROUP_MAX_BYTES);
    match group_handle.get(&key).await {
        Ok(value) => bincode_ok(GetResponse {
            success: true,
            message: String::new(),
            value: value.bytes().to_vec(),
            expire: value.expire(),
        }),
        Err(err) => {
            info!(group, key, error = %err, "serve get miss");
            bincode_ok(GetResponse {
                success: false,
                message: err.to_string(),
                value: Vec::new(),
                expire: 0,
            })
        }
    }
}

async fn handle_set(
    State(hub): State<Arc<Hub>>,
    Path((group, key)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let group_handle = hub.get_or_create_group(&group, DEFAULT_AUTO_GROUP_MAX_BYTES);
    match group_handle.set_owned(&key, body) {
        Ok(value) => bincode_ok(SetResponse {
            success: true,
            message: String::new(),
            value: value.bytes().to_vec(),
            expire: value.expire(),
        }),
        Err(err) => {
            warn!(group, key, error = %err, "serve set failed");
            bincode_ok(SetResponse {
                success: false,
                message: err.to_string(),
                value: Vec::new(),
                expire: 0,
            })
        }
    }
}

async fn handle_delete(
    State(hub): State<Arc<Hub>>,
    Path((group, key)): Path<(String, String)>,
) -> Response {
    let group_handle = hub.get_or_create_group(&group, DEFAULT_AUTO_GROUP_MAX_BYTES);
    match group_handle.delete(&key).await {
        Ok(()) => bincode_ok(DeleteResponse {
            success: true,
            message: String::new(),
        }),
        Err(err) => {
            warn!(group, key, error = %err, "serve delete failed");
            bincode_ok(DeleteResponse {
                success: false,
                message: err.to_string(),
            })
        }
    }
}

fn bincode_ok<T: serde::Serialize>(record: T) -> Response {
    match bincode::serialize(&record) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
