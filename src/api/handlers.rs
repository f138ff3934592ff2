//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::backend::Connector;
use crate::config::{Expiry, ProxyConfig, DEFAULT_FLUSH_BIN};
use crate::error::{ProxyError, Result};
use crate::mapping::MappingStore;
use crate::models::{
    DeleteRequest, DeleteResponse, FlushRequest, FlushResponse, GetResponse, HealthResponse,
    NodesResponse, SetRequest, SetResponse,
};
use crate::routing::CacheRouter;

/// Application state shared across all handlers.
///
/// The router is already concurrency-safe (per-node locks, read-mostly
/// caches), so the state is just a shared handle plus the request defaults.
#[derive(Clone)]
pub struct AppState {
    /// The cache router behind every endpoint
    pub router: Arc<CacheRouter>,
    /// Bin assumed when a request does not name one
    pub default_bin: String,
    /// Expiry policy assumed when a set request does not name one
    pub default_expire: Expiry,
}

impl AppState {
    /// Creates a new AppState around an already-constructed router.
    pub fn new(router: CacheRouter, default_bin: impl Into<String>, default_expire: Expiry) -> Self {
        Self {
            router: Arc::new(router),
            default_bin: default_bin.into(),
            default_expire,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects the node pool through `connector` and wires the bin resolver
    /// to `store` before any handler can run.
    pub fn from_config(
        config: &ProxyConfig,
        connector: &dyn Connector,
        store: Box<dyn MappingStore>,
    ) -> Result<Self> {
        let router = CacheRouter::from_config(config, connector, store)?;
        Ok(Self::new(
            router,
            config.default_bin.clone(),
            config.default_expire,
        ))
    }

    fn bin_or_default(&self, bin: Option<String>) -> String {
        bin.unwrap_or_else(|| self.default_bin.clone())
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in a bin, with permanent, temporary, or
/// TTL-seconds expiry.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(ProxyError::InvalidRequest(error_msg));
    }

    let expire = match req.expire {
        Some(raw) => Expiry::from_raw(raw)?,
        None => state.default_expire,
    };
    let bin = state.bin_or_default(req.bin);

    state.router.set(&req.key, &req.value, expire, &bin).await?;
    Ok(Json(SetResponse::new(req.key, bin)))
}

/// Handler for GET /get/:bin/:key
///
/// Retrieves a value from a bin. A miss (including a degraded connectivity
/// miss) is reported as 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((bin, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    match state.router.get(&key, &bin).await? {
        Some(value) => Ok(Json(GetResponse::new(key, bin, value))),
        None => Err(ProxyError::NotFound(key)),
    }
}

/// Handler for DELETE /del
///
/// Deletes one key, every key under a prefix, or (with `cid == "*"`) the
/// whole bin across every node.
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>> {
    let bin = state.bin_or_default(req.bin);
    state.router.delete(&req.cid, req.wildcard, &bin).await?;
    Ok(Json(DeleteResponse::new(&req.cid, req.wildcard, bin)))
}

/// Handler for POST /flush
///
/// Purges a bin's temporary keys on every node; defaults to the page bin.
pub async fn flush_handler(
    State(state): State<AppState>,
    Json(req): Json<FlushRequest>,
) -> Result<Json<FlushResponse>> {
    let bin = req.bin.unwrap_or_else(|| DEFAULT_FLUSH_BIN.to_string());
    state.router.flush(&bin).await?;
    Ok(Json(FlushResponse::new(bin)))
}

/// Handler for GET /nodes
///
/// Reports the live node pool, in shard order.
pub async fn nodes_handler(State(state): State<AppState>) -> Json<NodesResponse> {
    let pool = state.router.pool();
    Json(NodesResponse {
        count: pool.len(),
        addresses: pool
            .all_nodes()
            .iter()
            .map(|n| n.addr().to_string())
            .collect(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the proxy.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryCluster;
    use crate::mapping::MemoryMappingStore;

    fn test_state() -> AppState {
        let config = ProxyConfig {
            servers: vec!["n1:1".to_string(), "n2:2".to_string()],
            ..ProxyConfig::default()
        };
        AppState::from_config(
            &config,
            &MemoryCluster::new(),
            Box::new(MemoryMappingStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            expire: None,
            bin: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let response = get_handler(
            State(state),
            Path(("cache".to_string(), "test_key".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(response.value, "test_value");
        assert_eq!(response.bin, "cache");
    }

    #[tokio::test]
    async fn test_get_miss_is_not_found() {
        let state = test_state();
        let result = get_handler(
            State(state),
            Path(("cache".to_string(), "absent".to_string())),
        )
        .await;
        assert!(matches!(result, Err(ProxyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_invalid_expire_rejected() {
        let state = test_state();
        let req = SetRequest {
            key: "k".to_string(),
            value: "v".to_string(),
            expire: Some(-3),
            bin: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_defaults_to_full_wipe() {
        let state = test_state();

        let set = SetRequest {
            key: "k".to_string(),
            value: "v".to_string(),
            expire: None,
            bin: None,
        };
        set_handler(State(state.clone()), Json(set)).await.unwrap();

        // Default DeleteRequest is cid "*" without wildcard: an exact delete
        // of the literal key "*", so "k" survives
        let req: DeleteRequest = serde_json::from_str("{}").unwrap();
        delete_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(get_handler(
            State(state.clone()),
            Path(("cache".to_string(), "k".to_string()))
        )
        .await
        .is_ok());

        // With wildcard set, the whole bin goes
        let req = DeleteRequest {
            cid: "*".to_string(),
            wildcard: true,
            bin: None,
        };
        delete_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(get_handler(
            State(state),
            Path(("cache".to_string(), "k".to_string()))
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_flush_handler_defaults_to_page_bin() {
        let state = test_state();

        let set = SetRequest {
            key: "front".to_string(),
            value: "html".to_string(),
            expire: Some(-1),
            bin: Some("cache_page".to_string()),
        };
        set_handler(State(state.clone()), Json(set)).await.unwrap();

        let response = flush_handler(State(state.clone()), Json(FlushRequest::default()))
            .await
            .unwrap();
        assert_eq!(response.bin, "cache_page");

        let result = get_handler(
            State(state),
            Path(("cache_page".to_string(), "front".to_string())),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_nodes_handler() {
        let state = test_state();
        let response = nodes_handler(State(state)).await;
        assert_eq!(response.count, 2);
        assert_eq!(
            response.addresses,
            vec!["n1:1".to_string(), "n2:2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
