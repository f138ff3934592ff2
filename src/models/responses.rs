//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for the GET operation (GET /get/:bin/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The bin it was read from
    pub bin: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, bin: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            bin: bin.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// The bin it was written to
    pub bin: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, bin: impl Into<String>) -> Self {
        let key = key.into();
        let bin = bin.into();
        Self {
            message: format!("Key '{}' set in bin '{}'", key, bin),
            key,
            bin,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The bin the delete ran against
    pub bin: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(cid: &str, wildcard: bool, bin: impl Into<String>) -> Self {
        let bin = bin.into();
        let message = if wildcard {
            format!("Wildcard delete '{}' completed in bin '{}'", cid, bin)
        } else {
            format!("Key '{}' deleted from bin '{}'", cid, bin)
        };
        Self { message, bin }
    }
}

/// Response body for the FLUSH operation (POST /flush)
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    /// Success message
    pub message: String,
    /// The bin whose temporary keys were purged
    pub bin: String,
}

impl FlushResponse {
    /// Creates a new FlushResponse
    pub fn new(bin: impl Into<String>) -> Self {
        let bin = bin.into();
        Self {
            message: format!("Temporary keys flushed from bin '{}'", bin),
            bin,
        }
    }
}

/// Response body for the nodes endpoint (GET /nodes)
#[derive(Debug, Clone, Serialize)]
pub struct NodesResponse {
    /// Number of live nodes in the pool
    pub count: usize,
    /// Their addresses, in shard order
    pub addresses: Vec<String>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status string
    pub status: String,
    /// RFC 3339 timestamp of the check
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a healthy response with the current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
