//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the caching proxy.
///
/// Connectivity faults (`NodeUnreachable`) are distinguished from command
/// failures on a reachable node (`CommandFailed`) so callers can apply
/// different tolerance policies per operation.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// A backend node could not be reached at connect time or mid-operation
    #[error("Node unreachable: {addr}: {reason}")]
    NodeUnreachable {
        /// The `host:port` address of the node
        addr: String,
        /// Description of the underlying fault
        reason: String,
    },

    /// A node was reachable but the issued command failed
    #[error("Command failed on {addr}: {reason}")]
    CommandFailed {
        /// The `host:port` address of the node
        addr: String,
        /// Description of the underlying fault
        reason: String,
    },

    /// The pool holds no usable nodes for an operation that requires one
    #[error("No usable nodes in the pool")]
    NoNodes,

    /// A fan-out operation failed on every live node
    #[error("Operation failed on all {0} nodes")]
    AllNodesFailed(usize),

    /// The persisted bin-index mapping could not be read or written
    #[error("Bin mapping store failure: {0}")]
    MappingStore(String),

    /// Key not found (HTTP surface only; the router reports misses as `None`)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NodeUnreachable { .. }
            | ProxyError::CommandFailed { .. }
            | ProxyError::NoNodes
            | ProxyError::AllNodesFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::MappingStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProxyError::NodeUnreachable {
            addr: "127.0.0.1:6379".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:6379"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_connectivity_and_command_faults_are_distinct() {
        let unreachable = ProxyError::NodeUnreachable {
            addr: "a:1".to_string(),
            reason: "refused".to_string(),
        };
        let failed = ProxyError::CommandFailed {
            addr: "a:1".to_string(),
            reason: "wrong type".to_string(),
        };
        assert!(matches!(unreachable, ProxyError::NodeUnreachable { .. }));
        assert!(matches!(failed, ProxyError::CommandFailed { .. }));
    }
}
