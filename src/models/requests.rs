//! Request DTOs for the proxy API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `expire`: `0` permanent (default), `-1` temporary, positive TTL seconds
/// - `bin`: Cache bin, defaults to the configured default bin
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Raw expire value; omitted means the configured default policy
    #[serde(default)]
    pub expire: Option<i64>,
    /// Optional bin name
    #[serde(default)]
    pub bin: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(expire) = self.expire {
            if expire < -1 {
                return Some(format!("Invalid expire value: {}", expire));
            }
        }
        None
    }
}

/// Request body for the DELETE operation (DELETE /del)
///
/// # Fields
/// - `cid`: Exact key, or a key prefix / `"*"` when `wildcard` is set
/// - `wildcard`: Whether `cid` is a prefix (or the full-bin `"*"`)
/// - `bin`: Cache bin, defaults to the configured default bin
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    /// The cache id to delete
    #[serde(default = "default_cid")]
    pub cid: String,
    /// Prefix/wipe mode flag
    #[serde(default)]
    pub wildcard: bool,
    /// Optional bin name
    #[serde(default)]
    pub bin: Option<String>,
}

fn default_cid() -> String {
    "*".to_string()
}

/// Request body for the FLUSH operation (POST /flush)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlushRequest {
    /// Bin whose temporary keys are purged, defaults to `cache_page`
    #[serde(default)]
    pub bin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize_defaults() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.expire.is_none());
        assert!(req.bin.is_none());
    }

    #[test]
    fn test_set_request_temporary() {
        let json = r#"{"key": "t", "value": "v", "expire": -1, "bin": "cache_page"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.expire, Some(-1));
        assert_eq!(req.bin.as_deref(), Some("cache_page"));
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_set_request_invalid_expire() {
        let req = SetRequest {
            key: "k".to_string(),
            value: "v".to_string(),
            expire: Some(-5),
            bin: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_delete_request_defaults() {
        let req: DeleteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.cid, "*");
        assert!(!req.wildcard);
        assert!(req.bin.is_none());
    }

    #[test]
    fn test_flush_request_defaults() {
        let req: FlushRequest = serde_json::from_str("{}").unwrap();
        assert!(req.bin.is_none());
    }
}
