//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::error::{ProxyError, Result};

/// Canonical core bin names, matching the cache namespaces every deployment
/// carries. The bin-index mapping is regenerated from the sorted form of
/// this list when no persisted mapping exists.
pub const CORE_BINS: [&str; 6] = [
    "cache",
    "cache_block",
    "cache_form",
    "cache_filter",
    "cache_page",
    "cache_menu",
];

/// Bin used when an operation does not name one.
pub const DEFAULT_BIN: &str = "cache";

/// Bin flushed when a flush request does not name one.
pub const DEFAULT_FLUSH_BIN: &str = "cache_page";

// == Expiry Policy ==
/// Expiry policy for a cache write.
///
/// The wire surface carries this as a single integer: `0` permanent, `-1`
/// temporary, any positive value a TTL in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No TTL, no temporary registration; lives until explicitly deleted
    Permanent,
    /// No TTL, but registered for bulk removal on the next flush of its bin
    Temporary,
    /// TTL in seconds
    Seconds(u32),
}

impl Expiry {
    /// Parses the raw integer form used on the wire surface.
    ///
    /// # Arguments
    /// * `raw` - `0` (permanent), `-1` (temporary), or a positive TTL in seconds
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(Expiry::Permanent),
            -1 => Ok(Expiry::Temporary),
            secs if secs > 0 => Ok(Expiry::Seconds(secs.min(u32::MAX as i64) as u32)),
            other => Err(ProxyError::InvalidRequest(format!(
                "Invalid expire value: {}",
                other
            ))),
        }
    }
}

// == Proxy Config ==
/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Ordered list of backend node addresses (`host:port`). Order is
    /// significant: it fixes shard identity, and reordering reshards every key.
    pub servers: Vec<String>,
    /// Optional site-wide key prefix for multisite namespacing
    pub key_prefix: Option<String>,
    /// Canonical bin names used to regenerate the bin-index mapping
    pub bins: Vec<String>,
    /// Explicit bin-to-database-index overrides, applied on top of a
    /// regenerated mapping (hand-edited entries win, and are not validated)
    pub bin_overrides: HashMap<String, u32>,
    /// Bin assumed when an operation does not name one
    pub default_bin: String,
    /// Expiry policy assumed when a write does not name one
    pub default_expire: Expiry,
    /// Database index returned for bins absent from the mapping
    pub default_db_index: u32,
    /// Path of the persisted bin-index mapping file
    pub mapping_path: PathBuf,
    /// HTTP server port
    pub server_port: u16,
}

impl ProxyConfig {
    /// Creates a new ProxyConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SHARDCACHE_SERVERS` - Comma-separated node addresses (default: `127.0.0.1:6379`)
    /// - `SHARDCACHE_KEY_PREFIX` - Site-wide key prefix (default: none)
    /// - `SHARDCACHE_BINS` - Comma-separated canonical bin names (default: core bins)
    /// - `SHARDCACHE_BIN_OVERRIDES` - `bin=index` pairs, comma-separated (default: none)
    /// - `SHARDCACHE_DEFAULT_BIN` - Default bin name (default: `cache`)
    /// - `SHARDCACHE_DEFAULT_EXPIRE` - Default expire as a raw integer (default: 0)
    /// - `SHARDCACHE_DEFAULT_DB` - Fallback database index (default: 0)
    /// - `SHARDCACHE_MAPPING_PATH` - Mapping file path (default: `shardcache_bins.json`)
    /// - `SHARDCACHE_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let servers = env::var("SHARDCACHE_SERVERS")
            .ok()
            .map(|v| parse_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec!["127.0.0.1:6379".to_string()]);

        let key_prefix = env::var("SHARDCACHE_KEY_PREFIX")
            .ok()
            .filter(|v| !v.is_empty());

        let bins = env::var("SHARDCACHE_BINS")
            .ok()
            .map(|v| parse_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| CORE_BINS.iter().map(|b| b.to_string()).collect());

        let bin_overrides = env::var("SHARDCACHE_BIN_OVERRIDES")
            .ok()
            .map(|v| parse_overrides(&v))
            .unwrap_or_default();

        let default_expire = env::var("SHARDCACHE_DEFAULT_EXPIRE")
            .ok()
            .and_then(|v| v.parse().ok())
            .and_then(|raw| Expiry::from_raw(raw).ok())
            .unwrap_or(Expiry::Permanent);

        Self {
            servers,
            key_prefix,
            bins,
            bin_overrides,
            default_bin: env::var("SHARDCACHE_DEFAULT_BIN")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_BIN.to_string()),
            default_expire,
            default_db_index: env::var("SHARDCACHE_DEFAULT_DB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            mapping_path: env::var("SHARDCACHE_MAPPING_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("shardcache_bins.json")),
            server_port: env::var("SHARDCACHE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            servers: vec!["127.0.0.1:6379".to_string()],
            key_prefix: None,
            bins: CORE_BINS.iter().map(|b| b.to_string()).collect(),
            bin_overrides: HashMap::new(),
            default_bin: DEFAULT_BIN.to_string(),
            default_expire: Expiry::Permanent,
            default_db_index: 0,
            mapping_path: PathBuf::from("shardcache_bins.json"),
            server_port: 3000,
        }
    }
}

// == Parsing Helpers ==
/// Splits a comma-separated list, trimming whitespace and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parses `bin=index` pairs, skipping malformed entries.
fn parse_overrides(raw: &str) -> HashMap<String, u32> {
    raw.split(',')
        .filter_map(|pair| {
            let (bin, index) = pair.split_once('=')?;
            let index = index.trim().parse().ok()?;
            let bin = bin.trim();
            if bin.is_empty() {
                return None;
            }
            Some((bin.to_string(), index))
        })
        .collect()
}
