//! Shardcache - A sharded key-value caching proxy
//!
//! Routes cache operations across a pool of independent backend nodes,
//! partitions cache bins into per-node database indices, and tracks
//! temporary keys for bulk invalidation.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod mapping;
pub mod models;
pub mod routing;

pub use api::AppState;
pub use backend::{Backend, Connector, MemoryCluster};
pub use config::{Expiry, ProxyConfig};
pub use error::{ProxyError, Result};
pub use mapping::{FileMappingStore, MappingStore, MemoryMappingStore};
pub use routing::{BinResolver, CacheRouter, KeySpace, NodePool};
