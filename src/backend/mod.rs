//! Backend Module
//!
//! The key-value store collaborator behind each node, captured as an explicit
//! trait. The proxy depends only on these primitives; the storage engine
//! itself (persistence, eviction) belongs to the node.

mod memory;

pub use memory::{MemoryCluster, SharedMemoryBackend};

use crate::error::Result;

// == Backend Trait ==
/// The primitive operations the proxy issues against one backend connection.
///
/// Methods take `&mut self` because a connection carries session state: the
/// database selected with [`Backend::select`] applies to every following
/// command on the same connection. Callers must pair `select` with the
/// commands that depend on it under one exclusive borrow (the node pool's
/// per-node lock provides this).
pub trait Backend: Send {
    /// Reads the value stored under `key`, `None` on a miss.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` with no TTL.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Stores `value` under `key` with a TTL of `ttl_secs` seconds.
    fn set_ex(&mut self, key: &str, value: &str, ttl_secs: u32) -> Result<()>;

    /// Deletes `key`, returning whether an entry existed.
    fn del(&mut self, key: &str) -> Result<bool>;

    /// Selects the logical database all following commands operate on.
    fn select(&mut self, db: u32) -> Result<()>;

    /// Returns all keys matching a glob pattern (`prefix*` or a literal).
    fn keys(&mut self, pattern: &str) -> Result<Vec<String>>;

    /// Adds `member` to the set stored under `key`, returning whether it was new.
    fn sadd(&mut self, key: &str, member: &str) -> Result<bool>;

    /// Removes `member` from the set stored under `key`, returning whether it
    /// was present. Removing an absent member is a no-op.
    fn srem(&mut self, key: &str, member: &str) -> Result<bool>;

    /// Returns every member of the set stored under `key` (empty if absent).
    fn smembers(&mut self, key: &str) -> Result<Vec<String>>;

    /// Wipes the currently selected database only.
    fn flush_db(&mut self) -> Result<()>;
}

// == Connector Trait ==
/// Establishes one backend connection per node address.
///
/// A connector failure for one address must not prevent connecting the rest;
/// the node pool excludes failed addresses and carries on.
///
/// Implementations against a networked store should impose connect and
/// per-operation timeouts, so one unresponsive node cannot stall a pool-wide
/// fan-out indefinitely.
pub trait Connector {
    /// Connects to the backend at `addr` (`host:port`).
    fn connect(&self, addr: &str) -> Result<Box<dyn Backend>>;
}
