//! In-Memory Backend
//!
//! A process-local key-value store implementing the [`Backend`] primitives:
//! numbered databases, TTL-expiring string entries, and set values. Backs the
//! demo server's in-process shards and the test suites.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::backend::{Backend, Connector};
use crate::error::{ProxyError, Result};

// == Stored Entry ==
/// A single string entry with an optional expiration timestamp.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn new(value: &str, ttl_secs: Option<u32>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl_secs.map(|secs| Utc::now() + Duration::seconds(i64::from(secs))),
        }
    }

    /// An entry is expired once the current time reaches its expiration.
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }
}

// == Database ==
/// One logical database inside a node: string entries plus set values.
///
/// Entries expire lazily on read; there is no sweeper thread.
#[derive(Debug, Default)]
struct Database {
    entries: HashMap<String, StoredEntry>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// Shared store state for one simulated node.
#[derive(Debug, Default)]
struct MemoryState {
    databases: HashMap<u32, Database>,
}

// == Shared Memory Backend ==
/// A connection handle onto one in-memory node.
///
/// The store state is shared between handles (like connections to one
/// server), while the selected database is per-handle session state.
#[derive(Debug, Clone)]
pub struct SharedMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    selected: u32,
}

impl SharedMemoryBackend {
    fn new(state: Arc<Mutex<MemoryState>>) -> Self {
        Self { state, selected: 0 }
    }

    /// Runs `f` against the currently selected database, creating it on first use.
    fn with_db<T>(&self, f: impl FnOnce(&mut Database) -> T) -> T {
        let mut state = self.state.lock();
        let db = state.databases.entry(self.selected).or_default();
        f(db)
    }
}

impl Backend for SharedMemoryBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.with_db(|db| {
            let expired = match db.entries.get(key) {
                Some(entry) => entry.is_expired(),
                None => return None,
            };
            if expired {
                db.entries.remove(key);
                return None;
            }
            db.entries.get(key).map(|entry| entry.value.clone())
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.with_db(|db| {
            db.entries.insert(key.to_string(), StoredEntry::new(value, None));
        });
        Ok(())
    }

    fn set_ex(&mut self, key: &str, value: &str, ttl_secs: u32) -> Result<()> {
        self.with_db(|db| {
            db.entries
                .insert(key.to_string(), StoredEntry::new(value, Some(ttl_secs)));
        });
        Ok(())
    }

    fn del(&mut self, key: &str) -> Result<bool> {
        Ok(self.with_db(|db| {
            let had_entry = db.entries.remove(key).is_some();
            let had_set = db.sets.remove(key).is_some();
            had_entry || had_set
        }))
    }

    fn select(&mut self, db: u32) -> Result<()> {
        self.selected = db;
        Ok(())
    }

    fn keys(&mut self, pattern: &str) -> Result<Vec<String>> {
        Ok(self.with_db(|db| {
            // Expired entries must not appear in a scan
            db.entries.retain(|_, entry| !entry.is_expired());

            let matched: BTreeSet<String> = match pattern.strip_suffix('*') {
                Some(prefix) => db
                    .entries
                    .keys()
                    .chain(db.sets.keys())
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect(),
                None => db
                    .entries
                    .keys()
                    .chain(db.sets.keys())
                    .filter(|k| k.as_str() == pattern)
                    .cloned()
                    .collect(),
            };
            matched.into_iter().collect()
        }))
    }

    fn sadd(&mut self, key: &str, member: &str) -> Result<bool> {
        Ok(self.with_db(|db| {
            db.sets
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string())
        }))
    }

    fn srem(&mut self, key: &str, member: &str) -> Result<bool> {
        Ok(self.with_db(|db| {
            let Some(set) = db.sets.get_mut(key) else {
                return false;
            };
            let removed = set.remove(member);
            if set.is_empty() {
                db.sets.remove(key);
            }
            removed
        }))
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>> {
        Ok(self.with_db(|db| {
            db.sets
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default()
        }))
    }

    fn flush_db(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.databases.remove(&self.selected);
        Ok(())
    }
}

// == Memory Cluster ==
/// A connector serving in-process nodes, one per address label.
///
/// Node state is created on first connect and shared by every later handle
/// for the same address. Addresses can be marked unreachable to exercise
/// connectivity-fault handling.
#[derive(Debug, Default, Clone)]
pub struct MemoryCluster {
    nodes: Arc<Mutex<HashMap<String, Arc<Mutex<MemoryState>>>>>,
    unreachable: BTreeSet<String>,
}

impl MemoryCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `addr` as refusing connections.
    pub fn with_unreachable(mut self, addr: &str) -> Self {
        self.unreachable.insert(addr.to_string());
        self
    }

    /// Returns a direct handle onto the node at `addr`, bypassing
    /// reachability checks. Useful for inspecting node contents in tests.
    pub fn handle(&self, addr: &str) -> SharedMemoryBackend {
        let mut nodes = self.nodes.lock();
        let state = nodes.entry(addr.to_string()).or_default().clone();
        SharedMemoryBackend::new(state)
    }
}

impl Connector for MemoryCluster {
    fn connect(&self, addr: &str) -> Result<Box<dyn Backend>> {
        if self.unreachable.contains(addr) {
            return Err(ProxyError::NodeUnreachable {
                addr: addr.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(self.handle(addr)))
    }
}
