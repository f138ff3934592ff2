//! Cache Router
//!
//! The façade composing the key namespacer, bin resolver, and node pool into
//! the get/set/delete/flush operation surface, and maintaining the per-bin
//! temporary-key registry on the nodes themselves.

use tracing::{debug, warn};

use crate::backend::{Backend, Connector};
use crate::config::{Expiry, ProxyConfig};
use crate::error::{ProxyError, Result};
use crate::mapping::MappingStore;
use crate::routing::{BinResolver, KeySpace, NodePool};

// == Cache Router ==
/// Routes cache operations to the owning node and database index.
///
/// Every operation starts the same way: build the full key, resolve the
/// bin's database index, route. Connectivity faults on the data path degrade
/// to cache misses or skipped writes; a mapping-store fault or an empty pool
/// is a hard error, because guessing a database index would silently corrupt
/// another bin's namespace and a dead pool must not masquerade as an endless
/// miss streak.
///
/// Holds no per-request state: the only memory is the constructor-injected
/// prefix, the process-lifetime bin mapping cache, and the pool connections.
#[derive(Debug)]
pub struct CacheRouter {
    keyspace: KeySpace,
    bins: BinResolver,
    pool: NodePool,
}

impl CacheRouter {
    /// Creates a router from its three components.
    ///
    /// Construction order is explicit: the pool and the resolver exist before
    /// the router; there is no lazily created global state behind it.
    pub fn new(keyspace: KeySpace, bins: BinResolver, pool: NodePool) -> Self {
        Self {
            keyspace,
            bins,
            pool,
        }
    }

    /// Builds a router from configuration, connecting the node pool through
    /// `connector` and resolving bins against `store`.
    pub fn from_config(
        config: &ProxyConfig,
        connector: &dyn Connector,
        store: Box<dyn MappingStore>,
    ) -> Result<Self> {
        let pool = NodePool::connect_all(&config.servers, connector)?;
        let bins = BinResolver::new(
            store,
            config.bins.clone(),
            config.bin_overrides.clone(),
            config.default_db_index,
        );
        let keyspace = KeySpace::new(config.key_prefix.clone());
        Ok(Self::new(keyspace, bins, pool))
    }

    /// The node pool behind this router.
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// The set entry tracking a bin's temporary keys on each node.
    fn temporary_set_key(bin: &str) -> String {
        format!("{}:temporary", bin)
    }

    // == Get ==
    /// Reads the value cached under `key` in `bin`.
    ///
    /// Returns `Ok(None)` both for a plain miss and for a connectivity fault
    /// on the routed node (cache-miss-on-error policy): a cache is always
    /// allowed to not have an entry.
    pub async fn get(&self, key: &str, bin: &str) -> Result<Option<String>> {
        let full_key = self.keyspace.build_key(key, bin);
        let db = self.bins.resolve(bin)?;
        let node = self.pool.route(&full_key)?;

        let mut backend = match node.activate(db).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Get degraded to miss, node {}: {}", node.addr(), e);
                return Ok(None);
            }
        };

        match backend.get(&full_key) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Get degraded to miss, node {}: {}", node.addr(), e);
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Writes `value` under `key` in `bin`.
    ///
    /// `Expiry::Seconds` applies a TTL; `Expiry::Temporary` stores without a
    /// TTL and registers the full key in the bin's temporary set on the same
    /// node, for bulk removal by [`CacheRouter::flush`]; `Expiry::Permanent`
    /// stores without either. A connectivity fault skips the write (logged),
    /// it does not fail the call.
    pub async fn set(&self, key: &str, value: &str, expire: Expiry, bin: &str) -> Result<()> {
        let full_key = self.keyspace.build_key(key, bin);
        let db = self.bins.resolve(bin)?;
        let node = self.pool.route(&full_key)?;

        let mut backend = match node.activate(db).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Set skipped, node {}: {}", node.addr(), e);
                return Ok(());
            }
        };

        let written = match expire {
            Expiry::Permanent | Expiry::Seconds(0) => backend.set(&full_key, value),
            Expiry::Seconds(secs) => backend.set_ex(&full_key, value, secs),
            Expiry::Temporary => backend.set(&full_key, value).and_then(|()| {
                // Register only after the entry exists, so the set never
                // holds a member with no backing entry
                backend
                    .sadd(&Self::temporary_set_key(bin), &full_key)
                    .map(|_| ())
            }),
        };

        if let Err(e) = written {
            warn!("Set skipped, node {}: {}", node.addr(), e);
        }
        Ok(())
    }

    // == Delete ==
    /// Deletes entries from `bin`.
    ///
    /// * `wildcard == false`: deletes exactly the full key built from `cid`
    ///   and drops it from the bin's temporary set (idempotent).
    /// * `wildcard == true, cid == "*"`: wipes the bin's database index on
    ///   every node. Other bins sharing the node live in other database
    ///   indices and are untouched.
    /// * `wildcard == true` otherwise: scans every node for keys matching
    ///   the encoded prefix and deletes each, dropping temporary-set
    ///   membership as it goes. All nodes must be scanned; sharding cannot
    ///   predict where a prefix's keys live.
    pub async fn delete(&self, cid: &str, wildcard: bool, bin: &str) -> Result<()> {
        let db = self.bins.resolve(bin)?;

        if !wildcard {
            return self.delete_one(cid, bin, db).await;
        }

        if cid == "*" {
            return self
                .fan_out(db, "wipe", |backend| backend.flush_db())
                .await;
        }

        let pattern = format!("{}*", self.keyspace.build_key(cid, bin));
        let temp_key = Self::temporary_set_key(bin);
        self.fan_out(db, "wildcard delete", |backend| {
            let matched = backend.keys(&pattern)?;
            debug!("Wildcard delete matched {} keys", matched.len());
            for full_key in matched {
                backend.del(&full_key)?;
                backend.srem(&temp_key, &full_key)?;
            }
            Ok(())
        })
        .await
    }

    /// Deletes one full key on its owning node.
    async fn delete_one(&self, cid: &str, bin: &str, db: u32) -> Result<()> {
        let full_key = self.keyspace.build_key(cid, bin);
        let node = self.pool.route(&full_key)?;

        let mut backend = match node.activate(db).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Delete skipped, node {}: {}", node.addr(), e);
                return Ok(());
            }
        };

        let removed = backend.del(&full_key).and_then(|_| {
            // Membership must not dangle after an explicit delete
            backend.srem(&Self::temporary_set_key(bin), &full_key)
        });
        if let Err(e) = removed {
            warn!("Delete skipped, node {}: {}", node.addr(), e);
        }
        Ok(())
    }

    // == Flush ==
    /// Removes every temporary key of `bin` on every node, then removes the
    /// registry entries themselves.
    ///
    /// Idempotent: with no intervening temporary writes, a second flush finds
    /// empty registries and changes nothing.
    pub async fn flush(&self, bin: &str) -> Result<()> {
        let db = self.bins.resolve(bin)?;
        let temp_key = Self::temporary_set_key(bin);

        self.fan_out(db, "flush", |backend| {
            let members = backend.smembers(&temp_key)?;
            debug!("Flushing {} temporary keys", members.len());
            for full_key in &members {
                backend.del(full_key)?;
            }
            backend.del(&temp_key)?;
            Ok(())
        })
        .await
    }

    /// Runs `op` against the activated database on every node.
    ///
    /// Per-node failures are isolated: one failing node does not abort the
    /// rest. The aggregate succeeds when at least one node succeeded and
    /// fails only when every node failed.
    async fn fan_out(
        &self,
        db: u32,
        what: &str,
        mut op: impl FnMut(&mut Box<dyn Backend>) -> Result<()>,
    ) -> Result<()> {
        let nodes = self.pool.all_nodes();
        if nodes.is_empty() {
            return Err(ProxyError::NoNodes);
        }

        let mut succeeded = 0usize;
        for node in nodes {
            let outcome = match node.activate(db).await {
                Ok(mut backend) => op(&mut *backend),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => succeeded += 1,
                Err(e) => warn!("{} failed on node {}: {}", what, node.addr(), e),
            }
        }

        if succeeded == 0 {
            return Err(ProxyError::AllNodesFailed(nodes.len()));
        }
        Ok(())
    }
}
