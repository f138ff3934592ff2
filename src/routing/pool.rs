//! Node Pool
//!
//! Ordered set of live connections to the configured backend nodes, plus the
//! sharding function that assigns each full key to exactly one of them.

use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::backend::{Backend, Connector};
use crate::error::{ProxyError, Result};

// == Node ==
/// A live connection to one backend node.
///
/// The connection is guarded by an async mutex: selecting a database is
/// connection state, so a database activation and the commands that depend on
/// it must run under one continuous lock.
pub struct Node {
    addr: String,
    backend: Mutex<Box<dyn Backend>>,
}

impl Node {
    fn new(addr: &str, backend: Box<dyn Backend>) -> Self {
        Self {
            addr: addr.to_string(),
            backend: Mutex::new(backend),
        }
    }

    /// The `host:port` address this node was connected with.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Locks the connection and selects `db`, returning the guard so the
    /// caller's following commands run against the activated database.
    ///
    /// # Errors
    /// A failed activation propagates; issuing commands after a failed SELECT
    /// would silently land them in the wrong namespace.
    pub async fn activate(&self, db: u32) -> Result<MutexGuard<'_, Box<dyn Backend>>> {
        let mut backend = self.backend.lock().await;
        backend.select(db)?;
        Ok(backend)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("addr", &self.addr).finish()
    }
}

// == Node Pool ==
/// The ordered pool of live nodes.
///
/// Order matches the configured address order and determines shard identity:
/// reordering addresses, or losing a node at connect time, changes key
/// ownership for most keys. That reshuffle is accepted cache behavior (old
/// entries become misses), not data loss.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Node>,
}

impl NodePool {
    /// Connects to every address in order, one node per address.
    ///
    /// A connection failure excludes that node (logged as a connectivity
    /// fault) without aborting the rest; the pool just comes up smaller than
    /// configured.
    ///
    /// # Errors
    /// Fails with [`ProxyError::NoNodes`] only when no address yields a
    /// usable connection. A totally unreachable pool must be a visible hard
    /// failure, not an endless stream of silent cache misses.
    pub fn connect_all(addresses: &[String], connector: &dyn Connector) -> Result<Self> {
        let mut nodes = Vec::with_capacity(addresses.len());
        for addr in addresses {
            match connector.connect(addr) {
                Ok(backend) => nodes.push(Node::new(addr, backend)),
                Err(e) => warn!("Excluding node {}: {}", addr, e),
            }
        }

        if nodes.is_empty() {
            return Err(ProxyError::NoNodes);
        }

        info!(
            "Node pool connected: {}/{} nodes live",
            nodes.len(),
            addresses.len()
        );
        Ok(Self { nodes })
    }

    /// Picks the node owning `full_key`.
    ///
    /// A single-node pool returns its node unconditionally; otherwise the
    /// owner is `crc32(full_key) mod live_count`. Stateless and
    /// deterministic within a process, but not stable under pool-size
    /// changes. The checksum covers the whole namespaced key, so the same
    /// logical key in two bins shards independently.
    pub fn route(&self, full_key: &str) -> Result<&Node> {
        match self.nodes.len() {
            0 => Err(ProxyError::NoNodes),
            1 => Ok(&self.nodes[0]),
            n => {
                let hash = crc32fast::hash(full_key.as_bytes());
                Ok(&self.nodes[hash as usize % n])
            }
        }
    }

    /// Every live node, in configured order, for pool-wide fan-outs.
    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the pool holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryCluster;
    use std::collections::HashMap;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_connect_all_preserves_order() {
        let cluster = MemoryCluster::new();
        let pool =
            NodePool::connect_all(&addrs(&["n1:1", "n2:2", "n3:3"]), &cluster).unwrap();
        let order: Vec<&str> = pool.all_nodes().iter().map(|n| n.addr()).collect();
        assert_eq!(order, vec!["n1:1", "n2:2", "n3:3"]);
    }

    #[test]
    fn test_connect_all_excludes_failed_nodes() {
        let cluster = MemoryCluster::new().with_unreachable("n2:2");
        let pool =
            NodePool::connect_all(&addrs(&["n1:1", "n2:2", "n3:3"]), &cluster).unwrap();
        assert_eq!(pool.len(), 2);
        let order: Vec<&str> = pool.all_nodes().iter().map(|n| n.addr()).collect();
        assert_eq!(order, vec!["n1:1", "n3:3"]);
    }

    #[test]
    fn test_connect_all_fails_when_all_unreachable() {
        let cluster = MemoryCluster::new()
            .with_unreachable("n1:1")
            .with_unreachable("n2:2");
        let result = NodePool::connect_all(&addrs(&["n1:1", "n2:2"]), &cluster);
        assert!(matches!(result, Err(ProxyError::NoNodes)));
    }

    #[test]
    fn test_route_single_node_unconditional() {
        let cluster = MemoryCluster::new();
        let pool = NodePool::connect_all(&addrs(&["only:1"]), &cluster).unwrap();
        for key in ["a", "b", "c", "anything%3Aat%3Aall"] {
            assert_eq!(pool.route(key).unwrap().addr(), "only:1");
        }
    }

    #[test]
    fn test_route_is_deterministic() {
        let cluster = MemoryCluster::new();
        let pool =
            NodePool::connect_all(&addrs(&["n1:1", "n2:2", "n3:3"]), &cluster).unwrap();
        let first = pool.route("cache%3Asome_key").unwrap().addr().to_string();
        for _ in 0..50 {
            assert_eq!(pool.route("cache%3Asome_key").unwrap().addr(), first);
        }
    }

    #[test]
    fn test_route_matches_crc32_mod() {
        let cluster = MemoryCluster::new();
        let pool =
            NodePool::connect_all(&addrs(&["n1:1", "n2:2", "n3:3"]), &cluster).unwrap();
        let key = "cache%3Acheck";
        let expected = crc32fast::hash(key.as_bytes()) as usize % 3;
        assert_eq!(
            pool.route(key).unwrap().addr(),
            pool.all_nodes()[expected].addr()
        );
    }

    #[test]
    fn test_route_distribution_is_non_trivial() {
        let cluster = MemoryCluster::new();
        let pool =
            NodePool::connect_all(&addrs(&["n1:1", "n2:2", "n3:3"]), &cluster).unwrap();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for i in 0..3000 {
            let key = format!("cache%3Akey_{}", i);
            let addr = pool.route(&key).unwrap().addr().to_string();
            *counts.entry(addr).or_default() += 1;
        }

        // Expect roughly 1000 per node; no node may be starved
        assert_eq!(counts.len(), 3);
        for (addr, count) in counts {
            assert!(
                count > 300,
                "node {} starved with {} of 3000 keys",
                addr,
                count
            );
        }
    }

    #[tokio::test]
    async fn test_activate_selects_database() {
        let cluster = MemoryCluster::new();
        let pool = NodePool::connect_all(&addrs(&["n1:1"]), &cluster).unwrap();
        let node = pool.route("whatever").unwrap();

        {
            let mut backend = node.activate(3).await.unwrap();
            backend.set("k", "v").unwrap();
        }

        // Visible through a fresh handle only after selecting db 3
        let mut direct = cluster.handle("n1:1");
        assert_eq!(direct.get("k").unwrap(), None);
        direct.select(3).unwrap();
        assert_eq!(direct.get("k").unwrap(), Some("v".to_string()));
    }
}
