//! Routing Module
//!
//! The request-routing core: full-key construction, bin-to-database-index
//! resolution, the sharded node pool, and the router façade that composes
//! them into the get/set/delete/flush operation surface.

mod bins;
mod keyspace;
mod pool;
mod router;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use bins::BinResolver;
pub use keyspace::KeySpace;
pub use pool::{Node, NodePool};
pub use router::CacheRouter;
