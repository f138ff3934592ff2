//! Bin Index Resolver
//!
//! Maps a bin name to the stable database index that partitions one physical
//! node into independent namespaces. The mapping is loaded from durable
//! storage on first use, regenerated deterministically when absent or
//! incomplete, and cached for the remainder of the process lifetime.

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::Result;
use crate::mapping::{BinMapping, MappingStore};

// == Bin Resolver ==
/// Resolves bin names to database indices.
///
/// Regeneration is deterministic: the canonical bin list is sorted and
/// assigned indices 1..N in order, so the same list always yields the same
/// assignment across restarts. Explicit overrides are applied on top and are
/// not validated (hand-edited mappings may alias).
pub struct BinResolver {
    store: Box<dyn MappingStore>,
    canonical: Vec<String>,
    overrides: BinMapping,
    fallback: u32,
    cached: RwLock<Option<BinMapping>>,
}

impl BinResolver {
    /// Creates a resolver over the given mapping store.
    ///
    /// # Arguments
    /// * `store` - Durable storage for the persisted mapping
    /// * `canonical` - Known bin names; regeneration source
    /// * `overrides` - Explicit bin-to-index assignments that win over
    ///   regenerated ones
    /// * `fallback` - Index returned for bins absent from the mapping
    pub fn new(
        store: Box<dyn MappingStore>,
        canonical: Vec<String>,
        overrides: BinMapping,
        fallback: u32,
    ) -> Self {
        Self {
            store,
            canonical,
            overrides,
            fallback,
            cached: RwLock::new(None),
        }
    }

    /// Resolves the database index for `bin`.
    ///
    /// The first call populates the in-memory mapping; every later call in
    /// the process answers from it, even if the canonical list or the store
    /// contents change externally in the meantime. Bins the mapping does not
    /// know resolve to the fallback index.
    ///
    /// # Errors
    /// Fails when the mapping store is unreachable. This is deliberately not
    /// masked with the fallback index, since index 0 aliases the default
    /// database and a guessed index would misroute writes into another bin's
    /// namespace.
    pub fn resolve(&self, bin: &str) -> Result<u32> {
        if let Some(mapping) = self.cached.read().as_ref() {
            return Ok(self.lookup(mapping, bin));
        }

        let mut cached = self.cached.write();
        // Another caller may have populated the cache while we waited;
        // duplicate regeneration would be deterministic but wasteful
        if let Some(mapping) = cached.as_ref() {
            return Ok(self.lookup(mapping, bin));
        }

        let mapping = match self.store.load()? {
            Some(mapping) if !mapping.is_empty() && mapping.contains_key(bin) => {
                debug!("Loaded bin mapping with {} entries", mapping.len());
                mapping
            }
            _ => {
                let mapping = self.regenerate();
                info!(
                    "Regenerated bin mapping for {} bins",
                    mapping.len()
                );
                self.store.store(&mapping)?;
                mapping
            }
        };

        let index = self.lookup(&mapping, bin);
        *cached = Some(mapping);
        Ok(index)
    }

    fn lookup(&self, mapping: &BinMapping, bin: &str) -> u32 {
        mapping.get(bin).copied().unwrap_or(self.fallback)
    }

    /// Rebuilds the full mapping: canonical bins sorted, indices assigned by
    /// 1-based rank, then overrides applied on top.
    fn regenerate(&self) -> BinMapping {
        let mut names = self.canonical.clone();
        names.sort();
        names.dedup();

        let mut mapping: BinMapping = names.into_iter().zip(1u32..).collect();

        for (bin, index) in &self.overrides {
            mapping.insert(bin.clone(), *index);
        }
        mapping
    }
}

impl std::fmt::Debug for BinResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinResolver")
            .field("canonical", &self.canonical)
            .field("overrides", &self.overrides)
            .field("fallback", &self.fallback)
            .finish()
    }
}
