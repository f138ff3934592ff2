//! Mapping Store Module
//!
//! Durable storage for the bin-to-database-index mapping. The resolver reads
//! the mapping once per process and writes it back after regeneration; this
//! module only moves the serialized map in and out of storage.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{ProxyError, Result};

/// The persisted bin-name to database-index mapping.
pub type BinMapping = HashMap<String, u32>;

// == Mapping Store Trait ==
/// Durable load/store of the serialized bin-index mapping.
///
/// `load` distinguishes "no mapping persisted" (`Ok(None)`) from "storage
/// unreachable" (`Err`): the first triggers regeneration, the second must
/// fail the resolving call outright so a named bin is never silently routed
/// to the default database.
pub trait MappingStore: Send + Sync {
    /// Fetches the persisted mapping, `None` if nothing usable is stored.
    fn load(&self) -> Result<Option<BinMapping>>;

    /// Persists the mapping, replacing any previous one.
    fn store(&self, mapping: &BinMapping) -> Result<()>;
}

// == File Mapping Store ==
/// Mapping persisted as a JSON object in a single file.
///
/// A mapping that deserializes to something other than a name-to-integer map
/// is treated the same as an absent one (logged, then regenerated); an
/// unreadable or unwritable file is a hard fault.
#[derive(Debug)]
pub struct FileMappingStore {
    path: PathBuf,
}

impl FileMappingStore {
    /// Creates a store backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MappingStore for FileMappingStore {
    fn load(&self) -> Result<Option<BinMapping>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ProxyError::MappingStore(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice::<BinMapping>(&bytes) {
            Ok(mapping) => Ok(Some(mapping)),
            Err(e) => {
                warn!(
                    "Malformed bin mapping in {}, will regenerate: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn store(&self, mapping: &BinMapping) -> Result<()> {
        let json = serde_json::to_vec_pretty(mapping)
            .map_err(|e| ProxyError::MappingStore(format!("serializing mapping: {}", e)))?;

        // Write to a sibling file and rename so a concurrent regeneration
        // never exposes a partially written mapping
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            ProxyError::MappingStore(format!("writing {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ProxyError::MappingStore(format!("replacing {}: {}", self.path.display(), e))
        })
    }
}

// == Memory Mapping Store ==
/// In-memory mapping store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryMappingStore {
    inner: Mutex<Option<BinMapping>>,
}

impl MemoryMappingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `mapping`.
    pub fn with_mapping(mapping: BinMapping) -> Self {
        Self {
            inner: Mutex::new(Some(mapping)),
        }
    }

    /// Replaces the stored mapping from outside (simulates external edits).
    pub fn replace(&self, mapping: Option<BinMapping>) {
        *self.inner.lock() = mapping;
    }
}

impl MappingStore for MemoryMappingStore {
    fn load(&self) -> Result<Option<BinMapping>> {
        Ok(self.inner.lock().clone())
    }

    fn store(&self, mapping: &BinMapping) -> Result<()> {
        *self.inner.lock() = Some(mapping.clone());
        Ok(())
    }
}
