//! Read-only data access the roster generator consumes.
//!
//! The battle engine never talks to a remote service itself; it is handed a
//! [`CatalogSource`]. [`MemoryCatalog`] serves records already in memory and
//! can be loaded from a JSON snapshot of the catalog.

use crate::error::CatalogError;
use crate::model::{CatalogEntry, CreatureRecord, MoveDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Base used to build listing references for records loaded from a snapshot.
pub const CATALOG_BASE_URL: &str = "https://pokeapi.co/api/v2";

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Ordered listing of at most `limit` entries.
    async fn fetch_listing(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Full record for a creature, looked up by name or numeric id.
    async fn fetch_creature(&self, name_or_id: &str) -> Result<CreatureRecord, CatalogError>;

    /// Move detail behind a move reference.
    async fn fetch_move(&self, reference: &str) -> Result<MoveDescriptor, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct CatalogSnapshot {
    pokemon: Vec<CreatureRecord>,
    #[serde(default)]
    moves: HashMap<String, MoveDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    listing: Vec<CatalogEntry>,
    creatures: HashMap<String, CreatureRecord>,
    moves: HashMap<String, MoveDescriptor>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a creature to the listing (kept in id order) and makes it fetchable.
    pub fn insert_creature(&mut self, record: CreatureRecord) {
        let reference = format!("{CATALOG_BASE_URL}/pokemon/{}/", record.id);
        self.listing.retain(|entry| entry.name != record.name);
        self.listing
            .push(CatalogEntry::new(record.name.clone(), reference));
        self.listing.sort_by_key(|entry| entry.id().unwrap_or(u32::MAX));
        self.creatures.insert(record.name.clone(), record);
    }

    pub fn insert_move(&mut self, reference: impl Into<String>, detail: MoveDescriptor) {
        self.moves.insert(reference.into(), detail);
    }

    pub fn len(&self) -> usize {
        self.listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let snapshot: CatalogSnapshot = serde_json::from_str(raw)?;
        let mut catalog = Self::new();
        for record in snapshot.pokemon {
            catalog.insert_creature(record);
        }
        for (reference, detail) in snapshot.moves {
            catalog.insert_move(reference, detail);
        }
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn fetch_listing(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.listing.iter().take(limit).cloned().collect())
    }

    async fn fetch_creature(&self, name_or_id: &str) -> Result<CreatureRecord, CatalogError> {
        let key = name_or_id.to_ascii_lowercase();
        if let Some(record) = self.creatures.get(&key) {
            return Ok(record.clone());
        }
        let by_id = key
            .parse::<u32>()
            .ok()
            .and_then(|id| self.creatures.values().find(|record| record.id == id));
        by_id
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name_or_id.to_string()))
    }

    async fn fetch_move(&self, reference: &str) -> Result<MoveDescriptor, CatalogError> {
        self.moves
            .get(reference)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(reference.to_string()))
    }
}
