pub mod ai;
pub mod battle_logger;
pub mod catalog;
pub mod config;
pub mod damage;
pub mod engine;
pub mod error;
pub mod model;
pub mod roster;
pub mod session;
pub mod stats;
pub mod types;

pub use crate::catalog::{CatalogSource, MemoryCatalog};
pub use crate::config::BattleConfig;
pub use crate::engine::{BattleEngine, BattleSnapshot, Phase, PlayerInput, Transition, Winner};
pub use crate::session::{BattleSession, PlayerController, Presenter, SessionOutcome};

use anyhow::Context;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::Path;

pub fn load_catalog(path: &Path) -> anyhow::Result<MemoryCatalog> {
    let catalog = MemoryCatalog::from_path(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
    if catalog.is_empty() {
        anyhow::bail!("Catalog at {} has no Pokémon", path.display());
    }
    Ok(catalog)
}

/// Fixed seed when configured, entropy otherwise.
pub fn battle_rng(config: &BattleConfig) -> SmallRng {
    match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}
