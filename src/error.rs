//! Error types for catalog access and roster construction.
//!
//! Move-detail failures never show up here: the roster generator drops the
//! move and keeps going. Inputs that are illegal for the current battle phase
//! are not errors either, see [`crate::engine::Transition::Ignored`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found in catalog")]
    NotFound(String),

    #[error("catalog transport failed: {0}")]
    Transport(String),

    #[error("failed to decode catalog data")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read catalog data")]
    Io(#[from] std::io::Error),
}

/// Fatal roster construction failures. Any of these ends battle initialization.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster size must be between 1 and 6, got {0}")]
    InvalidSize(usize),

    #[error("failed to fetch catalog listing")]
    Listing(#[source] CatalogError),

    #[error("catalog has {available} usable entries, {requested} requested")]
    InsufficientCatalog { available: usize, requested: usize },

    #[error("failed to fetch {name}")]
    Creature {
        name: String,
        #[source]
        source: CatalogError,
    },

    #[error("gave up after discarding {discarded} candidates ({built}/{requested} slots filled)")]
    ReplacementsExhausted {
        requested: usize,
        built: usize,
        discarded: usize,
    },
}
