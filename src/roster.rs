//! Random roster construction from a [`CatalogSource`].
//!
//! Creatures are drawn without replacement from the primary-form part of the
//! listing. A candidate that ends up with no usable move, or lacks battle
//! sprites, is discarded and the slot is refilled from the remaining pool. A
//! failed listing or creature fetch aborts the whole build.

use crate::catalog::CatalogSource;
use crate::config::BattleConfig;
use crate::error::RosterError;
use crate::model::{
    CatalogEntry, Combatant, CreatureRecord, MoveDescriptor, NamedRef, Roster, MAX_MOVES,
    MAX_ROSTER_SIZE,
};
use futures_util::future::{join_all, try_join_all};
use phf::phf_set;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

/// One-hit-KO moves that do not carry `ohko` in their name.
static OHKO_MOVES: phf::Set<&'static str> = phf_set! {
    "fissure",
    "guillotine",
    "horn-drill",
    "sheer-cold",
};

pub fn is_ohko_move(name: &str) -> bool {
    name.contains("ohko") || OHKO_MOVES.contains(name)
}

pub struct RosterGenerator<'a, C: CatalogSource + ?Sized> {
    catalog: &'a C,
    level: u32,
    catalog_limit: usize,
    primary_form_max_id: u32,
    max_replacements: usize,
}

impl<'a, C: CatalogSource + ?Sized> RosterGenerator<'a, C> {
    pub fn new(catalog: &'a C, config: &BattleConfig) -> Self {
        Self {
            catalog,
            level: config.level,
            catalog_limit: config.catalog_limit,
            primary_form_max_id: config.primary_form_max_id,
            max_replacements: config.max_replacements,
        }
    }

    /// Builds a roster of exactly `size` combatants in draw order.
    pub async fn generate<R: Rng + Send>(
        &self,
        size: usize,
        rng: &mut R,
        progress: &mut (dyn FnMut(&str) + Send),
    ) -> Result<Roster, RosterError> {
        if !(1..=MAX_ROSTER_SIZE).contains(&size) {
            return Err(RosterError::InvalidSize(size));
        }

        progress("Fetching Pokémon list...");
        let listing = self
            .catalog
            .fetch_listing(self.catalog_limit)
            .await
            .map_err(RosterError::Listing)?;
        let mut pool: Vec<CatalogEntry> = listing
            .into_iter()
            .filter(|entry| self.is_primary_form(entry))
            .collect();
        if pool.len() < size {
            return Err(RosterError::InsufficientCatalog {
                available: pool.len(),
                requested: size,
            });
        }
        pool.shuffle(rng);
        let mut draws = pool.into_iter();

        let initial: Vec<CatalogEntry> = draws.by_ref().take(size).collect();
        for entry in &initial {
            progress(&format!("Fetching data for {}...", entry.name));
        }
        let records = try_join_all(initial.iter().map(|entry| self.fetch_creature(entry))).await?;

        let mut members = Vec::with_capacity(size);
        let mut discarded = 0usize;
        for record in &records {
            match self.resolve(record, rng, progress).await {
                Some(combatant) => members.push(combatant),
                None => discarded += 1,
            }
        }

        // Refill discarded slots one at a time from what is left of the pool.
        let mut replacements = 0usize;
        while members.len() < size {
            let next = match draws.next() {
                Some(entry) if replacements < self.max_replacements => entry,
                _ => {
                    return Err(RosterError::ReplacementsExhausted {
                        requested: size,
                        built: members.len(),
                        discarded,
                    })
                }
            };
            replacements += 1;
            debug!(name = %next.name, replacements, "drawing replacement candidate");
            progress(&format!("Fetching data for {}...", next.name));
            let record = self.fetch_creature(&next).await?;
            match self.resolve(&record, rng, progress).await {
                Some(combatant) => members.push(combatant),
                None => discarded += 1,
            }
        }

        info!(size, discarded, "roster ready");
        Roster::new(members)
    }

    fn is_primary_form(&self, entry: &CatalogEntry) -> bool {
        // Entries without a numeric reference are kept; the fetch decides.
        entry.id().map_or(true, |id| id <= self.primary_form_max_id)
    }

    async fn fetch_creature(&self, entry: &CatalogEntry) -> Result<CreatureRecord, RosterError> {
        self.catalog
            .fetch_creature(&entry.name)
            .await
            .map_err(|source| RosterError::Creature {
                name: entry.name.clone(),
                source,
            })
    }

    /// Picks and fetches up to four moves. `None` means the candidate is unusable.
    async fn resolve<R: Rng + Send>(
        &self,
        record: &CreatureRecord,
        rng: &mut R,
        progress: &mut (dyn FnMut(&str) + Send),
    ) -> Option<Combatant> {
        progress(&format!("Learning moves for {}...", record.name));
        if !record.sprites.is_battle_ready() {
            debug!(name = %record.name, "discarding candidate without battle sprites");
            return None;
        }

        let learnable: Vec<&NamedRef> = record
            .learnable_moves()
            .filter(|mv| !is_ohko_move(&mv.name))
            .collect();
        let picked: Vec<&NamedRef> = learnable
            .choose_multiple(rng, MAX_MOVES)
            .copied()
            .collect();
        let moves: Vec<MoveDescriptor> = join_all(picked.into_iter().map(|mv| self.fetch_move(mv)))
            .await
            .into_iter()
            .flatten()
            .collect();

        if moves.is_empty() {
            debug!(name = %record.name, "discarding candidate without usable moves");
            return None;
        }
        Combatant::from_record(record, moves, self.level)
    }

    async fn fetch_move(&self, reference: &NamedRef) -> Option<MoveDescriptor> {
        match self.catalog.fetch_move(&reference.url).await {
            Ok(detail) if detail.is_damaging() => Some(detail),
            Ok(detail) => {
                debug!(move_name = %detail.name, "skipping non-damaging move");
                None
            }
            Err(err) => {
                debug!(move_name = %reference.name, error = %err, "move detail unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohko_moves_are_recognised() {
        for name in ["fissure", "guillotine", "horn-drill", "sheer-cold", "fake-ohko-move"] {
            assert!(is_ohko_move(name), "{name}");
        }
        for name in ["tackle", "horn-attack", "ice-beam"] {
            assert!(!is_ohko_move(name), "{name}");
        }
    }

    #[test]
    fn alternate_forms_are_filtered_by_id() {
        let catalog = crate::catalog::MemoryCatalog::new();
        let generator = RosterGenerator::new(&catalog, &BattleConfig::default());
        assert!(generator.is_primary_form(&CatalogEntry::new(
            "pikachu",
            "https://pokeapi.co/api/v2/pokemon/25/"
        )));
        assert!(!generator.is_primary_form(&CatalogEntry::new(
            "charizard-mega-x",
            "https://pokeapi.co/api/v2/pokemon/10034/"
        )));
        assert!(generator.is_primary_form(&CatalogEntry::new("odd", "")));
    }
}
