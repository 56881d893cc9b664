use crate::error::RosterError;
use crate::stats::{Stat, StatsSet};
use crate::types::PokemonType;
use serde::{Deserialize, Serialize};

/// Largest roster a side can field.
pub const MAX_ROSTER_SIZE: usize = 6;
/// Largest moveset a combatant can carry.
pub const MAX_MOVES: usize = 4;

/// `{name, url}` pair the catalog uses for every cross reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A creature in the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "url")]
    pub reference: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }

    /// Numeric id taken from the last path segment of the reference.
    pub fn id(&self) -> Option<u32> {
        self.reference
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl MoveCategory {
    fn from_name(name: &str) -> MoveCategory {
        match name {
            "physical" => MoveCategory::Physical,
            "special" => MoveCategory::Special,
            _ => MoveCategory::Status,
        }
    }
}

fn default_pp() -> u32 {
    10
}

/// Move detail record exactly as the catalog serves it.
#[derive(Debug, Clone, Deserialize)]
struct MoveRecord {
    name: String,
    #[serde(default)]
    power: Option<i64>,
    #[serde(default)]
    accuracy: Option<u32>,
    #[serde(default = "default_pp")]
    pp: u32,
    #[serde(rename = "type")]
    move_type: NamedRef,
    damage_class: NamedRef,
}

impl From<MoveRecord> for MoveDescriptor {
    fn from(record: MoveRecord) -> Self {
        MoveDescriptor {
            name: record.name,
            // Negative power is as unusable as a missing one.
            power: record.power.and_then(|p| u32::try_from(p).ok()),
            accuracy: record.accuracy,
            move_type: PokemonType::from_name(&record.move_type.name),
            category: MoveCategory::from_name(&record.damage_class.name),
            pp: record.pp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MoveRecord")]
pub struct MoveDescriptor {
    pub name: String,
    pub power: Option<u32>,
    pub accuracy: Option<u32>,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub pp: u32,
}

impl MoveDescriptor {
    pub fn new(
        name: impl Into<String>,
        move_type: PokemonType,
        category: MoveCategory,
        power: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            power,
            accuracy: Some(100),
            move_type,
            category,
            pp: default_pp(),
        }
    }

    /// Only fixed-power damaging moves can be used in battle.
    pub fn is_damaging(&self) -> bool {
        matches!(self.power, Some(power) if power > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
}

impl Sprites {
    /// Battle needs the front sprite for the opponent and the back sprite for the player.
    pub fn is_battle_ready(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|url| !url.is_empty());
        present(&self.front_default) && present(&self.back_default)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub type_ref: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub move_ref: NamedRef,
}

/// Full creature record returned by the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatureRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl CreatureRecord {
    pub fn types(&self) -> Vec<PokemonType> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|slot| slot.slot);
        slots
            .into_iter()
            .map(|slot| PokemonType::from_name(&slot.type_ref.name))
            .collect()
    }

    pub fn base_stats(&self) -> StatsSet {
        let mut base = StatsSet::default();
        for entry in &self.stats {
            if let Some(stat) = Stat::from_api_name(&entry.stat.name) {
                base.set(stat, entry.base_stat);
            }
        }
        base
    }

    pub fn learnable_moves(&self) -> impl Iterator<Item = &NamedRef> {
        self.moves.iter().map(|slot| &slot.move_ref)
    }
}

/// A battle-ready creature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combatant {
    pub id: u32,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: StatsSet,
    pub sprites: Sprites,
    pub level: u32,
    pub max_hp: u32,
    pub current_hp: u32,
    pub stats: StatsSet,
    pub moves: Vec<MoveDescriptor>,
    pub is_fainted: bool,
}

impl Combatant {
    /// Builds a full-health combatant. Returns `None` when the moveset is
    /// empty, longer than four moves, or contains a non-damaging move.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        types: Vec<PokemonType>,
        base_stats: StatsSet,
        moves: Vec<MoveDescriptor>,
        level: u32,
    ) -> Option<Self> {
        if moves.is_empty() || moves.len() > MAX_MOVES {
            return None;
        }
        if !moves.iter().all(MoveDescriptor::is_damaging) {
            return None;
        }
        let stats = StatsSet::project(&base_stats, level);
        Some(Self {
            id,
            name: name.into(),
            types,
            base_stats,
            sprites: Sprites::default(),
            level,
            max_hp: stats.hp,
            current_hp: stats.hp,
            stats,
            moves,
            is_fainted: false,
        })
    }

    pub fn from_record(
        record: &CreatureRecord,
        moves: Vec<MoveDescriptor>,
        level: u32,
    ) -> Option<Self> {
        let combatant = Self::new(
            record.id,
            record.name.clone(),
            record.types(),
            record.base_stats(),
            moves,
            level,
        )?;
        Some(combatant.with_sprites(record.sprites.clone()))
    }

    pub fn with_sprites(mut self, sprites: Sprites) -> Self {
        self.sprites = sprites;
        self
    }

    /// Subtracts `damage`, flooring at 0. Returns true when this hit caused the faint.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        if self.is_fainted {
            return false;
        }
        self.current_hp = self.current_hp.saturating_sub(damage);
        self.is_fainted = self.current_hp == 0;
        self.is_fainted
    }

    pub fn display_name(&self) -> String {
        self.name.to_uppercase()
    }
}

/// One side's ordered combatants plus the index of the one currently fighting.
///
/// Members are never removed or reordered; fainted members stay addressable.
/// A roster is only empty while a battle is still loading or failed to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Roster {
    members: Vec<Combatant>,
    active: usize,
}

impl Roster {
    pub fn new(members: Vec<Combatant>) -> Result<Self, RosterError> {
        if members.is_empty() || members.len() > MAX_ROSTER_SIZE {
            return Err(RosterError::InvalidSize(members.len()));
        }
        Ok(Self { members, active: 0 })
    }

    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&Combatant> {
        self.members.get(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Combatant> {
        self.members.get(self.active)
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut Combatant> {
        self.members.get_mut(self.active)
    }

    /// Makes `index` active if it names a member that can still fight.
    pub(crate) fn set_active(&mut self, index: usize) -> bool {
        match self.members.get(index) {
            Some(member) if !member.is_fainted => {
                self.active = index;
                true
            }
            _ => false,
        }
    }

    pub fn has_available(&self) -> bool {
        self.members.iter().any(|member| !member.is_fainted)
    }

    /// First member in roster order that has not fainted.
    pub fn next_available(&self) -> Option<usize> {
        self.members.iter().position(|member| !member.is_fainted)
    }

    /// Non-fainted members other than the active one.
    pub fn switch_candidates(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(idx, member)| *idx != self.active && !member.is_fainted)
            .map(|(idx, _)| idx)
            .collect()
    }
}
