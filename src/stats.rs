use serde::{Deserialize, Serialize};

/// Level every randomly generated combatant fights at.
pub const BATTLE_LEVEL: u32 = 50;

/// Highest level the stat formulas are defined for.
pub const MAX_LEVEL: u32 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Stat {
    Hp,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
}

impl Stat {
    /// Maps catalog stat names (`special-attack`, ...) onto [`Stat`].
    pub fn from_api_name(name: &str) -> Option<Stat> {
        match name {
            "hp" => Some(Stat::Hp),
            "attack" => Some(Stat::Atk),
            "defense" => Some(Stat::Def),
            "special-attack" => Some(Stat::Spa),
            "special-defense" => Some(Stat::Spd),
            "speed" => Some(Stat::Spe),
            _ => None,
        }
    }
}

// Neutral nature, zero effort values and maximal individual values folded
// into the 2 * base term. Integer division is the floor of 0.01 * 2 * base * level.
pub fn calc_hp(base: u32, level: u32) -> u32 {
    // Shedinja
    if base == 1 {
        return 1;
    }
    (2 * base * level) / 100 + level + 10
}

pub fn calc_stat(base: u32, level: u32) -> u32 {
    (2 * base * level) / 100 + 5
}

/// Projects one base statistic to its battle value at `level`.
pub fn project(base: u32, level: u32, is_hp: bool) -> u32 {
    if is_hp {
        calc_hp(base, level)
    } else {
        calc_stat(base, level)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatsSet {
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

impl StatsSet {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
        }
    }

    pub fn set(&mut self, stat: Stat, value: u32) {
        match stat {
            Stat::Hp => self.hp = value,
            Stat::Atk => self.atk = value,
            Stat::Def => self.def = value,
            Stat::Spa => self.spa = value,
            Stat::Spd => self.spd = value,
            Stat::Spe => self.spe = value,
        }
    }

    /// Derived battle stats for a set of base stats.
    pub fn project(base: &StatsSet, level: u32) -> StatsSet {
        StatsSet {
            hp: calc_hp(base.hp, level),
            atk: calc_stat(base.atk, level),
            def: calc_stat(base.def, level),
            spa: calc_stat(base.spa, level),
            spd: calc_stat(base.spd, level),
            spe: calc_stat(base.spe, level),
        }
    }
}
