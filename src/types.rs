//! Elemental types and the attacking-vs-defending effectiveness table.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
    /// Catalog types with no chart row (`unknown`, `shadow`, `stellar`).
    #[serde(other)]
    Unknown,
}

impl PokemonType {
    pub fn from_name(name: &str) -> PokemonType {
        match name.to_ascii_lowercase().as_str() {
            "normal" => PokemonType::Normal,
            "fire" => PokemonType::Fire,
            "water" => PokemonType::Water,
            "electric" => PokemonType::Electric,
            "grass" => PokemonType::Grass,
            "ice" => PokemonType::Ice,
            "fighting" => PokemonType::Fighting,
            "poison" => PokemonType::Poison,
            "ground" => PokemonType::Ground,
            "flying" => PokemonType::Flying,
            "psychic" => PokemonType::Psychic,
            "bug" => PokemonType::Bug,
            "rock" => PokemonType::Rock,
            "ghost" => PokemonType::Ghost,
            "dragon" => PokemonType::Dragon,
            "dark" => PokemonType::Dark,
            "steel" => PokemonType::Steel,
            "fairy" => PokemonType::Fairy,
            _ => PokemonType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Electric => "electric",
            PokemonType::Grass => "grass",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
            PokemonType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the chart: every defending type the attacking type does not hit for 1x.
struct Matchup {
    double: &'static [PokemonType],
    half: &'static [PokemonType],
    immune: &'static [PokemonType],
}

fn matchup(attacking: PokemonType) -> Option<Matchup> {
    use PokemonType::*;
    let row = match attacking {
        Normal => Matchup {
            double: &[],
            half: &[Rock, Steel],
            immune: &[Ghost],
        },
        Fire => Matchup {
            double: &[Grass, Ice, Bug, Steel],
            half: &[Fire, Water, Rock, Dragon],
            immune: &[],
        },
        Water => Matchup {
            double: &[Fire, Ground, Rock],
            half: &[Water, Grass, Dragon],
            immune: &[],
        },
        Electric => Matchup {
            double: &[Water, Flying],
            half: &[Electric, Grass, Dragon],
            immune: &[Ground],
        },
        Grass => Matchup {
            double: &[Water, Ground, Rock],
            half: &[Fire, Grass, Poison, Flying, Bug, Dragon, Steel],
            immune: &[],
        },
        Ice => Matchup {
            double: &[Grass, Ground, Flying, Dragon],
            half: &[Fire, Water, Ice, Steel],
            immune: &[],
        },
        Fighting => Matchup {
            double: &[Normal, Ice, Rock, Dark, Steel],
            half: &[Poison, Flying, Psychic, Bug, Fairy],
            immune: &[Ghost],
        },
        Poison => Matchup {
            double: &[Grass, Fairy],
            half: &[Poison, Ground, Rock, Ghost],
            immune: &[Steel],
        },
        Ground => Matchup {
            double: &[Fire, Electric, Poison, Rock, Steel],
            half: &[Grass, Bug],
            immune: &[Flying],
        },
        Flying => Matchup {
            double: &[Grass, Fighting, Bug],
            half: &[Electric, Rock, Steel],
            immune: &[],
        },
        Psychic => Matchup {
            double: &[Fighting, Poison],
            half: &[Psychic, Steel],
            immune: &[Dark],
        },
        Bug => Matchup {
            double: &[Grass, Psychic, Dark],
            half: &[Fire, Fighting, Poison, Flying, Ghost, Steel, Fairy],
            immune: &[],
        },
        Rock => Matchup {
            double: &[Fire, Ice, Flying, Bug],
            half: &[Fighting, Ground, Steel],
            immune: &[],
        },
        Ghost => Matchup {
            double: &[Psychic, Ghost],
            half: &[Dark],
            immune: &[Normal],
        },
        Dragon => Matchup {
            double: &[Dragon],
            half: &[Steel],
            immune: &[Fairy],
        },
        Dark => Matchup {
            double: &[Psychic, Ghost],
            half: &[Fighting, Dark, Fairy],
            immune: &[],
        },
        Steel => Matchup {
            double: &[Ice, Rock, Fairy],
            half: &[Fire, Water, Electric, Steel],
            immune: &[],
        },
        Fairy => Matchup {
            double: &[Fighting, Dragon, Dark],
            half: &[Fire, Poison, Steel],
            immune: &[],
        },
        Unknown => return None,
    };
    Some(row)
}

/// Multiplier for a single attacking/defending pair. Pairs missing from the chart are 1x.
pub fn single_type_effectiveness(attacking: PokemonType, defending: PokemonType) -> f64 {
    let Some(row) = matchup(attacking) else {
        return 1.0;
    };
    if row.immune.contains(&defending) {
        0.0
    } else if row.double.contains(&defending) {
        2.0
    } else if row.half.contains(&defending) {
        0.5
    } else {
        1.0
    }
}

/// Product of the per-type multipliers over every defending type.
pub fn type_effectiveness(move_type: PokemonType, defender_types: &[PokemonType]) -> f64 {
    defender_types
        .iter()
        .map(|defending| single_type_effectiveness(move_type, *defending))
        .product()
}
