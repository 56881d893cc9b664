use crate::model::{Combatant, MoveCategory, MoveDescriptor};
use crate::types::type_effectiveness;
use rand::Rng;

pub const VARIANCE_MIN: f64 = 0.85;
pub const VARIANCE_MAX: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    pub damage: u32,
    pub effectiveness: f64,
}

impl DamageOutcome {
    const NO_DAMAGE: DamageOutcome = DamageOutcome {
        damage: 0,
        effectiveness: 1.0,
    };
}

/// Rolls the variance factor from `rng` and applies [`calculate_with_variance`].
pub fn calculate<R: Rng + ?Sized>(
    attacker: &Combatant,
    defender: &Combatant,
    move_def: &MoveDescriptor,
    rng: &mut R,
) -> DamageOutcome {
    if !move_def.is_damaging() {
        return DamageOutcome::NO_DAMAGE;
    }
    let variance = rng.gen_range(VARIANCE_MIN..=VARIANCE_MAX);
    calculate_with_variance(attacker, defender, move_def, variance)
}

/// Damage with a fixed variance factor in `[0.85, 1.0]`.
///
/// Status moves (no power) deal nothing and report neutral effectiveness. Any
/// hit that is not fully resisted does at least 1 damage; an immune defender takes 0.
pub fn calculate_with_variance(
    attacker: &Combatant,
    defender: &Combatant,
    move_def: &MoveDescriptor,
    variance: f64,
) -> DamageOutcome {
    let power = match move_def.power {
        Some(power) if power > 0 => power as f64,
        _ => return DamageOutcome::NO_DAMAGE,
    };
    let (attack, defense) = match move_def.category {
        MoveCategory::Special => (attacker.stats.spa, defender.stats.spd),
        MoveCategory::Physical | MoveCategory::Status => (attacker.stats.atk, defender.stats.def),
    };
    let effectiveness = type_effectiveness(move_def.move_type, &defender.types);

    let level = attacker.level as f64;
    let attack = attack as f64;
    let defense = defense.max(1) as f64;
    let base = ((2.0 * level / 5.0 + 2.0) * power * attack / defense) / 50.0 + 2.0;
    let raw = (base * effectiveness * variance).floor();

    let damage = if effectiveness > 0.0 {
        raw.max(1.0) as u32
    } else {
        0
    };
    DamageOutcome {
        damage,
        effectiveness,
    }
}

/// Every damage value the variance roll can produce, from lowest to highest percent.
pub fn damage_range(
    attacker: &Combatant,
    defender: &Combatant,
    move_def: &MoveDescriptor,
) -> Vec<u32> {
    (85..=100)
        .map(|percent| {
            calculate_with_variance(attacker, defender, move_def, percent as f64 / 100.0).damage
        })
        .collect()
}
