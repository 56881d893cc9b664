use crate::model::Combatant;
use rand::seq::IteratorRandom;
use rand::RngCore;

/// Picks the opponent's move each turn.
pub trait BattleAI: Send {
    /// Index into `active.moves`, or `None` if the combatant has nothing usable.
    fn choose_move(&mut self, active: &Combatant, rng: &mut dyn RngCore) -> Option<usize>;
}

/// Uniform choice among usable moves. No look-ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAI;

impl BattleAI for RandomAI {
    fn choose_move(&mut self, active: &Combatant, rng: &mut dyn RngCore) -> Option<usize> {
        active
            .moves
            .iter()
            .enumerate()
            .filter(|(_, mv)| mv.is_damaging())
            .map(|(idx, _)| idx)
            .choose(rng)
    }
}
