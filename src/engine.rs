//! Turn engine: the phase-tagged state machine that owns a battle.
//!
//! All mutation of rosters, HP and the log goes through [`BattleEngine`].
//! Presenters read [`BattleSnapshot`]s and feed back [`PlayerInput`]s; an
//! input that is illegal in the current phase is ignored without touching
//! state.
//!
//! Turn resolution is split into [`BattleEngine::step`] calls so the caller
//! can pause between an attack, the next attack and the faint bookkeeping.

use crate::ai::{BattleAI, RandomAI};
use crate::battle_logger::{BattleLogger, LogEntry};
use crate::damage;
use crate::model::{Combatant, Roster};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Intro,
    PlayerAction,
    MoveSelection,
    TurnProcessing,
    ForcedSwitch,
    GameOver,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player,
    Opponent,
    /// Battle never started because a roster could not be built.
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayerInput {
    Fight,
    /// Not implemented in battle; accepted and ignored.
    Run,
    Back,
    ChooseMove(usize),
    ChooseSwitch(usize),
}

#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    Accepted,
    Ignored,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TurnStep {
    SwitchIn { to: usize },
    Attack { side: Side, move_index: usize },
    Settle,
}

#[derive(Clone, Debug)]
pub struct BattleState {
    pub player: Roster,
    pub opponent: Roster,
    pub phase: Phase,
    pub logger: BattleLogger,
    pub winner: Option<Winner>,
}

impl BattleState {
    fn loading() -> Self {
        Self {
            player: Roster::default(),
            opponent: Roster::default(),
            phase: Phase::Loading,
            logger: BattleLogger::new(),
            winner: None,
        }
    }

    pub fn roster(&self, side: Side) -> &Roster {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    #[cfg(test)]
    fn roster_mut(&mut self, side: Side) -> &mut Roster {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    pub fn active(&self, side: Side) -> Option<&Combatant> {
        self.roster(side).active()
    }
}

/// Read-only copy of the battle handed to presenters after every transition.
#[derive(Clone, Debug, Serialize)]
pub struct BattleSnapshot {
    pub player: Roster,
    pub opponent: Roster,
    pub player_active: usize,
    pub opponent_active: usize,
    pub phase: Phase,
    pub log: Vec<LogEntry>,
    pub revealed: usize,
    pub winner: Option<Winner>,
}

pub struct BattleEngine<R = SmallRng> {
    state: BattleState,
    queue: VecDeque<TurnStep>,
    rng: R,
    ai: Box<dyn BattleAI>,
}

impl BattleEngine<SmallRng> {
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BattleEngine<R> {
    /// A fresh engine in [`Phase::Loading`].
    pub fn new(rng: R) -> Self {
        Self {
            state: BattleState::loading(),
            queue: VecDeque::new(),
            rng,
            ai: Box::new(RandomAI),
        }
    }

    pub fn with_ai(mut self, ai: impl BattleAI + 'static) -> Self {
        self.ai = Box::new(ai);
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn winner(&self) -> Option<Winner> {
        self.state.winner
    }

    pub fn log(&self) -> &[LogEntry] {
        self.state.logger.log_lines()
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            player: self.state.player.clone(),
            opponent: self.state.opponent.clone(),
            player_active: self.state.player.active_index(),
            opponent_active: self.state.opponent.active_index(),
            phase: self.state.phase,
            log: self.state.logger.log_lines().to_vec(),
            revealed: self.state.logger.revealed(),
            winner: self.state.winner,
        }
    }

    /// Loading → intro with both rosters in place.
    pub fn begin(&mut self, player: Roster, opponent: Roster) -> Transition {
        if self.state.phase != Phase::Loading {
            debug!(phase = ?self.state.phase, "begin ignored outside loading");
            return Transition::Ignored;
        }
        if player.is_empty() || opponent.is_empty() {
            debug!("begin ignored: empty roster");
            return Transition::Ignored;
        }
        self.state.player = player;
        self.state.opponent = opponent;
        let opponent_name = active_name(&self.state.opponent);
        let player_name = active_name(&self.state.player);
        self.state.logger.log_intro(&opponent_name, &player_name);
        self.set_phase(Phase::Intro);
        self.check_invariants();
        Transition::Accepted
    }

    /// Loading → game over without a winner.
    pub fn fail_initialization(&mut self) -> Transition {
        if self.state.phase != Phase::Loading {
            return Transition::Ignored;
        }
        self.state.logger.log_init_failure();
        self.state.winner = Some(Winner::Error);
        self.set_phase(Phase::GameOver);
        Transition::Accepted
    }

    /// Next log entry the presenter has not consumed yet.
    pub fn next_entry(&self) -> Option<&LogEntry> {
        self.state.logger.next_pending()
    }

    /// Marks the next pending entry as consumed. The intro ends once its last
    /// entry is consumed.
    pub fn acknowledge_entry(&mut self) -> bool {
        if !self.state.logger.mark_revealed() {
            return false;
        }
        if self.state.phase == Phase::Intro && self.state.logger.is_drained() {
            self.enter_player_action();
        }
        true
    }

    /// Consumes every pending entry, including any appended while draining.
    pub fn drain_log(&mut self) -> Vec<LogEntry> {
        let mut drained = Vec::new();
        while let Some(entry) = self.next_entry().cloned() {
            self.acknowledge_entry();
            drained.push(entry);
        }
        drained
    }

    /// Inputs accepted in the current phase.
    pub fn legal_inputs(&self) -> Vec<PlayerInput> {
        match self.state.phase {
            Phase::PlayerAction => {
                let mut inputs = vec![PlayerInput::Fight, PlayerInput::Run];
                inputs.extend(
                    self.state
                        .player
                        .switch_candidates()
                        .into_iter()
                        .map(PlayerInput::ChooseSwitch),
                );
                inputs
            }
            Phase::MoveSelection => {
                let move_count = self
                    .state
                    .player
                    .active()
                    .map_or(0, |active| active.moves.len());
                let mut inputs: Vec<PlayerInput> =
                    (0..move_count).map(PlayerInput::ChooseMove).collect();
                inputs.push(PlayerInput::Back);
                inputs
            }
            Phase::ForcedSwitch => self
                .state
                .player
                .switch_candidates()
                .into_iter()
                .map(PlayerInput::ChooseSwitch)
                .collect(),
            Phase::Loading | Phase::Intro | Phase::TurnProcessing | Phase::GameOver => Vec::new(),
        }
    }

    pub fn apply(&mut self, input: PlayerInput) -> Transition {
        let transition = match (self.state.phase, input) {
            (Phase::PlayerAction, PlayerInput::Fight) => {
                self.set_phase(Phase::MoveSelection);
                Transition::Accepted
            }
            (Phase::PlayerAction, PlayerInput::Run) => {
                debug!("run is not available in battle");
                Transition::Accepted
            }
            (Phase::PlayerAction, PlayerInput::ChooseSwitch(to)) => self.commit_switch(to),
            (Phase::MoveSelection, PlayerInput::Back) => {
                self.set_phase(Phase::PlayerAction);
                Transition::Accepted
            }
            (Phase::MoveSelection, PlayerInput::ChooseMove(index)) => self.commit_move(index),
            (Phase::ForcedSwitch, PlayerInput::ChooseSwitch(to)) => self.forced_switch(to),
            (phase, input) => {
                debug!(?phase, ?input, "ignoring input illegal in this phase");
                Transition::Ignored
            }
        };
        self.check_invariants();
        transition
    }

    /// Runs the next queued turn step. Returns false when no turn is in progress.
    pub fn step(&mut self) -> bool {
        if self.state.phase != Phase::TurnProcessing {
            return false;
        }
        let Some(step) = self.queue.pop_front() else {
            // A turn always ends in Settle, which leaves TurnProcessing.
            debug_assert!(false, "turn processing with an empty step queue");
            self.enter_player_action();
            return false;
        };
        match step {
            TurnStep::SwitchIn { to } => self.switch_in(to),
            TurnStep::Attack { side, move_index } => self.attack(side, move_index),
            TurnStep::Settle => self.settle(),
        }
        self.check_invariants();
        true
    }

    /// Runs steps until the current turn is fully resolved.
    pub fn resolve_turn(&mut self) {
        while self.step() {}
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            debug!(from = ?self.state.phase, to = ?phase, "phase transition");
        }
        self.state.phase = phase;
    }

    fn enter_player_action(&mut self) {
        let name = active_name(&self.state.player);
        self.state.logger.log_prompt(&name);
        self.set_phase(Phase::PlayerAction);
    }

    fn commit_move(&mut self, index: usize) -> Transition {
        let Some(player) = self.state.player.active() else {
            return Transition::Ignored;
        };
        if index >= player.moves.len() {
            debug!(index, "ignoring out-of-range move");
            return Transition::Ignored;
        }
        let Some(opponent_move) = self.opponent_move() else {
            return Transition::Ignored;
        };
        let player = TurnStep::Attack {
            side: Side::Player,
            move_index: index,
        };
        let opponent = TurnStep::Attack {
            side: Side::Opponent,
            move_index: opponent_move,
        };
        if self.player_moves_first() {
            self.queue.extend([player, opponent, TurnStep::Settle]);
        } else {
            self.queue.extend([opponent, player, TurnStep::Settle]);
        }
        self.set_phase(Phase::TurnProcessing);
        Transition::Accepted
    }

    fn commit_switch(&mut self, to: usize) -> Transition {
        if !self.state.player.switch_candidates().contains(&to) {
            debug!(to, "ignoring switch to unavailable member");
            return Transition::Ignored;
        }
        let Some(opponent_move) = self.opponent_move() else {
            return Transition::Ignored;
        };
        // Switching costs the turn: the opponent gets a free hit on the new member.
        self.queue.extend([
            TurnStep::SwitchIn { to },
            TurnStep::Attack {
                side: Side::Opponent,
                move_index: opponent_move,
            },
            TurnStep::Settle,
        ]);
        self.set_phase(Phase::TurnProcessing);
        Transition::Accepted
    }

    fn forced_switch(&mut self, to: usize) -> Transition {
        if !self.state.player.switch_candidates().contains(&to) || !self.state.player.set_active(to) {
            debug!(to, "ignoring forced switch to unavailable member");
            return Transition::Ignored;
        }
        let name = active_name(&self.state.player);
        self.state.logger.log_send_out(&name);
        self.enter_player_action();
        Transition::Accepted
    }

    fn opponent_move(&mut self) -> Option<usize> {
        let active = self.state.opponent.active()?;
        let choice = self.ai.choose_move(active, &mut self.rng);
        if choice.is_none() {
            debug!(name = %active.name, "opponent has no usable move");
        }
        choice
    }

    /// Faster combatant acts first; a speed tie is a fair coin flip.
    fn player_moves_first(&mut self) -> bool {
        let player_speed = self.state.player.active().map_or(0, |c| c.stats.spe);
        let opponent_speed = self.state.opponent.active().map_or(0, |c| c.stats.spe);
        let player_first = if player_speed == opponent_speed {
            self.rng.gen_bool(0.5)
        } else {
            player_speed > opponent_speed
        };
        debug!(player_speed, opponent_speed, player_first, "turn order");
        player_first
    }

    fn switch_in(&mut self, to: usize) {
        let outgoing = active_name(&self.state.player);
        if !self.state.player.set_active(to) {
            debug_assert!(false, "queued switch to unavailable member {to}");
            return;
        }
        self.state.logger.log_recall(&outgoing);
        let incoming = active_name(&self.state.player);
        self.state.logger.log_send_out(&incoming);
    }

    fn attack(&mut self, side: Side, move_index: usize) {
        let state = &mut self.state;
        let (attacking, defending) = match side {
            Side::Player => (&state.player, &mut state.opponent),
            Side::Opponent => (&state.opponent, &mut state.player),
        };
        let (Some(attacker), Some(defender)) = (attacking.active(), defending.active_mut()) else {
            return;
        };
        if attacker.is_fainted || defender.is_fainted {
            debug!(?side, "attack skipped: a participant has fainted");
            return;
        }
        let Some(move_def) = attacker.moves.get(move_index) else {
            debug_assert!(false, "queued move index {move_index} out of range");
            return;
        };
        let outcome = damage::calculate(attacker, defender, move_def, &mut self.rng);
        let fainted = defender.take_damage(outcome.damage);
        debug!(
            attacker = %attacker.name,
            defender = %defender.name,
            move_name = %move_def.name,
            damage = outcome.damage,
            effectiveness = outcome.effectiveness,
            remaining = defender.current_hp,
            "attack resolved"
        );

        let attacker_name = attacker.display_name();
        let defender_name = defender.display_name();
        let move_name = move_def.name.clone();
        state.logger.log_move(&attacker_name, &move_name);
        state.logger.log_effectiveness(outcome.effectiveness);
        if fainted {
            state.logger.log_faint(&defender_name);
        }
    }

    fn settle(&mut self) {
        self.queue.clear();
        let opponent_down = self.state.opponent.active().map_or(true, |c| c.is_fainted);
        if opponent_down {
            match self.state.opponent.next_available() {
                Some(next) => {
                    self.state.opponent.set_active(next);
                    let name = active_name(&self.state.opponent);
                    self.state.logger.log_opponent_send_out(&name);
                }
                None => {
                    self.finish(Winner::Player);
                    return;
                }
            }
        }
        let player_down = self.state.player.active().map_or(true, |c| c.is_fainted);
        if player_down {
            if self.state.player.has_available() {
                self.state.logger.log_forced_switch();
                self.set_phase(Phase::ForcedSwitch);
            } else {
                self.finish(Winner::Opponent);
            }
            return;
        }
        self.enter_player_action();
    }

    fn finish(&mut self, winner: Winner) {
        match winner {
            Winner::Player => {
                let wild = (self.state.opponent.len() == 1)
                    .then(|| active_name(&self.state.opponent));
                self.state.logger.log_win(wild.as_deref());
            }
            Winner::Opponent => self.state.logger.log_loss(),
            Winner::Error => self.state.logger.log_init_failure(),
        }
        info!(?winner, "battle over");
        self.state.winner = Some(winner);
        self.set_phase(Phase::GameOver);
    }

    fn check_invariants(&self) {
        for side in [Side::Player, Side::Opponent] {
            let roster = self.state.roster(side);
            if roster.is_empty() {
                continue;
            }
            debug_assert!(roster.active_index() < roster.len(), "{side:?} active index out of range");
            for member in roster.members() {
                debug_assert!(member.current_hp <= member.max_hp, "{} above max hp", member.name);
                debug_assert_eq!(
                    member.is_fainted,
                    member.current_hp == 0,
                    "{} faint flag out of sync",
                    member.name
                );
                debug_assert!(!member.moves.is_empty(), "{} has no moves", member.name);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn roster_mut(&mut self, side: Side) -> &mut Roster {
        self.state.roster_mut(side)
    }
}

fn active_name(roster: &Roster) -> String {
    roster
        .active()
        .map(Combatant::display_name)
        .unwrap_or_default()
}
