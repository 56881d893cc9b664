//! Async driver for one battle.
//!
//! The session builds both rosters, then walks the engine forward: every
//! pending log entry is handed to the [`Presenter`] and awaited before the
//! next one, turn steps run one at a time, and player choices come from a
//! [`PlayerController`]. Each await also watches the abandon signal, so
//! leaving a battle stops the current reveal immediately.

use crate::battle_logger::LogEntry;
use crate::catalog::CatalogSource;
use crate::config::BattleConfig;
use crate::engine::{BattleEngine, BattleSnapshot, Phase, PlayerInput, Transition, Winner};
use crate::error::RosterError;
use crate::model::Roster;
use crate::roster::RosterGenerator;
use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Presenter: Send {
    /// Loading message while rosters are built.
    fn progress(&mut self, message: &str);

    /// Shows one log entry. The session waits for this before revealing the next.
    async fn present(&mut self, entry: &LogEntry);

    fn snapshot(&mut self, _snapshot: &BattleSnapshot) {}
}

#[async_trait]
pub trait PlayerController: Send {
    /// Picks one of `legal`. Returning `None` abandons the battle.
    async fn choose(
        &mut self,
        snapshot: &BattleSnapshot,
        legal: &[PlayerInput],
    ) -> Option<PlayerInput>;
}

/// Plays the player side at random. Never picks run or back.
pub struct RandomController<R = SmallRng> {
    rng: R,
}

impl<R: Rng + Send> RandomController<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl<R: Rng + Send> PlayerController for RandomController<R> {
    async fn choose(
        &mut self,
        _snapshot: &BattleSnapshot,
        legal: &[PlayerInput],
    ) -> Option<PlayerInput> {
        let useful: Vec<PlayerInput> = legal
            .iter()
            .copied()
            .filter(|input| !matches!(input, PlayerInput::Run | PlayerInput::Back))
            .collect();
        useful.choose(&mut self.rng).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished(Winner),
    Abandoned,
}

pub struct BattleSession<R = SmallRng> {
    engine: BattleEngine<R>,
}

impl<R: Rng + Send> BattleSession<R> {
    /// Builds the player's roster, then the opponent's. Any roster failure
    /// leaves the engine in game over with [`Winner::Error`].
    pub async fn initialize<C, P>(
        catalog: &C,
        config: &BattleConfig,
        mut rng: R,
        presenter: &mut P,
    ) -> Self
    where
        C: CatalogSource + ?Sized,
        P: Presenter + ?Sized,
    {
        let generator = RosterGenerator::new(catalog, config);
        let rosters = build_rosters(&generator, config.team_size, &mut rng, presenter).await;
        let mut engine = BattleEngine::new(rng);
        match rosters {
            Ok((player, opponent)) => {
                let _ = engine.begin(player, opponent);
            }
            Err(err) => {
                warn!(error = %err, "battle initialization failed");
                let _ = engine.fail_initialization();
            }
        }
        presenter.snapshot(&engine.snapshot());
        Self { engine }
    }

    /// Wraps an engine that is already past loading.
    pub fn from_engine(engine: BattleEngine<R>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &BattleEngine<R> {
        &self.engine
    }

    /// Drives the battle to game over, or until the controller or the abandon
    /// signal gives up.
    pub async fn run<P, C>(
        &mut self,
        presenter: &mut P,
        controller: &mut C,
        mut abandon: watch::Receiver<bool>,
    ) -> SessionOutcome
    where
        P: Presenter + ?Sized,
        C: PlayerController + ?Sized,
    {
        loop {
            while let Some(entry) = self.engine.next_entry().cloned() {
                tokio::select! {
                    _ = presenter.present(&entry) => {}
                    _ = abandoned(&mut abandon) => return self.abandon(),
                }
                self.engine.acknowledge_entry();
                presenter.snapshot(&self.engine.snapshot());
            }

            match self.engine.phase() {
                Phase::GameOver => {
                    let winner = self.engine.winner().unwrap_or(Winner::Error);
                    info!(?winner, "session finished");
                    return SessionOutcome::Finished(winner);
                }
                Phase::Loading => {
                    let _ = self.engine.fail_initialization();
                }
                Phase::TurnProcessing => {
                    self.engine.step();
                }
                Phase::Intro | Phase::PlayerAction | Phase::MoveSelection | Phase::ForcedSwitch => {
                    let snapshot = self.engine.snapshot();
                    let legal = self.engine.legal_inputs();
                    let choice = tokio::select! {
                        choice = controller.choose(&snapshot, &legal) => choice,
                        _ = abandoned(&mut abandon) => None,
                    };
                    let Some(input) = choice else {
                        return self.abandon();
                    };
                    if self.engine.apply(input) == Transition::Ignored {
                        debug!(?input, "controller chose an input the engine ignored");
                    }
                }
            }
            presenter.snapshot(&self.engine.snapshot());
        }
    }

    fn abandon(&self) -> SessionOutcome {
        info!(phase = ?self.engine.phase(), "battle abandoned");
        SessionOutcome::Abandoned
    }
}

async fn build_rosters<C, P, R>(
    generator: &RosterGenerator<'_, C>,
    size: usize,
    rng: &mut R,
    presenter: &mut P,
) -> Result<(Roster, Roster), RosterError>
where
    C: CatalogSource + ?Sized,
    P: Presenter + ?Sized,
    R: Rng + Send,
{
    let mut player_progress = |message: &str| presenter.progress(&format!("Player Team: {message}"));
    let player = generator.generate(size, rng, &mut player_progress).await?;
    let mut opponent_progress =
        |message: &str| presenter.progress(&format!("Opponent Team: {message}"));
    let opponent = generator.generate(size, rng, &mut opponent_progress).await?;
    Ok((player, opponent))
}

/// Resolves once the abandon flag is raised. A dropped sender never abandons.
async fn abandoned(signal: &mut watch::Receiver<bool>) {
    let closed = signal.wait_for(|abandon| *abandon).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
