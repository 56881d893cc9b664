//! Append-only battle narration.
//!
//! The engine only decides ordering and content. Each entry says whether the
//! presentation layer should reveal it character by character (`typewriter`)
//! or show it at once; timing is entirely up to the presenter.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub typewriter: bool,
}

#[derive(Clone, Debug, Default)]
pub struct BattleLogger {
    log: Vec<LogEntry>,
    revealed: usize,
}

impl BattleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, typewriter: bool) {
        self.log.push(LogEntry {
            message: message.into(),
            typewriter,
        });
    }

    pub fn log_intro(&mut self, opponent: &str, player: &str) {
        self.push(format!("A wild {opponent} appeared!"), false);
        self.log_send_out(player);
    }

    pub fn log_prompt(&mut self, player: &str) {
        self.push(format!("What will {player} do?"), true);
    }

    pub fn log_move(&mut self, user: &str, move_name: &str) {
        self.push(format!("{user} used {}!", move_label(move_name)), true);
    }

    pub fn log_effectiveness(&mut self, effectiveness: f64) {
        if effectiveness > 1.0 {
            self.push("It's super effective!", true);
        } else if effectiveness == 0.0 {
            self.push("It had no effect!", true);
        } else if effectiveness < 1.0 {
            self.push("It's not very effective...", true);
        }
    }

    pub fn log_faint(&mut self, name: &str) {
        self.push(format!("{name} fainted!"), true);
    }

    pub fn log_recall(&mut self, name: &str) {
        self.push(format!("Come back, {name}!"), true);
    }

    pub fn log_send_out(&mut self, name: &str) {
        self.push(format!("Go, {name}!"), true);
    }

    pub fn log_opponent_send_out(&mut self, name: &str) {
        self.push(format!("The opponent sent out {name}!"), true);
    }

    pub fn log_forced_switch(&mut self) {
        self.push("Choose your next Pokémon!", false);
    }

    pub fn log_win(&mut self, wild_opponent: Option<&str>) {
        match wild_opponent {
            Some(name) => self.push(format!("You defeated the wild {name}!"), false),
            None => self.push("You defeated the opposing team!", false),
        }
    }

    pub fn log_loss(&mut self) {
        self.push("You have no more Pokémon that can fight!", false);
        self.push("You blacked out...", false);
    }

    pub fn log_init_failure(&mut self) {
        self.push("Failed to initialize battle. Please try again.", false);
    }

    pub fn log_lines(&self) -> &[LogEntry] {
        &self.log
    }

    /// Number of entries the presenter has already consumed.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn next_pending(&self) -> Option<&LogEntry> {
        self.log.get(self.revealed)
    }

    pub fn pending(&self) -> &[LogEntry] {
        &self.log[self.revealed..]
    }

    /// Marks the next pending entry as consumed. Returns false if nothing was pending.
    pub fn mark_revealed(&mut self) -> bool {
        if self.revealed < self.log.len() {
            self.revealed += 1;
            true
        } else {
            false
        }
    }

    pub fn is_drained(&self) -> bool {
        self.revealed == self.log.len()
    }
}

/// Catalog move names are hyphenated (`thunder-shock`); narration uses spaces.
pub fn move_label(name: &str) -> String {
    name.replace('-', " ")
}
