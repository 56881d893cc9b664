//! Battle configuration: defaults, an optional JSON file, then environment overrides.
use crate::model::MAX_ROSTER_SIZE;
use crate::stats::{BATTLE_LEVEL, MAX_LEVEL};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Combatants per side.
    pub team_size: usize,
    pub level: u32,
    /// Listing limit passed to the catalog.
    pub catalog_limit: usize,
    /// Listing entries with a higher numeric id are alternate forms and never drawn.
    pub primary_form_max_id: u32,
    /// How many invalid candidates a roster build may discard before giving up.
    pub max_replacements: usize,
    /// Pause after an instantly shown log entry.
    pub log_delay_ms: u64,
    /// Per-character delay for typewriter entries.
    pub typewriter_char_ms: u64,
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            team_size: 1,
            level: BATTLE_LEVEL,
            catalog_limit: 1025,
            primary_form_max_id: 10000,
            max_replacements: 32,
            log_delay_ms: 1500,
            typewriter_char_ms: 40,
            seed: None,
        }
    }
}

impl BattleConfig {
    /// Reads a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Environment variables:
    /// - `BATTLE_TEAM_SIZE` - Combatants per side (default: 1)
    /// - `BATTLE_LEVEL` - Battle level (default: 50)
    /// - `BATTLE_SEED` - Fixed RNG seed (default: entropy)
    /// - `BATTLE_LOG_DELAY_MS` - Pause after instant log entries (default: 1500)
    /// - `BATTLE_MAX_REPLACEMENTS` - Discarded candidates allowed per roster (default: 32)
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(size) = read_env::<usize>("BATTLE_TEAM_SIZE") {
            self.team_size = size;
        }
        if let Some(level) = read_env::<u32>("BATTLE_LEVEL") {
            self.level = level;
        }
        if let Some(seed) = read_env::<u64>("BATTLE_SEED") {
            self.seed = Some(seed);
        }
        if let Some(delay) = read_env::<u64>("BATTLE_LOG_DELAY_MS") {
            self.log_delay_ms = delay;
        }
        if let Some(max) = read_env::<usize>("BATTLE_MAX_REPLACEMENTS") {
            self.max_replacements = max;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ROSTER_SIZE).contains(&self.team_size) {
            bail!(
                "team size must be between 1 and {MAX_ROSTER_SIZE}, got {}",
                self.team_size
            );
        }
        if !(1..=MAX_LEVEL).contains(&self.level) {
            bail!("level must be between 1 and {MAX_LEVEL}, got {}", self.level);
        }
        Ok(())
    }

    pub fn log_delay(&self) -> Duration {
        Duration::from_millis(self.log_delay_ms)
    }

    pub fn typewriter_delay(&self) -> Duration {
        Duration::from_millis(self.typewriter_char_ms)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BattleConfig::default();
        assert_eq!(config.team_size, 1);
        assert_eq!(config.level, 50);
        assert_eq!(config.log_delay(), Duration::from_millis(1500));
        assert_eq!(config.typewriter_delay(), Duration::from_millis(40));
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BattleConfig =
            serde_json::from_str(r#"{"team_size": 3, "seed": 7}"#).unwrap();
        assert_eq!(config.team_size, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.catalog_limit, 1025);
        assert_eq!(config.max_replacements, 32);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = BattleConfig {
            team_size: 7,
            ..BattleConfig::default()
        };
        assert!(config.validate().is_err());
        config.team_size = 0;
        assert!(config.validate().is_err());
        config.team_size = 6;
        config.level = 0;
        assert!(config.validate().is_err());
        config.level = 101;
        assert!(config.validate().is_err());
        config.level = 20_000_000;
        assert!(config.validate().is_err());
        config.level = MAX_LEVEL;
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = BattleConfig::from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.json"));
    }
}
