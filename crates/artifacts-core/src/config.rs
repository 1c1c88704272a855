//! Configuration loading and typed config structures for the engine.
//!
//! The configuration lives in `artifacts.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure, and provides a
//! loader that reads and validates the file. Connection settings for the
//! live API (token, endpoint, retry budget) come from the environment; see
//! [`artifacts_client::ClientConfig`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use artifacts_client::{FightPolicy, SimulatedConfig};
use serde::Deserialize;

use crate::roles::RoleKind;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `artifacts.yaml`. Every section except the
/// character roster has defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Which backend actions go to.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Characters to drive and the role each one plays.
    #[serde(default)]
    pub characters: Vec<CharacterConfig>,

    /// Tuning for task loops and roles.
    #[serde(default)]
    pub tasks: TaskSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the catalog comes from.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the roster (at least one character, no duplicate names) and
    /// the task limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tasks.validate()?;
        if self.characters.is_empty() {
            return Err(ConfigError::Invalid("no characters configured".to_owned()));
        }
        let mut seen = BTreeSet::new();
        for character in &self.characters {
            if character.name.trim().is_empty() {
                return Err(ConfigError::Invalid("character with empty name".to_owned()));
            }
            if !seen.insert(character.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "character {} listed twice",
                    character.name
                )));
            }
        }
        Ok(())
    }

    /// Number of characters configured as harvesters.
    pub fn harvester_count(&self) -> u32 {
        let count = self
            .characters
            .iter()
            .filter(|c| c.role == RoleKind::Harvester)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The live game API.
    #[default]
    Http,
    /// The in-memory simulated server (dry run).
    Simulated,
}

/// Backend selection and simulated-world settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// Which backend to use.
    #[serde(default)]
    pub kind: BackendKind,

    /// Cooldown the simulated server applies after each action.
    #[serde(default = "default_simulated_cooldown_ms")]
    pub simulated_cooldown_ms: u64,

    /// Seed for simulated drops and task picks.
    #[serde(default = "default_simulated_seed")]
    pub simulated_seed: u64,

    /// How the simulated server decides fights.
    #[serde(default)]
    pub fight_policy: FightPolicy,
}

impl BackendConfig {
    /// Settings for the simulated server.
    pub const fn simulated(&self) -> SimulatedConfig {
        SimulatedConfig {
            cooldown: Duration::from_millis(self.simulated_cooldown_ms),
            fight_policy: self.fight_policy,
            seed: self.simulated_seed,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            simulated_cooldown_ms: default_simulated_cooldown_ms(),
            simulated_seed: default_simulated_seed(),
            fight_policy: FightPolicy::default(),
        }
    }
}

/// One character on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterConfig {
    /// Character name on the account.
    pub name: String,
    /// Role the character plays.
    pub role: RoleKind,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Tuning for task loops and role schedulers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskSettings {
    /// Losses in a row after which collecting by fighting gives up.
    #[serde(default = "default_consecutive_loss_limit")]
    pub consecutive_loss_limit: u32,

    /// How many times a locked or cooling-down action is re-sent.
    #[serde(default = "default_transient_retries")]
    pub transient_retries: u32,

    /// Wait before re-sending a locked action, doubled on each attempt.
    #[serde(default = "default_transient_backoff_ms")]
    pub transient_backoff_ms: u64,

    /// Pause after a role goal fails.
    #[serde(default = "default_role_backoff_ms")]
    pub role_backoff_ms: u64,

    /// Gathering and crafting skills are not trained past this level.
    #[serde(default = "default_training_max_level")]
    pub training_max_level: u32,

    /// Training targets are at most this many levels below the skill.
    #[serde(default = "default_training_level_window")]
    pub training_level_window: u32,

    /// Levels gained per training goal.
    #[serde(default = "default_training_step")]
    pub training_step: u32,

    /// Combat level spacing of gear milestones.
    #[serde(default = "default_milestone_step")]
    pub milestone_step: u32,

    /// Items made per crafting-training goal.
    #[serde(default = "default_craft_batch")]
    pub craft_batch: u32,

    /// Fights per fighter goal when tasks are unwinnable.
    #[serde(default = "default_fighter_batch")]
    pub fighter_batch: u32,

    /// Task coins kept back when exchanging for rewards.
    #[serde(default = "default_coins_reserve")]
    pub coins_reserve: u32,
}

impl TaskSettings {
    /// Base wait before re-sending a locked action.
    pub const fn transient_backoff(&self) -> Duration {
        Duration::from_millis(self.transient_backoff_ms)
    }

    /// Pause after a failed role goal.
    pub const fn role_backoff(&self) -> Duration {
        Duration::from_millis(self.role_backoff_ms)
    }

    /// Reject limits that would make every loop give up before acting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("consecutive_loss_limit", self.consecutive_loss_limit),
            ("craft_batch", self.craft_batch),
            ("fighter_batch", self.fighter_batch),
            ("milestone_step", self.milestone_step),
            ("training_step", self.training_step),
        ];
        match limits.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Invalid(format!(
                "tasks.{name} must be at least 1"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            consecutive_loss_limit: default_consecutive_loss_limit(),
            transient_retries: default_transient_retries(),
            transient_backoff_ms: default_transient_backoff_ms(),
            role_backoff_ms: default_role_backoff_ms(),
            training_max_level: default_training_max_level(),
            training_level_window: default_training_level_window(),
            training_step: default_training_step(),
            milestone_step: default_milestone_step(),
            craft_batch: default_craft_batch(),
            fighter_batch: default_fighter_batch(),
            coins_reserve: default_coins_reserve(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging and catalog
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// JSON snapshot to load instead of fetching from the API.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,

    /// Fetch from the API even when the snapshot exists, and rewrite it.
    #[serde(default)]
    pub refresh: bool,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_simulated_cooldown_ms() -> u64 {
    0
}

const fn default_simulated_seed() -> u64 {
    42
}

const fn default_consecutive_loss_limit() -> u32 {
    3
}

const fn default_transient_retries() -> u32 {
    5
}

const fn default_transient_backoff_ms() -> u64 {
    1_000
}

const fn default_role_backoff_ms() -> u64 {
    5_000
}

const fn default_training_max_level() -> u32 {
    35
}

const fn default_training_level_window() -> u32 {
    10
}

const fn default_training_step() -> u32 {
    5
}

const fn default_milestone_step() -> u32 {
    5
}

const fn default_craft_batch() -> u32 {
    5
}

const fn default_fighter_batch() -> u32 {
    10
}

const fn default_coins_reserve() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let tasks = TaskSettings::default();
        assert_eq!(tasks.consecutive_loss_limit, 3);
        assert_eq!(tasks.training_max_level, 35);
        assert_eq!(tasks.coins_reserve, 5);
        assert_eq!(LoggingConfig::default().level, "info");
        assert_eq!(BackendConfig::default().kind, BackendKind::Http);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
backend:
  kind: simulated
  simulated_cooldown_ms: 10
  simulated_seed: 7
  fight_policy: always_win

characters:
  - name: alice
    role: fighter
  - name: bob
    role: harvester
  - name: carol
    role: harvester
  - name: dave
    role: crafter

tasks:
  consecutive_loss_limit: 2
  craft_batch: 3

logging:
  level: debug
  json: true

catalog:
  snapshot: catalog.json
  refresh: true
";
        let config = EngineConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.backend.kind, BackendKind::Simulated);
        assert_eq!(config.backend.fight_policy, FightPolicy::AlwaysWin);
        assert_eq!(
            config.backend.simulated().cooldown,
            Duration::from_millis(10)
        );
        assert_eq!(config.characters.len(), 4);
        assert_eq!(config.harvester_count(), 2);
        assert_eq!(config.tasks.consecutive_loss_limit, 2);
        assert_eq!(config.tasks.craft_batch, 3);
        assert_eq!(config.tasks.fighter_batch, 10);
        assert!(config.logging.json);
        assert_eq!(config.catalog.snapshot, Some(PathBuf::from("catalog.json")));
        assert!(config.catalog.refresh);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let result = EngineConfig::parse("logging:\n  level: warn\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let yaml = "
characters:
  - name: alice
    role: fighter
  - name: alice
    role: crafter
";
        let result = EngineConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    fn parse_with_tasks(tasks: &str) -> Result<EngineConfig, ConfigError> {
        EngineConfig::parse(&format!(
            "characters:\n  - name: alice\n    role: fighter\ntasks:\n  {tasks}\n"
        ))
    }

    fn rejected_field(tasks: &str) -> Option<String> {
        match parse_with_tasks(tasks) {
            Err(ConfigError::Invalid(message)) => Some(message),
            _ => None,
        }
    }

    #[test]
    fn zero_loss_limit_is_rejected() {
        let message = rejected_field("consecutive_loss_limit: 0");
        assert!(message.is_some_and(|m| m.contains("consecutive_loss_limit")));
    }

    #[test]
    fn zero_craft_batch_is_rejected() {
        let message = rejected_field("craft_batch: 0");
        assert!(message.is_some_and(|m| m.contains("craft_batch")));
    }

    #[test]
    fn zero_fighter_batch_is_rejected() {
        let message = rejected_field("fighter_batch: 0");
        assert!(message.is_some_and(|m| m.contains("fighter_batch")));
    }

    #[test]
    fn zero_milestone_step_is_rejected() {
        let message = rejected_field("milestone_step: 0");
        assert!(message.is_some_and(|m| m.contains("milestone_step")));
    }

    #[test]
    fn zero_training_step_is_rejected() {
        let message = rejected_field("training_step: 0");
        assert!(message.is_some_and(|m| m.contains("training_step")));
    }

    #[test]
    fn positive_limits_are_accepted() {
        assert!(parse_with_tasks("consecutive_loss_limit: 1").is_ok());
    }

    #[test]
    fn unknown_role_is_a_yaml_error() {
        let yaml = "
characters:
  - name: alice
    role: pirate
";
        assert!(matches!(
            EngineConfig::parse(yaml),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
