//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `nebula-config.yaml` in the working
//! directory. Every field has a default, so an empty file (or a single
//! section) is a valid configuration.

use std::path::Path;

use nebula_npc::NpcSettings;
use serde::{Deserialize, Serialize};

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Heartbeat cadence, speed, seed, and run bounds.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Delta clamping and catch-up banking.
    #[serde(default)]
    pub time_source: TimeSourceConfig,

    /// NPC engine tunables.
    #[serde(default)]
    pub npc: NpcSettings,

    /// Parallel compute unit.
    #[serde(default)]
    pub compute: ComputeConfig,

    /// Low-frequency progression jobs.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Universe seeding.
    #[serde(default)]
    pub universe: UniverseConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Heartbeat and run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock milliseconds between main ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Wall-clock milliseconds between catch-up chunks.
    #[serde(default = "default_catch_up_interval_ms")]
    pub catch_up_interval_ms: u64,

    /// Universe speed multiplier (production, build times, fleet speed).
    #[serde(default = "default_game_speed")]
    pub game_speed: f64,

    /// Random seed for combat rolls, expeditions, and NPC behavior.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            catch_up_interval_ms: default_catch_up_interval_ms(),
            game_speed: default_game_speed(),
            seed: default_seed(),
            max_ticks: 0,
        }
    }
}

/// Time source bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSourceConfig {
    /// Largest delta a single tick may see.
    #[serde(default = "default_max_delta_ms")]
    pub max_delta_ms: u64,

    /// Raw elapsed time above which the excess is banked.
    #[serde(default = "default_catch_up_threshold_ms")]
    pub catch_up_threshold_ms: u64,

    /// Banked time drained per catch-up step.
    #[serde(default = "default_catch_up_chunk_ms")]
    pub catch_up_chunk_ms: u64,

    /// Most catch-up time that may be banked.
    #[serde(default = "default_max_catch_up_ms")]
    pub max_catch_up_ms: u64,

    /// Whether long gaps are banked at all.
    #[serde(default = "default_true")]
    pub catch_up_enabled: bool,
}

impl Default for TimeSourceConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: default_max_delta_ms(),
            catch_up_threshold_ms: default_catch_up_threshold_ms(),
            catch_up_chunk_ms: default_catch_up_chunk_ms(),
            max_catch_up_ms: default_max_catch_up_ms(),
            catch_up_enabled: true,
        }
    }
}

/// Parallel compute unit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Per-request timeout.
    #[serde(default = "default_compute_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_compute_timeout_ms(),
        }
    }
}

/// Scheduler intervals for progression jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Achievement check interval.
    #[serde(default = "default_achievement_check_ms")]
    pub achievement_check_ms: u64,

    /// Eliminated-NPC cleanup interval.
    #[serde(default = "default_diplomacy_cleanup_ms")]
    pub diplomacy_cleanup_ms: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            achievement_check_ms: default_achievement_check_ms(),
            diplomacy_cleanup_ms: default_diplomacy_cleanup_ms(),
        }
    }
}

/// Shape of the seeded universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Player display name.
    #[serde(default = "default_player_name")]
    pub player_name: String,

    /// Number of galaxies.
    #[serde(default = "default_galaxies")]
    pub galaxies: u32,

    /// Systems per galaxy.
    #[serde(default = "default_systems")]
    pub systems: u32,

    /// Planet slots per system.
    #[serde(default = "default_positions")]
    pub positions: u32,

    /// NPC factions to seed.
    #[serde(default = "default_npc_count")]
    pub npc_count: u32,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            galaxies: default_galaxies(),
            systems: default_systems(),
            positions: default_positions(),
            npc_count: default_npc_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_catch_up_interval_ms() -> u64 {
    100
}

const fn default_game_speed() -> f64 {
    1.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_delta_ms() -> u64 {
    60_000
}

const fn default_catch_up_threshold_ms() -> u64 {
    300_000
}

const fn default_catch_up_chunk_ms() -> u64 {
    60_000
}

const fn default_max_catch_up_ms() -> u64 {
    86_400_000
}

const fn default_true() -> bool {
    true
}

const fn default_compute_timeout_ms() -> u64 {
    10_000
}

const fn default_achievement_check_ms() -> u64 {
    5_000
}

const fn default_diplomacy_cleanup_ms() -> u64 {
    15_000
}

fn default_player_name() -> String {
    String::from("Commander")
}

const fn default_galaxies() -> u32 {
    3
}

const fn default_systems() -> u32 {
    50
}

const fn default_positions() -> u32 {
    15
}

const fn default_npc_count() -> u32 {
    40
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GameConfig::default();
        assert_eq!(config.engine.tick_interval_ms, 1_000);
        assert_eq!(config.engine.catch_up_interval_ms, 100);
        assert_eq!(config.engine.seed, 42);
        assert_eq!(config.time_source.max_delta_ms, 60_000);
        assert_eq!(config.time_source.catch_up_threshold_ms, 300_000);
        assert_eq!(config.time_source.max_catch_up_ms, 86_400_000);
        assert!(config.time_source.catch_up_enabled);
        assert_eq!(config.npc.slice_size, 20);
        assert_eq!(config.compute.timeout_ms, 10_000);
        assert_eq!(config.progression.diplomacy_cleanup_ms, 15_000);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GameConfig::parse("").ok();
        assert_eq!(config, Some(GameConfig::default()));
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
engine:
  tick_interval_ms: 500
  game_speed: 2.5
time_source:
  catch_up_enabled: false
npc:
  slice_size: 8
";
        let config = GameConfig::parse(yaml).ok();
        assert!(config.is_some());
        let config = config.unwrap_or_default();
        assert_eq!(config.engine.tick_interval_ms, 500);
        assert_eq!(config.engine.game_speed, 2.5);
        assert_eq!(config.engine.catch_up_interval_ms, 100);
        assert!(!config.time_source.catch_up_enabled);
        assert_eq!(config.time_source.catch_up_chunk_ms, 60_000);
        assert_eq!(config.npc.slice_size, 8);
        assert_eq!(config.npc.max_spy_missions, 3);
    }

    #[test]
    fn parse_rejects_bad_yaml() {
        let result = GameConfig::parse("engine: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../nebula-config.yaml");
        let config = GameConfig::from_file(&path);
        assert!(config.is_ok());
    }
}
