//! Configuration loading and typed config structures for the Fungera simulation.
//!
//! The canonical configuration lives in `fungera-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every key is optional; the defaults reproduce the classic Fungera run
//! (128x128 memory, seed 42, an 8-slot stack, and so on).

use std::path::{Path, PathBuf};

use fungera_organisms::OrganismConfig;
use serde::Deserialize;

/// Environment variable that overrides `world.state`.
pub const STATE_ENV: &str = "FUNGERA_STATE";

/// Environment variable that overrides `world.name`.
pub const NAME_ENV: &str = "FUNGERA_NAME";

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

    /// A value is outside its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which key is wrong and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `fungera-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Grid, seed, and bootstrap settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Interpreter and death thresholds.
    #[serde(default)]
    pub organisms: OrganismsConfig,

    /// Mutation and culling cadence.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Snapshot directory and autosave timer.
    #[serde(default)]
    pub snapshots: SnapshotConfig,

    /// Driver loop settings.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file, then apply environment overrides
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.world.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults (still
    /// applying environment overrides).
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.world.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.world.memory_rows == 0 || self.world.memory_cols == 0 {
            return invalid("world.memory_rows and world.memory_cols must be at least 1");
        }
        if self.population.cycle_gap == 0 {
            return invalid("population.cycle_gap must be at least 1");
        }
        if self.population.random_rate == 0 {
            return invalid("population.random_rate must be at least 1");
        }
        if self.organisms.stack_length == 0 {
            return invalid("organisms.stack_length must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.population.memory_full_ratio) {
            return invalid("population.memory_full_ratio must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.population.kill_organisms_ratio) {
            return invalid("population.kill_organisms_ratio must be within [0, 1]");
        }
        if self.snapshots.autosave_growth == 0 {
            return invalid("snapshots.autosave_growth must be at least 1");
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name, also used in snapshot file names.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for the cosmic-ray random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid height.
    #[serde(default = "default_memory_dim")]
    pub memory_rows: usize,

    /// Grid width.
    #[serde(default = "default_memory_dim")]
    pub memory_cols: usize,

    /// Genome file used to seed the first organism.
    #[serde(default = "default_genome_path")]
    pub genome_path: PathBuf,

    /// Which state to start from: `new`, `last`, or a snapshot path.
    #[serde(default = "default_state")]
    pub state: String,
}

impl WorldConfig {
    /// Override `state` and `name` from the environment.
    ///
    /// `lookup` resolves a variable name to its value; the loader passes
    /// `std::env::var`, tests pass a fixed map.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(state) = lookup(STATE_ENV) {
            self.state = state;
        }
        if let Some(name) = lookup(NAME_ENV) {
            self.name = name;
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            memory_rows: default_memory_dim(),
            memory_cols: default_memory_dim(),
            genome_path: default_genome_path(),
            state: default_state(),
        }
    }
}

/// Interpreter and death-threshold configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganismsConfig {
    /// Stack capacity per organism.
    #[serde(default = "default_stack_length")]
    pub stack_length: usize,

    /// Error count above which an organism dies.
    #[serde(default = "default_organism_death_rate")]
    pub organism_death_rate: u64,

    /// Ticks without reproduction above which an organism dies.
    #[serde(default = "default_kill_if_no_child")]
    pub kill_if_no_child: u64,

    /// Parasitism distance threshold; 0 disables the penalty.
    #[serde(default = "default_penalize_parasitism")]
    pub penalize_parasitism: u64,
}

impl OrganismsConfig {
    /// Build the interpreter configuration.
    pub fn to_organism_config(&self) -> OrganismConfig {
        OrganismConfig {
            stack_length: self.stack_length,
            organism_death_rate: self.organism_death_rate,
            kill_if_no_child: self.kill_if_no_child,
            penalize_parasitism: self.penalize_parasitism,
            ..OrganismConfig::default()
        }
    }
}

impl Default for OrganismsConfig {
    fn default() -> Self {
        Self {
            stack_length: default_stack_length(),
            organism_death_rate: default_organism_death_rate(),
            kill_if_no_child: default_kill_if_no_child(),
            penalize_parasitism: default_penalize_parasitism(),
        }
    }
}

/// Population-pressure configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Culling is considered every `cycle_gap` ticks.
    #[serde(default = "default_cycle_gap")]
    pub cycle_gap: u64,

    /// One cosmic-ray mutation every `random_rate` ticks.
    #[serde(default = "default_random_rate")]
    pub random_rate: u64,

    /// Culling triggers when the allocated ratio exceeds this.
    #[serde(default = "default_memory_full_ratio")]
    pub memory_full_ratio: f64,

    /// Fraction of the roster removed per cull (rounded down, minimum 1).
    #[serde(default = "default_kill_organisms_ratio")]
    pub kill_organisms_ratio: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            cycle_gap: default_cycle_gap(),
            random_rate: default_random_rate(),
            memory_full_ratio: default_memory_full_ratio(),
            kill_organisms_ratio: default_kill_organisms_ratio(),
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotConfig {
    /// Directory snapshot files are written to.
    #[serde(default = "default_snapshot_dir")]
    pub directory: PathBuf,

    /// Seconds between autosaves; 0 disables autosave.
    #[serde(default = "default_autosave_interval_seconds")]
    pub autosave_interval_seconds: u64,

    /// Multiplier applied to the autosave interval after each autosave.
    #[serde(default = "default_autosave_growth")]
    pub autosave_growth: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: default_snapshot_dir(),
            autosave_interval_seconds: default_autosave_interval_seconds(),
            autosave_growth: default_autosave_growth(),
        }
    }
}

/// Driver loop configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Stop after this many ticks; 0 runs until stopped or extinct.
    #[serde(default)]
    pub max_ticks: u64,

    /// Pause between ticks in milliseconds; 0 runs flat out.
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Start paused, waiting for step or toggle intents.
    #[serde(default)]
    pub start_paused: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Ticks between progress lines from the engine; 0 disables them.
    #[serde(default = "default_progress_interval_ticks")]
    pub progress_interval_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            progress_interval_ticks: default_progress_interval_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Simulation 1".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_memory_dim() -> usize {
    128
}

fn default_genome_path() -> PathBuf {
    PathBuf::from("initial.gen")
}

fn default_state() -> String {
    "new".to_owned()
}

const fn default_stack_length() -> usize {
    8
}

const fn default_organism_death_rate() -> u64 {
    100
}

const fn default_kill_if_no_child() -> u64 {
    25_000
}

const fn default_penalize_parasitism() -> u64 {
    100
}

const fn default_cycle_gap() -> u64 {
    5
}

const fn default_random_rate() -> u64 {
    7
}

const fn default_memory_full_ratio() -> f64 {
    0.7
}

const fn default_kill_organisms_ratio() -> f64 {
    0.3
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

const fn default_autosave_interval_seconds() -> u64 {
    60
}

const fn default_autosave_growth() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_progress_interval_ticks() -> u64 {
    1000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn defaults_match_classic_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.name, "Simulation 1");
        assert_eq!(config.world.seed, 42);
        assert_eq!((config.world.memory_rows, config.world.memory_cols), (128, 128));
        assert_eq!(config.world.state, "new");
        assert_eq!(config.organisms.stack_length, 8);
        assert_eq!(config.organisms.kill_if_no_child, 25_000);
        assert_eq!(config.population.cycle_gap, 5);
        assert_eq!(config.population.random_rate, 7);
        assert_eq!(config.snapshots.autosave_interval_seconds, 60);
        assert_eq!(config.snapshots.autosave_growth, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Run"
  seed: 7
  memory_rows: 64
  memory_cols: 96
  genome_path: "genomes/ancestor.gen"
  state: "last"

organisms:
  stack_length: 4
  organism_death_rate: 20
  kill_if_no_child: 500
  penalize_parasitism: 0

population:
  cycle_gap: 3
  random_rate: 11
  memory_full_ratio: 0.5
  kill_organisms_ratio: 0.25

snapshots:
  directory: "out"
  autosave_interval_seconds: 0
  autosave_growth: 2

simulation:
  max_ticks: 1000
  tick_interval_ms: 5
  start_paused: true

logging:
  level: "debug"
  progress_interval_ticks: 50
"#;
        let config: SimulationConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.world.name, "Test Run");
        assert_eq!(config.world.memory_cols, 96);
        assert_eq!(config.world.genome_path, PathBuf::from("genomes/ancestor.gen"));
        assert_eq!(config.organisms.penalize_parasitism, 0);
        assert_eq!(config.population.random_rate, 11);
        assert!((config.population.kill_organisms_ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.snapshots.directory, PathBuf::from("out"));
        assert_eq!(config.simulation.max_ticks, 1000);
        assert!(config.simulation.start_paused);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.progress_interval_ticks, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: SimulationConfig = serde_yml::from_str("population:\n  cycle_gap: 9\n").unwrap();
        assert_eq!(config.population.cycle_gap, 9);
        assert_eq!(config.population.random_rate, 7);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.population.cycle_gap = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = SimulationConfig::default();
        config.world.memory_cols = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.population.memory_full_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.organisms.stack_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_state_and_name() {
        let env: BTreeMap<&str, &str> = [(STATE_ENV, "snapshots/x.snapshot"), (NAME_ENV, "Other")]
            .into_iter()
            .collect();
        let mut world = WorldConfig::default();
        world.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert_eq!(world.state, "snapshots/x.snapshot");
        assert_eq!(world.name, "Other");

        let mut untouched = WorldConfig::default();
        untouched.apply_overrides(|_| None);
        assert_eq!(untouched, WorldConfig::default());
    }

    #[test]
    fn organism_config_carries_thresholds() {
        let section = OrganismsConfig {
            stack_length: 3,
            organism_death_rate: 9,
            kill_if_no_child: 10,
            penalize_parasitism: 11,
        };
        let oc = section.to_organism_config();
        assert_eq!(oc.stack_length, 3);
        assert_eq!(oc.organism_death_rate, 9);
        assert_eq!(oc.kill_if_no_child, 10);
        assert_eq!(oc.penalize_parasitism, 11);
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(matches!(
            SimulationConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
