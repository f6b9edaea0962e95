//! Configuration loading and typed config structures for the plating simulation.
//!
//! The canonical configuration lives in `galvanic-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads, parses, and validates it.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use galvanic_ledger::ReservoirParams;
use galvanic_types::{Point, Rect};

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

    /// The configuration parsed but its values are inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
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
/// Mirrors the structure of `galvanic-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlatingConfig {
    /// Scene settings (name, logical frame size).
    #[serde(default)]
    pub world: WorldConfig,

    /// Anode/cathode masses and the plating goal.
    #[serde(default)]
    pub reservoir: ReservoirConfig,

    /// Particle limits and regions.
    #[serde(default)]
    pub particles: ParticleConfig,

    /// Current-flow indicator settings.
    #[serde(default)]
    pub flow: FlowConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlatingConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `PLATING_LOG` environment variable overrides `logging.level`.
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
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml rejects an empty document; treat it as "all defaults".
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.logging.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every section for internally consistent values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        self.reservoir
            .to_params()
            .validate()
            .map_err(|err| invalid(&err.to_string()))?;
        self.particles.validate()?;
        if !self.world.frame().encloses(&self.particles.electrolyte) {
            return Err(invalid("particles.electrolyte must lie inside the world frame"));
        }
        self.flow.validate()
    }
}

/// Build a [`ConfigError::Invalid`] from a reason.
fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Scene configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable lesson name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Width of the logical frame.
    #[serde(default = "default_logical_width")]
    pub logical_width: f64,

    /// Height of the logical frame.
    #[serde(default = "default_logical_height")]
    pub logical_height: f64,
}

impl WorldConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.logical_width > 0.0 && self.logical_height > 0.0) {
            return Err(invalid("world.logical_width and logical_height must be positive"));
        }
        Ok(())
    }

    /// The whole logical frame as a rectangle.
    pub const fn frame(&self) -> Rect {
        Rect {
            min: Point::new(0.0, 0.0),
            max: Point::new(self.logical_width, self.logical_height),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            logical_width: default_logical_width(),
            logical_height: default_logical_height(),
        }
    }
}

/// Reservoir configuration, in whole mass units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservoirConfig {
    /// Anode mass at the start of a run.
    #[serde(default = "default_anode_mass")]
    pub anode_mass: u32,

    /// Cathode mass at the start of a run.
    #[serde(default = "default_cathode_mass")]
    pub cathode_mass: u32,

    /// Mass carried by one ion.
    #[serde(default = "default_unit")]
    pub unit: u32,

    /// Spawning is blocked at or under this anode mass.
    #[serde(default = "default_depletion_threshold")]
    pub depletion_threshold: u32,

    /// Number of plating reactions that completes the lesson.
    #[serde(default = "default_plating_goal")]
    pub plating_goal: u32,
}

impl ReservoirConfig {
    /// Convert to ledger parameters.
    pub fn to_params(&self) -> ReservoirParams {
        ReservoirParams {
            anode_mass: Decimal::from(self.anode_mass),
            cathode_mass: Decimal::from(self.cathode_mass),
            unit: Decimal::from(self.unit),
            depletion_threshold: Decimal::from(self.depletion_threshold),
            plating_goal: self.plating_goal,
        }
    }
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            anode_mass: default_anode_mass(),
            cathode_mass: default_cathode_mass(),
            unit: default_unit(),
            depletion_threshold: default_depletion_threshold(),
            plating_goal: default_plating_goal(),
        }
    }
}

/// Particle limits and the regions of the electrolyte.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticleConfig {
    /// Maximum number of particles in `active` status at once.
    #[serde(default = "default_max_active")]
    pub max_active: u32,

    /// Progress at which a drag-end counts as reaching the end of a wire.
    #[serde(default = "default_handoff_threshold")]
    pub handoff_threshold: f64,

    /// Number of candidate positions sampled by the nearest-progress search.
    #[serde(default = "default_nearest_samples")]
    pub nearest_samples: u32,

    /// Where new ions appear (next to the anode).
    #[serde(default = "default_ion_origin")]
    pub ion_origin: Point,

    /// The electrolyte; ions dropped outside it return to their origin.
    #[serde(default = "default_electrolyte")]
    pub electrolyte: Rect,

    /// The region around the cathode where ions can be reduced.
    #[serde(default = "default_cathode_target")]
    pub cathode_target: Rect,
}

impl ParticleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        // A spawn inserts an ion and an electron together.
        if self.max_active < 2 {
            return Err(invalid("particles.max_active must be at least 2"));
        }
        if !(self.handoff_threshold > 0.0 && self.handoff_threshold <= 1.0) {
            return Err(invalid("particles.handoff_threshold must be in (0, 1]"));
        }
        if self.nearest_samples < 2 {
            return Err(invalid("particles.nearest_samples must be at least 2"));
        }
        if !self.electrolyte.has_area() {
            return Err(invalid("particles.electrolyte must have a non-zero area"));
        }
        if !self.cathode_target.has_area() {
            return Err(invalid("particles.cathode_target must have a non-zero area"));
        }
        if !self.electrolyte.contains(self.ion_origin) {
            return Err(invalid("particles.ion_origin must lie inside the electrolyte"));
        }
        // Drops count as on the cathode only when also inside the electrolyte.
        if !self.electrolyte.encloses(&self.cathode_target) {
            return Err(invalid("particles.cathode_target must lie inside the electrolyte"));
        }
        Ok(())
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
            handoff_threshold: default_handoff_threshold(),
            nearest_samples: default_nearest_samples(),
            ion_origin: default_ion_origin(),
            electrolyte: default_electrolyte(),
            cathode_target: default_cathode_target(),
        }
    }
}

/// Current-flow indicator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowConfig {
    /// Fraction of the full circuit the indicator moves per tick.
    #[serde(default = "default_flow_step")]
    pub step: f64,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl FlowConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step > 0.0 && self.step < 1.0) {
            return Err(invalid("flow.step must be in (0, 1)"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("flow.tick_interval_ms must be at least 1"));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            step: default_flow_step(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Override the log level with `PLATING_LOG` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PLATING_LOG") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Silver Plating".to_owned()
}

const fn default_logical_width() -> f64 {
    1000.0
}

const fn default_logical_height() -> f64 {
    600.0
}

const fn default_anode_mass() -> u32 {
    50
}

const fn default_cathode_mass() -> u32 {
    25
}

const fn default_unit() -> u32 {
    5
}

const fn default_depletion_threshold() -> u32 {
    10
}

const fn default_plating_goal() -> u32 {
    5
}

const fn default_max_active() -> u32 {
    5
}

const fn default_handoff_threshold() -> f64 {
    0.95
}

const fn default_nearest_samples() -> u32 {
    101
}

const fn default_ion_origin() -> Point {
    Point::new(300.0, 430.0)
}

const fn default_electrolyte() -> Rect {
    Rect {
        min: Point::new(200.0, 300.0),
        max: Point::new(800.0, 560.0),
    }
}

const fn default_cathode_target() -> Rect {
    Rect {
        min: Point::new(640.0, 320.0),
        max: Point::new(760.0, 540.0),
    }
}

const fn default_flow_step() -> f64 {
    0.02
}

const fn default_tick_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlatingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reservoir.anode_mass, 50);
        assert_eq!(config.reservoir.cathode_mass, 25);
        assert_eq!(config.particles.max_active, 5);
        assert_eq!(config.particles.nearest_samples, 101);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Bench"
  logical_width: 800
  logical_height: 400

reservoir:
  anode_mass: 30
  cathode_mass: 10
  unit: 2
  depletion_threshold: 4
  plating_goal: 3

particles:
  max_active: 7
  handoff_threshold: 0.9
  nearest_samples: 51
  ion_origin: { x: 150, y: 250 }
  electrolyte:
    min: { x: 100, y: 200 }
    max: { x: 700, y: 390 }
  cathode_target:
    min: { x: 600, y: 220 }
    max: { x: 690, y: 380 }

flow:
  step: 0.05
  tick_interval_ms: 20

logging:
  level: "debug"
"#;

        let config = PlatingConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test Bench");
        assert_eq!(config.reservoir.unit, 2);
        assert_eq!(config.reservoir.plating_goal, 3);
        assert_eq!(config.particles.max_active, 7);
        assert_eq!(config.particles.nearest_samples, 51);
        assert_eq!(config.flow.tick_interval_ms, 20);
        assert!(config.particles.cathode_target.contains(Point::new(650.0, 300.0)));
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "reservoir:\n  plating_goal: 2\n";
        let config = PlatingConfig::parse(yaml).unwrap();

        // Goal is overridden
        assert_eq!(config.reservoir.plating_goal, 2);
        // Everything else uses defaults
        assert_eq!(config.reservoir.anode_mass, 50);
        assert_eq!(config.particles.max_active, 5);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(PlatingConfig::parse("").is_ok());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let result = PlatingConfig::parse("reservoir: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn zero_unit_is_invalid() {
        let result = PlatingConfig::parse("reservoir:\n  unit: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn cap_below_spawn_batch_is_invalid() {
        let result = PlatingConfig::parse("particles:\n  max_active: 1\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn ion_origin_outside_electrolyte_is_invalid() {
        let yaml = "particles:\n  ion_origin: { x: 10, y: 10 }\n";
        assert!(matches!(
            PlatingConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn cathode_target_outside_electrolyte_is_invalid() {
        let yaml = "particles:
  cathode_target:
    min: { x: 900, y: 20 }
    max: { x: 990, y: 100 }
";
        let result = PlatingConfig::parse(yaml);
        assert!(
            matches!(&result, Err(ConfigError::Invalid { reason }) if reason.contains("cathode_target")),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn cathode_target_straddling_electrolyte_edge_is_invalid() {
        let yaml = "particles:
  cathode_target:
    min: { x: 700, y: 320 }
    max: { x: 850, y: 540 }
";
        assert!(matches!(
            PlatingConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn electrolyte_outside_world_frame_is_invalid() {
        let yaml = "world:
  logical_width: 500
  logical_height: 400
";
        let result = PlatingConfig::parse(yaml);
        assert!(
            matches!(&result, Err(ConfigError::Invalid { reason }) if reason.contains("world frame")),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn reservoir_converts_to_ledger_params() {
        let params = ReservoirConfig::default().to_params();
        assert_eq!(params, ReservoirParams::default());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("galvanic-config.yaml");
        if path.exists() {
            let config = PlatingConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
