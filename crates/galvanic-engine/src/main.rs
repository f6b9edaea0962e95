//! Headless engine for the Galvanic plating simulation.
//!
//! Runs the simulation core without a browser: the autopilot plays the
//! learner, the flow ticker plays the animation timer, and every feedback
//! value becomes a structured log line.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `galvanic-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the autopilot section and lay out the wires
//! 4. Create the simulation with time-ordered particle ids
//! 5. Run the lesson loop
//! 6. Log the result

mod autopilot;
mod error;
mod lesson;
mod log_sink;
mod ticker;

use std::path::Path;

use anyhow::Context as _;
use galvanic_core::{PlatingConfig, Simulation, TimeOrderedIds};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::autopilot::{Autopilot, AutopilotConfig};
use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "galvanic-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the lesson loop fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logging needs the configured level, so the config is read first.
    let config = load_config().context("loading galvanic-config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        world_name = config.world.name,
        anode_mass = config.reservoir.anode_mass,
        cathode_mass = config.reservoir.cathode_mass,
        plating_goal = config.reservoir.plating_goal,
        max_active = config.particles.max_active,
        tick_interval_ms = config.flow.tick_interval_ms,
        "galvanic-engine starting"
    );

    let autopilot_config = load_autopilot_config().context("loading autopilot config")?;
    let mut pilot = Autopilot::new(autopilot_config, &config)?;
    info!(
        seed = pilot.config().seed,
        lessons = pilot.config().lessons,
        drag_steps = pilot.config().drag_steps,
        "autopilot ready"
    );

    let mut sim = Simulation::new(config, Box::new(TimeOrderedIds))?;

    let result = lesson::run_lessons(&mut sim, &mut pilot).await?;
    lesson::log_result(&result);

    info!(end = ?result.end, "galvanic-engine shutdown complete");
    Ok(())
}

/// Load the simulation configuration, falling back to defaults when the
/// file does not exist.
fn load_config() -> Result<PlatingConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(PlatingConfig::from_file(path)?)
    } else {
        PlatingConfig::parse("").map_err(EngineError::from)
    }
}

/// Load the `autopilot` section of the configuration file.
///
/// Missing file or missing section means defaults.
fn load_autopilot_config() -> Result<AutopilotConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if !path.exists() {
        return Ok(AutopilotConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Autopilot {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::Autopilot {
            message: format!("failed to parse config YAML: {e}"),
        })?;
    match raw.get("autopilot") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| {
            EngineError::Autopilot {
                message: format!("failed to parse autopilot config: {e}"),
            }
        }),
        None => Ok(AutopilotConfig::default()),
    }
}
