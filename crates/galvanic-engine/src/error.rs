//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the lesson loop
//! so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: galvanic_core::ConfigError,
    },

    /// The simulation could not be created or refused an update.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: galvanic_core::SimulationError,
    },

    /// Wire layout from the configured anchors failed.
    #[error("geometry error: {source}")]
    Geometry {
        /// The underlying geometry error.
        #[from]
        source: galvanic_core::GeometryError,
    },

    /// The `autopilot` section of the config file is invalid.
    #[error("autopilot config error: {message}")]
    Autopilot {
        /// Description of the problem.
        message: String,
    },
}
