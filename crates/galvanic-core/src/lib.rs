//! Simulation core for the Galvanic silver plating lesson.
//!
//! Ions and electrons are created at the anode, dragged by the learner, and
//! paired at the cathode, where each pair plates one unit of silver. This
//! crate owns the rules; rendering, sound and input capture belong to the
//! presentation layer, which drives the core with [`SimEvent`]s and listens
//! through a [`FeedbackSink`].
//!
//! # Architecture
//!
//! - [`config`] -- YAML configuration (`galvanic-config.yaml`).
//! - [`geometry`] -- Wire paths, parametric progress, routing, viewport.
//! - [`registry`] -- Live particles and id sources.
//! - [`drag`] -- Pointer positions to one-way progress.
//! - [`pairing`] -- Matching waiting ions with waiting electrons.
//! - [`flow`] -- The current-flow indicator and its timer lifecycle.
//! - [`feedback`] -- Feedback sinks.
//! - [`simulation`] -- The [`Simulation`] reducer tying it all together.

pub mod config;
pub mod drag;
pub mod feedback;
pub mod flow;
pub mod geometry;
pub mod pairing;
pub mod registry;
pub mod simulation;

pub use config::{ConfigError, PlatingConfig};
pub use feedback::{FeedbackSink, NoOpSink, RecordingSink};
pub use flow::{FlowIndicator, FlowTimer};
pub use geometry::{GeometryError, Path, Viewport, WirePaths, route_wire};
pub use pairing::Pairing;
pub use registry::{IdSource, ParticleRegistry, SequentialIds, TimeOrderedIds};
pub use simulation::{Change, SimEvent, Simulation, SimulationError, Transition};
