//! Small-n Newtonian gravity simulation.
//!
//! Bodies are given in physical units, optionally rescaled to AU / year /
//! Earth-mass units and moved to the center-of-momentum frame, then advanced
//! with a fixed-step integrator while position snapshots are recorded.

pub mod body;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod forces;
pub mod frame;
pub mod generator;
pub mod integrator;
pub mod scale;
pub mod simulation;
pub mod study;

pub use body::{resolve_bodies, Body, BodySpec, VectorSpec};
pub use config::{RunConfig, Scenario};
pub use error::{ConfigError, Result, SimulationError};
pub use forces::{ForceField, Softening};
pub use integrator::{Integrator, PhaseState};
pub use scale::{ReferenceUnits, ScalingMode, UnitScaling};
pub use simulation::{SimulationConfig, SimulationState, Snapshot};
