//! Scenario files.
//!
//! A scenario is a JSON document bundling the bodies, the simulation
//! configuration and the run parameters:
//!
//! ```json
//! {
//!   "simulation": { "dt": 315576.0, "g": 6.6743e-11, "scaling": "natural" },
//!   "run": { "steps": 1200, "interval": 10, "integrator": "rk4" },
//!   "bodies": [
//!     { "name": "Sun", "mass": 1.9885e30, "radius": 6.957e8, "color": [255, 230, 0] },
//!     { "name": "Jupiter", "position": 7.7857e11, "velocity": 13.07e3,
//!       "mass": 1.8982e27, "reference": "Sun", "period": 11.862 }
//!   ]
//! }
//! ```
//!
//! Scalar positions lie on the x-axis and scalar velocities point along y.
//! Omitted simulation fields take the values of [`SimulationConfig::default`].

use crate::body::{resolve_bodies, Body, BodySpec};
use crate::error::Result;
use crate::integrator::Integrator;
use crate::simulation::SimulationConfig;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// How long to run and how often to take snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RunConfig {
    pub steps: usize,
    pub interval: usize,
    #[serde(default)]
    pub integrator: Integrator,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub run: RunConfig,
    pub bodies: Vec<BodySpec>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Absolute bodies, index-aligned with `self.bodies`.
    pub fn resolve_bodies(&self) -> Result<Vec<Body>> {
        Ok(resolve_bodies(&self.bodies)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, SimulationError};
    use crate::forces::Softening;
    use crate::scale::ScalingMode;
    use approx::assert_relative_eq;

    const SUN_JUPITER: &str = r#"{
        "simulation": { "dt": 315576.0, "g": 6.6743e-11, "scaling": "natural",
                        "softening": { "absolute": 0.0 } },
        "run": { "steps": 1200, "interval": 10, "integrator": "rk4" },
        "bodies": [
            { "name": "Jupiter", "position": 7.7857e11, "velocity": 13.07e3,
              "mass": 1.8982e27, "reference": "Sun", "period": 11.862 },
            { "name": "Sun", "position": [1.0, 2.0, 3.0], "mass": 1.9885e30 }
        ]
    }"#;

    #[test]
    fn parses_full_scenario() {
        let scenario = Scenario::from_json(SUN_JUPITER).unwrap();
        assert_eq!(scenario.simulation.scaling, ScalingMode::Natural);
        assert_eq!(scenario.simulation.softening, Softening::Absolute(0.0));
        assert!(scenario.simulation.com_frame);
        assert_eq!(scenario.run.integrator, Integrator::Rk4);

        let bodies = scenario.resolve_bodies().unwrap();
        assert_relative_eq!(bodies[0].position.x, 7.7857e11 + 1.0);
        assert_relative_eq!(bodies[0].position.z, 3.0);
        assert_relative_eq!(bodies[0].velocity.y, 13.07e3);
        assert_eq!(bodies[0].known_period, Some(11.862));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let scenario = Scenario::from_json(
            r#"{ "run": { "steps": 10, "interval": 5 },
                 "bodies": [ { "name": "a", "mass": 1.0 } ] }"#,
        )
        .unwrap();
        assert_eq!(scenario.simulation, SimulationConfig::default());
        assert_eq!(scenario.run.integrator, Integrator::Symplectic);
    }

    #[test]
    fn bad_json_and_bad_references_are_errors() {
        assert!(matches!(
            Scenario::from_json("{"),
            Err(SimulationError::Json(_))
        ));
        let scenario = Scenario::from_json(
            r#"{ "run": { "steps": 1, "interval": 1 },
                 "bodies": [ { "name": "a", "mass": 1.0, "reference": "b" },
                             { "name": "b", "mass": 1.0, "reference": "a" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.resolve_bodies(),
            Err(SimulationError::Configuration(ConfigError::CyclicReference(_)))
        ));
    }
}
