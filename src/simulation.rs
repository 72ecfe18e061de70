use crate::body::Body;
use crate::diagnostics::{self, EnergyMonitor, DEFAULT_ENERGY_THRESHOLDS};
use crate::error::{ConfigError, Result, SimulationError};
use crate::forces::{ForceField, Softening};
use crate::frame;
use crate::integrator::{Integrator, PhaseState};
use crate::scale::{ReferenceUnits, ScalingMode, UnitScaling};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use nalgebra::Vector3;
use serde::Deserialize;

/// Everything needed to turn a body list into a [`SimulationState`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time step in the units the bodies are given in (s when scaling).
    pub dt: f64,
    /// Gravitational constant in input units. Must be SI G when scaling.
    pub g: f64,
    pub scaling: ScalingMode,
    pub units: ReferenceUnits,
    /// Move to the center-of-momentum frame before stepping.
    pub com_frame: bool,
    pub softening: Softening,
    /// Reject non-positive masses and stop on non-finite state after a batch.
    pub strict: bool,
    pub show_progress: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            dt: 1.0,
            g: 1.0,
            scaling: ScalingMode::None,
            units: ReferenceUnits::default(),
            com_frame: true,
            softening: Softening::default(),
            strict: false,
            show_progress: false,
        }
    }
}

impl SimulationConfig {
    pub fn new(dt: f64, g: f64) -> Self {
        SimulationConfig {
            dt,
            g,
            ..SimulationConfig::default()
        }
    }

    /// SI inputs integrated in AU / year / Earth-mass units with SI `G`.
    pub fn natural(dt: f64) -> Self {
        SimulationConfig {
            dt,
            g: crate::constants::G,
            scaling: ScalingMode::Natural,
            ..SimulationConfig::default()
        }
    }

    pub fn with_com_frame(mut self, com_frame: bool) -> Self {
        self.com_frame = com_frame;
        self
    }

    pub fn with_softening(mut self, softening: Softening) -> Self {
        self.softening = softening;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Body positions at one instant, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Simulated time since construction (s when scaling, else input units)
    pub time: f64,
    pub positions: Vec<Vector3<f64>>,
}

/// Live state of one simulation and its recorded history.
///
/// Internally everything is kept in the units selected at construction;
/// snapshots and the `physical_*` accessors are always in input units.
#[derive(Debug, Clone)]
pub struct SimulationState {
    phase: PhaseState,
    masses: Vec<f64>,
    dt: f64,
    field: ForceField,
    scaling: Option<UnitScaling>,
    strict: bool,
    show_progress: bool,
    /// Simulated time in internal units
    time: f64,
    history: Vec<Snapshot>,
    energy_history: Vec<f64>,
    energy_monitor: EnergyMonitor,
}

impl SimulationState {
    pub fn new(bodies: &[Body], config: &SimulationConfig) -> Result<Self> {
        if bodies.is_empty() {
            return Err(ConfigError::NoBodies.into());
        }
        if !(config.dt.is_finite() && config.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(config.dt).into());
        }
        if config.strict {
            if let Some((index, body)) = bodies
                .iter()
                .enumerate()
                .find(|(_, b)| !(b.mass.is_finite() && b.mass > 0.0))
            {
                return Err(ConfigError::NonPositiveMass {
                    index,
                    mass: body.mass,
                }
                .into());
            }
        }

        let scaling = match config.scaling {
            ScalingMode::None => None,
            ScalingMode::Natural => Some(UnitScaling::new(config.units, config.g)?),
        };

        let (mut positions, mut velocities, mut masses): (Vec<_>, Vec<_>, Vec<_>) = (
            bodies.iter().map(|b| b.position).collect(),
            bodies.iter().map(|b| b.velocity).collect(),
            bodies.iter().map(|b| b.mass).collect(),
        );
        let (dt, g) = match &scaling {
            Some(s) => {
                positions = positions.iter().map(|x| s.position_to_natural(x)).collect();
                velocities = velocities.iter().map(|v| s.velocity_to_natural(v)).collect();
                masses = masses.iter().map(|&m| s.mass_to_natural(m)).collect();
                (s.time_to_natural(config.dt), s.g)
            }
            None => (config.dt, config.g),
        };
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(dt).into());
        }

        if config.com_frame {
            (positions, velocities) =
                frame::to_center_of_momentum(&masses, &positions, &velocities);
            debug!(
                "Total momentum: {:?}",
                diagnostics::total_momentum(&masses, &velocities)
            );
            debug!(
                "Center of mass: {:?}",
                diagnostics::center_of_mass(&masses, &positions)
            );
        }

        let min_distance = config.softening.min_distance(&positions)?;
        let field = ForceField::new(g, min_distance);
        debug!("dt = {dt:e}, g = {g:e}, min distance = {min_distance:e}");

        let mut phase = PhaseState::new(positions, velocities);
        field.accumulate(&phase.positions, &masses, &mut phase.accelerations);

        let initial_energy =
            diagnostics::total_energy(&field, &masses, &phase.positions, &phase.velocities);

        Ok(SimulationState {
            phase,
            masses,
            dt,
            field,
            scaling,
            strict: config.strict,
            show_progress: config.show_progress,
            time: 0.0,
            history: Vec::new(),
            energy_history: Vec::new(),
            energy_monitor: EnergyMonitor::new(initial_energy, &DEFAULT_ENERGY_THRESHOLDS),
        })
    }

    /// Advances the simulation by `steps` steps, recording a snapshot before
    /// stepping and after every `interval` steps.
    ///
    /// A run that succeeds adds exactly `steps / interval + 1` snapshots.
    pub fn run(&mut self, steps: usize, interval: usize, integrator: Integrator) -> Result<()> {
        if interval == 0 {
            return Err(ConfigError::ZeroInterval.into());
        }
        if steps % interval != 0 {
            return Err(ConfigError::StepsNotMultiple { steps, interval }.into());
        }
        let batches = steps / interval;
        info!(
            "Running {} steps with {} ({} batches of {})",
            steps, integrator, batches, interval
        );

        let pb = if self.show_progress {
            ProgressBar::new(batches as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Solving with {integrator}"));

        self.record_snapshot(0.0);
        for batch in 0..batches {
            debug!("Batch {} of {}", batch, batches);
            integrator.advance(&mut self.phase, &self.masses, &self.field, self.dt, interval);
            self.time += interval as f64 * self.dt;
            self.record_snapshot((batch + 1) as f64 / batches as f64);
            pb.inc(1);

            if self.strict {
                if let Some(body) = self.phase.first_non_finite() {
                    pb.abandon();
                    return Err(SimulationError::NumericalDegeneracy { batch, body });
                }
            }
        }
        pb.finish();
        info!(
            "Run finished at t = {:e}, relative energy drift {:e}",
            self.physical_time(),
            self.relative_energy_drift()
        );
        Ok(())
    }

    fn record_snapshot(&mut self, fraction: f64) {
        let snapshot = Snapshot {
            time: self.physical_time(),
            positions: self.physical_positions(),
        };
        self.history.push(snapshot);
        let energy = self.total_energy();
        self.energy_history.push(energy);
        self.energy_monitor.record(energy, fraction);
    }

    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Snapshot> {
        self.history
    }

    /// Total energy (internal units) at every snapshot.
    pub fn energy_history(&self) -> &[f64] {
        &self.energy_history
    }

    pub fn energy_monitor(&self) -> &EnergyMonitor {
        &self.energy_monitor
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.phase.positions
    }

    pub fn velocities(&self) -> &[Vector3<f64>] {
        &self.phase.velocities
    }

    pub fn accelerations(&self) -> &[Vector3<f64>] {
        &self.phase.accelerations
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Time step in internal units
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Gravitational constant in internal units
    pub fn g(&self) -> f64 {
        self.field.g
    }

    pub fn min_distance(&self) -> f64 {
        self.field.min_distance
    }

    pub fn scaling(&self) -> Option<&UnitScaling> {
        self.scaling.as_ref()
    }

    pub fn is_scaled(&self) -> bool {
        self.scaling.is_some()
    }

    /// Time step in input units (s when scaling)
    pub fn physical_dt(&self) -> f64 {
        match &self.scaling {
            Some(s) => s.time_to_physical(self.dt),
            None => self.dt,
        }
    }

    pub fn physical_time(&self) -> f64 {
        match &self.scaling {
            Some(s) => s.time_to_physical(self.time),
            None => self.time,
        }
    }

    pub fn physical_positions(&self) -> Vec<Vector3<f64>> {
        self.convert(&self.phase.positions, UnitScaling::position_to_physical)
    }

    pub fn physical_velocities(&self) -> Vec<Vector3<f64>> {
        self.convert(&self.phase.velocities, UnitScaling::velocity_to_physical)
    }

    pub fn physical_accelerations(&self) -> Vec<Vector3<f64>> {
        self.convert(&self.phase.accelerations, UnitScaling::acceleration_to_physical)
    }

    fn convert(
        &self,
        values: &[Vector3<f64>],
        f: fn(&UnitScaling, &Vector3<f64>) -> Vector3<f64>,
    ) -> Vec<Vector3<f64>> {
        match &self.scaling {
            Some(s) => values.iter().map(|v| f(s, v)).collect(),
            None => values.to_vec(),
        }
    }

    /// Total energy of the current state in internal units.
    pub fn total_energy(&self) -> f64 {
        diagnostics::total_energy(
            &self.field,
            &self.masses,
            &self.phase.positions,
            &self.phase.velocities,
        )
    }

    pub fn total_momentum(&self) -> Vector3<f64> {
        diagnostics::total_momentum(&self.masses, &self.phase.velocities)
    }

    pub fn relative_energy_drift(&self) -> f64 {
        self.energy_monitor.relative_drift(self.total_energy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair() -> Vec<Body> {
        vec![
            Body::new(1.0, Vector3::new(-0.5, 0.0, 0.0), Vector3::new(0.0, -0.5, 0.0)),
            Body::new(1.0, Vector3::new(0.5, 0.0, 0.0), Vector3::new(0.0, 0.5, 0.0)),
        ]
    }

    #[test]
    fn history_length_matches_batches() {
        let mut sim = SimulationState::new(&pair(), &SimulationConfig::new(1e-3, 1.0)).unwrap();
        sim.run(100, 10, Integrator::Symplectic).unwrap();
        assert_eq!(sim.history().len(), 11);
        assert_relative_eq!(sim.history()[10].time, 0.1, max_relative = 1e-12);
        assert_relative_eq!(
            sim.history()[1].time - sim.history()[0].time,
            0.01,
            max_relative = 1e-12
        );
    }

    #[test]
    fn invalid_interval_fails_before_stepping() {
        let mut sim = SimulationState::new(&pair(), &SimulationConfig::new(1e-3, 1.0)).unwrap();
        let before = sim.positions().to_vec();
        let err = sim.run(10, 3, Integrator::Rk4).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Configuration(ConfigError::StepsNotMultiple { steps: 10, interval: 3 })
        ));
        assert!(matches!(
            sim.run(10, 0, Integrator::Rk4),
            Err(SimulationError::Configuration(ConfigError::ZeroInterval))
        ));
        assert!(sim.history().is_empty());
        assert_eq!(sim.positions(), &before[..]);
    }

    #[test]
    fn construction_rejects_bad_inputs() {
        let err = SimulationState::new(&[], &SimulationConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        let err = SimulationState::new(&pair(), &SimulationConfig::new(0.0, 1.0)).unwrap_err();
        assert!(err.is_configuration());

        let mut bodies = pair();
        bodies[1].mass = 0.0;
        let strict = SimulationConfig::new(1e-3, 1.0).with_strict(true);
        assert!(matches!(
            SimulationState::new(&bodies, &strict),
            Err(SimulationError::Configuration(ConfigError::NonPositiveMass { index: 1, .. }))
        ));
        // permissive mode lets it through
        assert!(SimulationState::new(&bodies, &SimulationConfig::new(1e-3, 1.0)).is_ok());
    }

    #[test]
    fn strict_mode_stops_on_non_finite_state() {
        let bodies = vec![
            Body::new(1.0, Vector3::zeros(), Vector3::zeros()),
            Body::new(1.0, Vector3::zeros(), Vector3::zeros()),
        ];
        let config = SimulationConfig::new(1e-3, 1.0)
            .with_com_frame(false)
            .with_softening(Softening::Absolute(0.0));

        let mut permissive = SimulationState::new(&bodies, &config).unwrap();
        permissive.run(4, 2, Integrator::Symplectic).unwrap();
        assert!(permissive.history()[2].positions[0].x.is_nan());

        let mut strict = SimulationState::new(&bodies, &config.with_strict(true)).unwrap();
        let err = strict.run(4, 2, Integrator::Symplectic).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NumericalDegeneracy { batch: 0, body: 0 }
        ));
        assert_eq!(strict.history().len(), 2);
    }

    #[test]
    fn scaled_history_is_in_meters() {
        let bodies = vec![
            Body::new(crate::constants::M_SUN, Vector3::zeros(), Vector3::zeros()),
            Body::on_axis(
                crate::constants::M_EARTH,
                crate::constants::ORBIT_R_EARTH,
                crate::constants::V_EARTH,
            ),
        ];
        let config =
            SimulationConfig::natural(0.001 * crate::constants::YEAR_IN_S).with_com_frame(false);
        let mut sim = SimulationState::new(&bodies, &config).unwrap();
        assert!(sim.is_scaled());
        assert_relative_eq!(sim.dt(), 0.001, max_relative = 1e-12);
        assert_relative_eq!(
            sim.physical_dt(),
            0.001 * crate::constants::YEAR_IN_S,
            max_relative = 1e-12
        );
        assert_relative_eq!(sim.positions()[1].x, 1.0, max_relative = 1e-4);

        sim.run(10, 5, Integrator::Rk4).unwrap();
        assert_relative_eq!(
            sim.history()[0].positions[1].x,
            crate::constants::ORBIT_R_EARTH,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            sim.history()[2].time,
            0.01 * crate::constants::YEAR_IN_S,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            sim.physical_velocities()[1].norm(),
            crate::constants::V_EARTH,
            max_relative = 1e-3
        );
    }

    #[test]
    fn inconsistent_gravity_fails_at_construction() {
        let config = SimulationConfig {
            scaling: ScalingMode::Natural,
            ..SimulationConfig::new(1.0, 1.0)
        };
        let err = SimulationState::new(&pair(), &config).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Configuration(ConfigError::InconsistentGravity { .. })
        ));
    }
}
