// src/study.rs

use crate::body::Body;
use crate::error::Result;
use crate::integrator::Integrator;
use crate::simulation::{SimulationConfig, SimulationState, Snapshot};
use log::info;
use rayon::prelude::*;

/// Outcome of one run of a timestep sweep.
#[derive(Debug, Clone)]
pub struct SweepRun {
    /// Time step in input units
    pub dt: f64,
    pub steps: usize,
    pub interval: usize,
    pub relative_energy_drift: f64,
    pub history: Vec<Snapshot>,
}

/// Smallest step count that is a multiple of `interval`, spans at least
/// `duration`, and yields about `snapshots` snapshots.
pub fn plan_steps(duration: f64, dt: f64, snapshots: usize) -> (usize, usize) {
    let raw = (duration / dt).ceil().max(1.0) as usize;
    let interval = (raw / snapshots.max(1)).max(1);
    let steps = raw.div_ceil(interval) * interval;
    (steps, interval)
}

/// Simulates the same bodies once per time step, in parallel.
///
/// Every run uses `base` with its `dt` replaced. Results keep the order of
/// `dts`; the first failing run aborts the sweep.
pub fn timestep_sweep(
    bodies: &[Body],
    base: &SimulationConfig,
    dts: &[f64],
    duration: f64,
    snapshots: usize,
    integrator: Integrator,
) -> Result<Vec<SweepRun>> {
    info!("Sweeping {} time steps with {}", dts.len(), integrator);
    dts.par_iter()
        .map(|&dt| {
            let config = SimulationConfig {
                dt,
                show_progress: false,
                ..base.clone()
            };
            let (steps, interval) = plan_steps(duration, dt, snapshots);
            let mut sim = SimulationState::new(bodies, &config)?;
            sim.run(steps, interval, integrator)?;
            Ok(SweepRun {
                dt,
                steps,
                interval,
                relative_energy_drift: sim.relative_energy_drift(),
                history: sim.into_history(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn planned_steps_cover_duration() {
        assert_eq!(plan_steps(1.0, 0.01, 10), (100, 10));
        let (steps, interval) = plan_steps(1.0, 0.003, 10);
        assert_eq!(steps % interval, 0);
        assert!(steps as f64 * 0.003 >= 1.0);
        assert_eq!(plan_steps(0.5, 1.0, 100), (1, 1));
    }

    #[test]
    fn sweep_keeps_order_and_shrinks_drift() {
        let bodies = vec![
            Body::new(1.0, Vector3::zeros(), Vector3::zeros()),
            Body::on_axis(1e-6, 1.0, 1.0),
        ];
        let dts = [0.02, 0.01, 0.005];
        let runs = timestep_sweep(
            &bodies,
            &SimulationConfig::new(1.0, 1.0),
            &dts,
            std::f64::consts::TAU,
            20,
            Integrator::Rk4,
        )
        .unwrap();
        assert_eq!(runs.len(), 3);
        for (run, dt) in runs.iter().zip(dts) {
            assert_eq!(run.dt, dt);
            assert_eq!(run.history.len(), run.steps / run.interval + 1);
        }
        assert!(runs[2].relative_energy_drift < runs[0].relative_energy_drift);
    }
}
