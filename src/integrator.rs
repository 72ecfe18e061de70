use crate::error::ConfigError;
use crate::forces::ForceField;
use itertools::izip;
use nalgebra::Vector3;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Live kinematic arrays, index-aligned with the body list.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub accelerations: Vec<Vector3<f64>>,
}

impl PhaseState {
    pub fn new(positions: Vec<Vector3<f64>>, velocities: Vec<Vector3<f64>>) -> Self {
        let accelerations = vec![Vector3::zeros(); positions.len()];
        PhaseState {
            positions,
            velocities,
            accelerations,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index of the first body with a non-finite position or velocity.
    pub fn first_non_finite(&self) -> Option<usize> {
        izip!(&self.positions, &self.velocities).position(|(x, v)| {
            !(x.iter().all(|c| c.is_finite()) && v.iter().all(|c| c.is_finite()))
        })
    }
}

/// Fixed-step time integration scheme, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integrator {
    /// Semi-implicit Euler: kick with the current acceleration, then drift
    /// with the updated velocity. First order, one force evaluation.
    #[default]
    Symplectic,
    /// Classical fourth-order Runge-Kutta, four force evaluations.
    Rk4,
}

impl Integrator {
    pub fn name(&self) -> &'static str {
        match self {
            Integrator::Symplectic => "symplectic",
            Integrator::Rk4 => "rk4",
        }
    }

    /// Advances `state` by one step of length `dt` in place.
    pub fn step(&self, state: &mut PhaseState, masses: &[f64], field: &ForceField, dt: f64) {
        match self {
            Integrator::Symplectic => symplectic_step(state, masses, field, dt),
            Integrator::Rk4 => rk4_step(state, masses, field, dt),
        }
    }

    pub fn advance(
        &self,
        state: &mut PhaseState,
        masses: &[f64],
        field: &ForceField,
        dt: f64,
        n_steps: usize,
    ) {
        for _ in 0..n_steps {
            self.step(state, masses, field, dt);
        }
    }
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Integrator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symplectic" | "iterate" => Ok(Integrator::Symplectic),
            "rk4" | "iterate_rk4" => Ok(Integrator::Rk4),
            _ => Err(ConfigError::UnknownIntegrator(s.to_string())),
        }
    }
}

fn symplectic_step(state: &mut PhaseState, masses: &[f64], field: &ForceField, dt: f64) {
    field.accumulate(&state.positions, masses, &mut state.accelerations);
    for (x, v, a) in izip!(
        state.positions.iter_mut(),
        state.velocities.iter_mut(),
        &state.accelerations
    ) {
        *v += dt * a;
        *x += dt * *v;
    }
}

/// Leaves the weighted stage average in `state.accelerations`, i.e. the
/// mean acceleration actually applied over the step.
fn rk4_step(state: &mut PhaseState, masses: &[f64], field: &ForceField, dt: f64) {
    let h2 = dt / 2.0;
    let h6 = dt / 6.0;
    let pos0 = &state.positions;
    let vel0 = &state.velocities;

    // k1
    let a1 = field.accelerations(pos0, masses);

    // k2
    let pos_k2: Vec<_> = izip!(pos0, vel0).map(|(p, v)| p + h2 * v).collect();
    let vel_k2: Vec<_> = izip!(vel0, &a1).map(|(v, a)| v + h2 * a).collect();
    let a2 = field.accelerations(&pos_k2, masses);

    // k3
    let pos_k3: Vec<_> = izip!(pos0, &vel_k2).map(|(p, v)| p + h2 * v).collect();
    let vel_k3: Vec<_> = izip!(vel0, &a2).map(|(v, a)| v + h2 * a).collect();
    let a3 = field.accelerations(&pos_k3, masses);

    // k4
    let pos_k4: Vec<_> = izip!(pos0, &vel_k3).map(|(p, v)| p + dt * v).collect();
    let vel_k4: Vec<_> = izip!(vel0, &a3).map(|(v, a)| v + dt * a).collect();
    let a4 = field.accelerations(&pos_k4, masses);

    let positions: Vec<_> = izip!(pos0, vel0, &vel_k2, &vel_k3, &vel_k4)
        .map(|(p, k1, k2, k3, k4)| p + h6 * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
        .collect();
    let mean_accel: Vec<_> = izip!(&a1, &a2, &a3, &a4)
        .map(|(k1, k2, k3, k4)| (k1 + 2.0 * k2 + 2.0 * k3 + k4) / 6.0)
        .collect();
    for (v, a) in state.velocities.iter_mut().zip(&mean_accel) {
        *v += dt * a;
    }
    state.positions = positions;
    state.accelerations = mean_accel;
}
