// src/forces.rs

use crate::error::ConfigError;
use itertools::Itertools;
use nalgebra::Vector3;
use serde::Deserialize;

/// How the minimum distance used in the force law is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Softening {
    /// Fraction of the smallest pairwise separation of the initial configuration.
    Relative(f64),
    /// Fixed distance in the simulation's internal units.
    Absolute(f64),
}

impl Default for Softening {
    fn default() -> Self {
        Softening::Relative(1e-4)
    }
}

impl Softening {
    /// Floor for the given starting positions (internal units).
    pub fn min_distance(&self, positions: &[Vector3<f64>]) -> Result<f64, ConfigError> {
        match *self {
            Softening::Relative(fraction) if fraction.is_finite() && fraction >= 0.0 => {
                let closest = positions
                    .iter()
                    .tuple_combinations()
                    .map(|(a, b)| (a - b).norm())
                    .fold(f64::INFINITY, f64::min);
                Ok(if closest.is_finite() { fraction * closest } else { 0.0 })
            }
            Softening::Absolute(distance) if distance.is_finite() && distance >= 0.0 => {
                Ok(distance)
            }
            other => Err(ConfigError::InvalidSoftening(format!(
                "{other:?} must be finite and non-negative"
            ))),
        }
    }
}

/// Exact pairwise Newtonian gravity with a distance floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    pub g: f64,
    pub min_distance: f64,
}

impl ForceField {
    pub fn new(g: f64, min_distance: f64) -> Self {
        ForceField { g, min_distance }
    }

    /// Writes the acceleration of every body into `out`.
    ///
    /// The floor is applied to the separation before cubing, so the
    /// direction of the pull never flips. Self pairs are skipped rather than
    /// softened.
    pub fn accumulate(&self, positions: &[Vector3<f64>], masses: &[f64], out: &mut [Vector3<f64>]) {
        for (i, acc) in out.iter_mut().enumerate() {
            *acc = Vector3::zeros();
            for j in 0..positions.len() {
                if i == j {
                    continue;
                }
                let r_vec = positions[j] - positions[i];
                let r = r_vec.norm().max(self.min_distance);
                *acc += masses[j] * r_vec / (r * r * r);
            }
            *acc *= self.g;
        }
    }

    pub fn accelerations(&self, positions: &[Vector3<f64>], masses: &[f64]) -> Vec<Vector3<f64>> {
        let mut accelerations = vec![Vector3::zeros(); positions.len()];
        self.accumulate(positions, masses, &mut accelerations);
        accelerations
    }

    /// Softened pairwise potential energy, consistent with [`Self::accumulate`].
    pub fn potential_energy(&self, positions: &[Vector3<f64>], masses: &[f64]) -> f64 {
        (0..positions.len())
            .tuple_combinations()
            .map(|(i, j)| {
                let r = (positions[i] - positions[j]).norm().max(self.min_distance);
                -self.g * masses[i] * masses[j] / r
            })
            .sum()
    }
}
