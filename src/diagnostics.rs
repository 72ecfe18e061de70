// src/diagnostics.rs

use crate::error::ConfigError;
use crate::forces::ForceField;
use crate::simulation::Snapshot;
use itertools::izip;
use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Relative energy drifts tracked by default.
pub const DEFAULT_ENERGY_THRESHOLDS: [f64; 10] =
    [1e-6, 1e-5, 1e-4, 1e-3, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0];

pub fn total_momentum(masses: &[f64], velocities: &[Vector3<f64>]) -> Vector3<f64> {
    izip!(masses, velocities).map(|(&m, v)| m * v).sum()
}

pub fn angular_momentum(
    masses: &[f64],
    positions: &[Vector3<f64>],
    velocities: &[Vector3<f64>],
) -> Vector3<f64> {
    izip!(masses, positions, velocities)
        .map(|(&m, x, v)| m * x.cross(v))
        .sum()
}

pub fn center_of_mass(masses: &[f64], positions: &[Vector3<f64>]) -> Vector3<f64> {
    crate::frame::mass_weighted_mean(masses, positions)
}

pub fn kinetic_energy(masses: &[f64], velocities: &[Vector3<f64>]) -> f64 {
    izip!(masses, velocities)
        .map(|(&m, v)| 0.5 * m * v.norm_squared())
        .sum()
}

pub fn total_energy(
    field: &ForceField,
    masses: &[f64],
    positions: &[Vector3<f64>],
    velocities: &[Vector3<f64>],
) -> f64 {
    kinetic_energy(masses, velocities) + field.potential_energy(positions, masses)
}

/// Remembers, for each relative drift threshold, the fraction of the run at
/// which the total energy first left the band `E0 * (1 ± t)`. A system
/// starting at exactly zero energy is measured by absolute drift instead.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMonitor {
    initial_energy: f64,
    crossings: BTreeMap<OrderedFloat<f64>, Option<f64>>,
}

impl EnergyMonitor {
    pub fn new(initial_energy: f64, thresholds: &[f64]) -> Self {
        let crossings = thresholds
            .iter()
            .map(|&t| (OrderedFloat(t), None))
            .collect();
        EnergyMonitor {
            initial_energy,
            crossings,
        }
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    /// `|E - E0| / |E0|`, or the absolute drift when `E0` is exactly zero.
    pub fn relative_drift(&self, energy: f64) -> f64 {
        let drift = (energy - self.initial_energy).abs();
        if self.initial_energy == 0.0 {
            drift
        } else {
            drift / self.initial_energy.abs()
        }
    }

    pub fn record(&mut self, energy: f64, fraction: f64) {
        let drift = self.relative_drift(energy);
        for (threshold, crossing) in self.crossings.iter_mut() {
            if crossing.is_none() && !(drift <= threshold.into_inner()) {
                *crossing = Some(fraction);
            }
        }
    }

    /// First crossing fraction of `threshold`, if it was tracked and crossed.
    pub fn crossing(&self, threshold: f64) -> Option<f64> {
        self.crossings.get(&OrderedFloat(threshold)).copied().flatten()
    }

    /// `(threshold, first crossing)` pairs in ascending threshold order.
    pub fn crossings(&self) -> Vec<(f64, Option<f64>)> {
        self.crossings
            .iter()
            .map(|(k, v)| (k.into_inner(), *v))
            .collect()
    }
}

/// Per-snapshot RMS distance between the bodies of two histories.
pub fn trajectory_deviance(a: &[Snapshot], b: &[Snapshot]) -> Result<Vec<f64>, ConfigError> {
    if a.len() != b.len() {
        return Err(ConfigError::HistoryMismatch(format!(
            "{} vs {} snapshots",
            a.len(),
            b.len()
        )));
    }
    izip!(a, b)
        .map(|(s1, s2)| {
            if s1.positions.len() != s2.positions.len() {
                return Err(ConfigError::HistoryMismatch(format!(
                    "{} vs {} bodies",
                    s1.positions.len(),
                    s2.positions.len()
                )));
            }
            let n = s1.positions.len().max(1) as f64;
            let sum_sq: f64 = izip!(&s1.positions, &s2.positions)
                .map(|(p1, p2)| (p1 - p2).norm_squared())
                .sum();
            Ok((sum_sq / n).sqrt())
        })
        .collect()
}
