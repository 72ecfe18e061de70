// src/frame.rs

use itertools::izip;
use nalgebra::Vector3;

/// Mass-weighted mean of `values`.
pub fn mass_weighted_mean(masses: &[f64], values: &[Vector3<f64>]) -> Vector3<f64> {
    let total_mass: f64 = masses.iter().sum();
    let weighted: Vector3<f64> = izip!(masses, values).map(|(&m, v)| m * v).sum();
    weighted / total_mass
}

/// Re-expresses positions and velocities in the center-of-momentum frame:
/// the centroid moves to the origin and the total momentum becomes zero.
pub fn to_center_of_momentum(
    masses: &[f64],
    positions: &[Vector3<f64>],
    velocities: &[Vector3<f64>],
) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>) {
    let drift = mass_weighted_mean(masses, velocities);
    let centroid = mass_weighted_mean(masses, positions);
    let positions = positions.iter().map(|x| x - centroid).collect();
    let velocities = velocities.iter().map(|v| v - drift).collect();
    (positions, velocities)
}
