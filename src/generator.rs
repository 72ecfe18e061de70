// src/generator.rs

use crate::body::Body;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;

/// Parameters of a random star cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub n_bodies: usize,
    pub mass: f64,
    /// Positions are drawn from `[-extent, extent]^3`
    pub extent: f64,
    /// Velocities are drawn from `[-max_speed, max_speed]^3`
    pub max_speed: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        ClusterParams {
            n_bodies: 10,
            mass: 1.0,
            extent: 1.0,
            max_speed: 0.1,
        }
    }
}

fn random_vector<R: Rng>(rng: &mut R, range: &Uniform<f64>) -> Vector3<f64> {
    Vector3::new(rng.sample(range), rng.sample(range), rng.sample(range))
}

/// Generates a reproducible cluster of equal-mass bodies with random
/// positions, velocities and display colors.
pub fn random_cluster(params: &ClusterParams, seed: u64) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (Ok(position_range), Ok(velocity_range)) = (
        Uniform::new_inclusive(-params.extent, params.extent),
        Uniform::new_inclusive(-params.max_speed, params.max_speed),
    ) else {
        return Vec::new();
    };

    (0..params.n_bodies)
        .map(|i| {
            let position = random_vector(&mut rng, &position_range);
            let velocity = random_vector(&mut rng, &velocity_range);
            let color = [
                rng.random_range(100..=255),
                rng.random_range(100..=255),
                rng.random_range(100..=255),
            ];
            Body::new(params.mass, position, velocity)
                .with_name(format!("body{i}"))
                .with_radius(1.0)
                .with_color(color)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_respects_bounds() {
        let params = ClusterParams::default();
        let bodies = random_cluster(&params, 7);
        assert_eq!(bodies.len(), 10);
        for body in &bodies {
            assert!(body.position.iter().all(|c| c.abs() <= 1.0));
            assert!(body.velocity.iter().all(|c| c.abs() <= 0.1));
            assert!(body.color.iter().all(|&c| c >= 100));
            assert_eq!(body.mass, 1.0);
        }
    }

    #[test]
    fn same_seed_same_cluster() {
        let params = ClusterParams {
            n_bodies: 4,
            ..ClusterParams::default()
        };
        assert_eq!(random_cluster(&params, 3), random_cluster(&params, 3));
        assert_ne!(random_cluster(&params, 3), random_cluster(&params, 4));
    }

    #[test]
    fn invalid_range_yields_nothing() {
        let params = ClusterParams {
            extent: f64::NAN,
            ..ClusterParams::default()
        };
        assert!(random_cluster(&params, 1).is_empty());
    }
}
