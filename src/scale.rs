// src/scale.rs

use crate::constants::{AU, M_EARTH, M_SUN, V_EARTH, YEAR_IN_S};
use crate::error::ConfigError;
use log::debug;
use nalgebra::Vector3;
use serde::Deserialize;

/// Largest accepted relative difference between the rescaled G and the
/// value implied by the reference orbit.
pub const GRAVITY_TOLERANCE: f64 = 1e-3;

/// Unit system used inside the integration kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    /// Integrate directly in whatever units the bodies are given in.
    #[default]
    None,
    /// Convert SI inputs to AU / year / reference-mass units.
    Natural,
}

/// Reference constants of the natural unit system, together with the
/// reference orbit used to cross-check the rescaled gravitational constant.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReferenceUnits {
    /// Unit of length (m)
    pub length: f64,
    /// Unit of time (s)
    pub time: f64,
    /// Unit of mass (kg), also the mass of the reference orbiter
    pub mass: f64,
    /// Circular speed of the reference orbiter (m/s)
    pub velocity: f64,
    /// Mass of the body the reference orbiter circles (kg)
    pub primary_mass: f64,
}

impl Default for ReferenceUnits {
    /// The Earth-Sun system: AU, Julian year, Earth mass.
    fn default() -> Self {
        ReferenceUnits {
            length: AU,
            time: YEAR_IN_S,
            mass: M_EARTH,
            velocity: V_EARTH,
            primary_mass: M_SUN,
        }
    }
}

impl ReferenceUnits {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("length", self.length),
            ("time", self.time),
            ("mass", self.mass),
            ("velocity", self.velocity),
            ("primary_mass", self.primary_mass),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidUnits(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// G expressed in these units, from the dimensional reduction of `g_si`.
    pub fn rescaled_gravity(&self, g_si: f64) -> f64 {
        g_si * self.length.powi(-3) * self.mass * self.time.powi(2)
    }

    /// G in these units implied by the reference orbit alone:
    /// `v^2 r = G M` with `r`, `v` and the orbiter mass all equal to one unit.
    pub fn orbital_gravity(&self) -> f64 {
        self.mass / self.primary_mass * (self.velocity * self.time / self.length).powi(2)
    }
}

/// Conversion between physical (SI) and natural units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScaling {
    pub units: ReferenceUnits,
    /// Gravitational constant in natural units
    pub g: f64,
}

impl UnitScaling {
    /// Builds the scaling and checks that the rescaled G agrees with the
    /// reference orbit within [`GRAVITY_TOLERANCE`].
    pub fn new(units: ReferenceUnits, g_si: f64) -> Result<Self, ConfigError> {
        units.validate()?;
        let derived = units.rescaled_gravity(g_si);
        let expected = units.orbital_gravity();
        debug!("G (rescaled): {derived:e}");
        debug!("G (from reference orbit): {expected:e}");
        let relative_error = ((derived - expected) / expected).abs();
        if !(relative_error <= GRAVITY_TOLERANCE) {
            return Err(ConfigError::InconsistentGravity {
                derived,
                expected,
                relative_error,
            });
        }
        Ok(UnitScaling { units, g: derived })
    }

    pub fn position_to_natural(&self, x: &Vector3<f64>) -> Vector3<f64> {
        x / self.units.length
    }

    pub fn position_to_physical(&self, x: &Vector3<f64>) -> Vector3<f64> {
        x * self.units.length
    }

    pub fn velocity_to_natural(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v * (self.units.time / self.units.length)
    }

    pub fn velocity_to_physical(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v * (self.units.length / self.units.time)
    }

    pub fn acceleration_to_physical(&self, a: &Vector3<f64>) -> Vector3<f64> {
        a * (self.units.length / self.units.time.powi(2))
    }

    pub fn mass_to_natural(&self, m: f64) -> f64 {
        m / self.units.mass
    }

    pub fn time_to_natural(&self, t: f64) -> f64 {
        t / self.units.time
    }

    pub fn time_to_physical(&self, t: f64) -> f64 {
        t * self.units.time
    }
}
