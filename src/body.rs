// src/body.rs

use crate::error::ConfigError;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// A point mass in physical units (m, m/s, kg).
///
/// Radius, color and known period are carried for viewers and analysis
/// tools; the integration kernel only reads position, velocity and mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: Option<String>,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub mass: f64,
    pub radius: f64,
    pub color: [u8; 3],
    /// Orbital period in years, used only as a validation reference.
    pub known_period: Option<f64>,
}

impl Body {
    pub fn new(mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Body {
            name: None,
            position,
            velocity,
            mass,
            radius: 0.0,
            color: [0, 0, 0],
            known_period: None,
        }
    }

    /// Body at distance `x` on the x-axis moving with speed `v` along y,
    /// the usual starting point of a circular orbit.
    pub fn on_axis(mass: f64, x: f64, v: f64) -> Self {
        Body::new(mass, Vector3::new(x, 0.0, 0.0), Vector3::new(0.0, v, 0.0))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.known_period = Some(period);
        self
    }

    /// Reinterprets this body's position and velocity as relative to
    /// `reference` and returns the absolute body. No link is kept.
    pub fn relative_to(mut self, reference: &Body) -> Self {
        self.position += reference.position;
        self.velocity += reference.velocity;
        self
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(m={:.3e}, x=[{:.3e}, {:.3e}, {:.3e}], v=[{:.3e}, {:.3e}, {:.3e}])",
            self.label(),
            self.mass,
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z
        )
    }
}

/// Either a full 3-vector or a scalar shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VectorSpec {
    Scalar(f64),
    Vector([f64; 3]),
}

impl VectorSpec {
    /// A scalar position lies on the x-axis.
    pub fn as_position(&self) -> Vector3<f64> {
        match *self {
            VectorSpec::Scalar(x) => Vector3::new(x, 0.0, 0.0),
            VectorSpec::Vector(v) => Vector3::from(v),
        }
    }

    /// A scalar velocity points along y.
    pub fn as_velocity(&self) -> Vector3<f64> {
        match *self {
            VectorSpec::Scalar(v) => Vector3::new(0.0, v, 0.0),
            VectorSpec::Vector(v) => Vector3::from(v),
        }
    }
}

impl Default for VectorSpec {
    fn default() -> Self {
        VectorSpec::Scalar(0.0)
    }
}

/// Declarative description of a body, possibly relative to another named
/// body of the same list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BodySpec {
    pub name: String,
    #[serde(default)]
    pub position: VectorSpec,
    #[serde(default)]
    pub velocity: VectorSpec,
    pub mass: f64,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub color: [u8; 3],
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub period: Option<f64>,
}

impl BodySpec {
    fn to_local_body(&self) -> Body {
        let mut body = Body::new(
            self.mass,
            self.position.as_position(),
            self.velocity.as_velocity(),
        )
        .with_name(self.name.clone())
        .with_radius(self.radius)
        .with_color(self.color);
        body.known_period = self.period;
        body
    }
}

/// Builds absolute bodies from specs whose references may point anywhere in
/// the list. The result is index-aligned with `specs`.
pub fn resolve_bodies(specs: &[BodySpec]) -> Result<Vec<Body>, ConfigError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        if index.insert(spec.name.as_str(), i).is_some() {
            return Err(ConfigError::DuplicateName(spec.name.clone()));
        }
    }

    let lookup = |spec: &BodySpec, reference: &str| {
        index
            .get(reference)
            .copied()
            .ok_or_else(|| ConfigError::UnknownReference {
                body: spec.name.clone(),
                reference: reference.to_string(),
            })
    };

    let mut resolved: Vec<Option<Body>> = vec![None; specs.len()];
    for start in 0..specs.len() {
        // Walk up the reference chain until a root or an already resolved body.
        let mut chain = Vec::new();
        let mut current = start;
        while resolved[current].is_none() {
            if chain.contains(&current) {
                return Err(ConfigError::CyclicReference(specs[current].name.clone()));
            }
            chain.push(current);
            match specs[current].reference.as_deref() {
                Some(reference) => current = lookup(&specs[current], reference)?,
                None => break,
            }
        }

        for &i in chain.iter().rev() {
            let local = specs[i].to_local_body();
            let body = match specs[i].reference.as_deref() {
                None => local,
                Some(reference) => {
                    let parent = lookup(&specs[i], reference)?;
                    match &resolved[parent] {
                        Some(parent) => local.relative_to(parent),
                        None => return Err(ConfigError::CyclicReference(specs[i].name.clone())),
                    }
                }
            };
            resolved[i] = Some(body);
        }
    }

    Ok(resolved.into_iter().flatten().collect())
}
