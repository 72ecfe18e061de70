use thiserror::Error;

/// Problems with the inputs of a simulation. These are always detected
/// before any state is mutated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("steps ({steps}) must be a multiple of the snapshot interval ({interval})")]
    StepsNotMultiple { steps: usize, interval: usize },

    #[error("snapshot interval must be at least 1")]
    ZeroInterval,

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error(
        "rescaled G ({derived:e}) does not match the value implied by the reference system \
         ({expected:e}), relative error {relative_error:.3e}"
    )]
    InconsistentGravity {
        derived: f64,
        expected: f64,
        relative_error: f64,
    },

    #[error("invalid reference units: {0}")]
    InvalidUnits(String),

    #[error("invalid softening: {0}")]
    InvalidSoftening(String),

    #[error("no bodies to simulate")]
    NoBodies,

    #[error("body {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },

    #[error("duplicate body name `{0}`")]
    DuplicateName(String),

    #[error("body `{body}` references unknown body `{reference}`")]
    UnknownReference { body: String, reference: String },

    #[error("cyclic reference chain through body `{0}`")]
    CyclicReference(String),

    #[error("unknown integrator `{0}`, expected `symplectic` or `rk4`")]
    UnknownIntegrator(String),

    #[error("histories differ in shape: {0}")]
    HistoryMismatch(String),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("non-finite state for body {body} after batch {batch}")]
    NumericalDegeneracy { batch: usize, body: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, SimulationError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
