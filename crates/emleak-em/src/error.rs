//! Error types for emleak-em.

use thiserror::Error;

/// Invalid static parameters, detected before any simulation work begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid extent {0} is too small (need at least 3 cells per axis)")]
    GridTooSmall(usize),

    #[error("grid extent {0} is too large: {0}³ cells cannot be addressed")]
    GridTooLarge(usize),

    #[error("time step must be positive and finite, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("grid spacing must be positive and finite, got {0}")]
    NonPositiveSpacing(f64),

    #[error("step count must be positive")]
    ZeroSteps,

    #[error("leakage threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("region thickness must be at least one cell")]
    EmptyRegion,

    #[error("region at {origin:?} with thickness {thickness} exceeds grid extent {extent}")]
    RegionOutOfBounds {
        origin: [usize; 3],
        thickness: usize,
        extent: usize,
    },

    #[error("damping factor must lie in [0, 1), got {0}")]
    InvalidDamping(f64),

    #[error("progress divisions must be positive")]
    ZeroProgressDivisions,

    #[error("invalid initial condition: {0}")]
    InvalidInitialCondition(String),

    #[error("volume extent {volume} does not match configured extent {configured}")]
    ExtentMismatch { configured: usize, volume: usize },
}

#[derive(Debug, Error)]
pub enum EmError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("cell ({i}, {j}, {k}) is outside a grid of extent {extent}")]
    IndexOutOfBounds {
        i: usize,
        j: usize,
        k: usize,
        extent: usize,
    },

    #[error("{field} buffer holds {actual} values, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl EmError {
    /// True for errors raised by parameter validation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, EmError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, EmError>;
