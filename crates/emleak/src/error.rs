//! Error types for the simulation controller.

use emleak_em::{ConfigError, EmError};
use thiserror::Error;

use crate::controller::ControllerState;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Em(#[from] EmError),

    #[error("simulation cancelled after {completed_steps} steps")]
    Cancelled { completed_steps: usize },

    #[error("controller is {0:?}; a run can only start from Idle")]
    NotIdle(ControllerState),
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::Em(EmError::Configuration(err))
    }
}

impl SimError {
    /// True when the run was refused because of invalid parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SimError::Em(err) if err.is_configuration())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
