//! Static parameters of one simulation run.

use emleak_em::{
    ConfigError, Cube, CurrentSource, DEFAULT_DAMPING, ExecutionMode, InitialCondition,
    validate_damping, validate_extent,
};
use serde::{Deserialize, Serialize};

/// Region damped when leakage exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldingConfig {
    pub region: Cube,
    /// Fraction of E and B kept inside the region, in `[0, 1)`.
    pub damping: f64,
}

impl Default for ShieldingConfig {
    fn default() -> Self {
        Self {
            region: Cube::new([10, 10, 10], 10),
            damping: DEFAULT_DAMPING,
        }
    }
}

/// Everything the controller needs, validated as a whole before any field
/// array is allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid extent N (cells per axis).
    pub extent: usize,
    /// Time step (s).
    pub dt: f64,
    /// Grid spacing.
    pub dx: f64,
    /// Steps per simulation pass.
    pub steps: usize,
    /// Leakage strictly above this triggers remediation.
    pub leakage_threshold: f64,
    pub shielding: ShieldingConfig,
    /// Shield-then-rerun cycles allowed. The analysis after the last one is
    /// final regardless of the leakage it reports.
    pub max_remediations: usize,
    pub initial_condition: InitialCondition,
    pub current_sources: Vec<CurrentSource>,
    pub execution: ExecutionMode,
    /// Progress is reported every `steps / progress_divisions` steps (at
    /// least every step).
    pub progress_divisions: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            extent: 100,
            dt: 1e-9,
            dx: 1.0,
            steps: 1000,
            leakage_threshold: 1.0,
            shielding: ShieldingConfig::default(),
            max_remediations: 1,
            initial_condition: InitialCondition::Zero,
            current_sources: Vec::new(),
            execution: ExecutionMode::Sequential,
            progress_divisions: 10,
        }
    }
}

impl SimulationConfig {
    /// Check every parameter. Nothing is allocated or mutated here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_extent(self.extent)?;
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::NonPositiveTimeStep(self.dt));
        }
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return Err(ConfigError::NonPositiveSpacing(self.dx));
        }
        if self.steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if !(self.leakage_threshold.is_finite() && self.leakage_threshold >= 0.0) {
            return Err(ConfigError::InvalidThreshold(self.leakage_threshold));
        }
        self.shielding.region.validate(self.extent)?;
        validate_damping(self.shielding.damping)?;
        if self.progress_divisions == 0 {
            return Err(ConfigError::ZeroProgressDivisions);
        }
        self.initial_condition.validate(self.extent)?;
        for source in &self.current_sources {
            source.validate(self.extent)?;
        }
        Ok(())
    }

    /// Steps between progress notifications, never zero.
    pub fn progress_interval(&self) -> usize {
        (self.steps / self.progress_divisions.max(1)).max(1)
    }
}
