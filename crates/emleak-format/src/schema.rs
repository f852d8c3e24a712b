//! Run specification schema and loader.

use std::path::Path;

use emleak::{ShieldingConfig, SimulationConfig};
use emleak_em::{Cube, CurrentSource, DEFAULT_DAMPING, ExecutionMode, InitialCondition};
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};

pub const FORMAT_VERSION: &str = "1";

/// Top-level run specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Format version.
    pub version: String,
    /// Run name, used only in logs and reports.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grid: GridSpec,
    /// Steps per simulation pass.
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_threshold")]
    pub leakage_threshold: f64,
    #[serde(default)]
    pub shielding: ShieldingSpec,
    #[serde(default = "default_max_remediations")]
    pub max_remediations: usize,
    #[serde(default)]
    pub initial_condition: InitialCondition,
    #[serde(default)]
    pub current_sources: Vec<CurrentSource>,
    #[serde(default)]
    pub execution: ExecutionMode,
    #[serde(default = "default_progress_divisions")]
    pub progress_divisions: usize,
}

/// Grid geometry and time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Cells per axis.
    #[serde(default = "default_extent")]
    pub extent: usize,
    /// Time step (s).
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Grid spacing.
    #[serde(default = "default_dx")]
    pub dx: f64,
}

/// Shielding cube and damping factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldingSpec {
    #[serde(default = "default_origin")]
    pub origin: [usize; 3],
    #[serde(default = "default_thickness")]
    pub thickness: usize,
    #[serde(default = "default_damping")]
    pub damping: f64,
}

fn default_extent() -> usize {
    100
}

fn default_dt() -> f64 {
    1e-9
}

fn default_dx() -> f64 {
    1.0
}

fn default_steps() -> usize {
    1000
}

fn default_threshold() -> f64 {
    1.0
}

fn default_max_remediations() -> usize {
    1
}

fn default_progress_divisions() -> usize {
    10
}

fn default_origin() -> [usize; 3] {
    [10, 10, 10]
}

fn default_thickness() -> usize {
    10
}

fn default_damping() -> f64 {
    DEFAULT_DAMPING
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            extent: default_extent(),
            dt: default_dt(),
            dx: default_dx(),
        }
    }
}

impl Default for ShieldingSpec {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            thickness: default_thickness(),
            damping: default_damping(),
        }
    }
}

impl Default for RunSpec {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            name: "default".to_string(),
            grid: GridSpec::default(),
            steps: default_steps(),
            leakage_threshold: default_threshold(),
            shielding: ShieldingSpec::default(),
            max_remediations: default_max_remediations(),
            initial_condition: InitialCondition::default(),
            current_sources: Vec::new(),
            execution: ExecutionMode::default(),
            progress_divisions: default_progress_divisions(),
        }
    }
}

impl RunSpec {
    /// Parse and check the version field.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: RunSpec = serde_json::from_str(json)?;

        if spec.version.is_empty() {
            return Err(FormatError::MissingField("version".to_string()));
        }
        if spec.version != FORMAT_VERSION {
            return Err(FormatError::InvalidFormat(format!(
                "unsupported run spec version {:?} (expected {FORMAT_VERSION:?})",
                spec.version
            )));
        }

        Ok(spec)
    }

    /// Convert into the controller configuration. Values are not validated
    /// here; the controller does that before allocating anything.
    pub fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            extent: self.grid.extent,
            dt: self.grid.dt,
            dx: self.grid.dx,
            steps: self.steps,
            leakage_threshold: self.leakage_threshold,
            shielding: ShieldingConfig {
                region: Cube::new(self.shielding.origin, self.shielding.thickness),
                damping: self.shielding.damping,
            },
            max_remediations: self.max_remediations,
            initial_condition: self.initial_condition.clone(),
            current_sources: self.current_sources.clone(),
            execution: self.execution,
            progress_divisions: self.progress_divisions,
        }
    }
}

/// Load a run spec from file.
pub fn load_run_spec(path: impl AsRef<Path>) -> Result<RunSpec> {
    let json = std::fs::read_to_string(path)?;
    RunSpec::from_json_str(&json)
}

/// Save a run spec to file.
pub fn save_run_spec(path: impl AsRef<Path>, spec: &RunSpec) -> Result<()> {
    std::fs::write(path, export_run_spec(spec)?)?;
    Ok(())
}

/// Export a run spec to a pretty-printed JSON string.
pub fn export_run_spec(spec: &RunSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}
