//! emleak — electromagnetic leakage simulation with shielding remediation.
//!
//! This is the umbrella crate: it provides the [`SimulationController`] that
//! runs an FDTD volume, measures leakage through the boundary shell and, when
//! leakage exceeds a threshold, shields a region and re-runs. Core types from
//! `emleak-em` are re-exported.

pub use emleak_em::{
    self, Array3D, ConfigError, Cube, CurrentSource, EPSILON_0, EmError, ExecutionMode, Field,
    FieldUpdater, FieldVolume, InitialCondition, LeakageAnalyzer, LeakageReport, MU_0,
    ShieldingApplicator, ShieldingRegion, analyze_leakage, apply_shielding, is_stable,
    stability_number,
};

pub mod config;
pub mod controller;
pub mod error;
pub mod progress;

pub use config::{ShieldingConfig, SimulationConfig};
pub use controller::{ControllerState, SimulationController, SimulationReport, simulate};
pub use error::{Result, SimError};
pub use progress::{CancelToken, NoProgress, ProgressEvent, ProgressLog, ProgressSink, TracingProgress};
