//! Simulation controller: run, analyze, shield, re-run.
//!
//! ```text
//! Idle -> Running -> Analyzing -> Done
//!                        |
//!                        +-> Remediating -> Running -> Analyzing -> ...
//! ```
//!
//! Remediation happens only when leakage is strictly above the threshold and
//! fewer than `max_remediations` shield-then-rerun cycles have been done. The
//! analysis after the last permitted cycle always ends the run.

use std::time::{Duration, Instant};

use emleak_em::{
    ConfigError, FieldUpdater, FieldVolume, LeakageAnalyzer, LeakageReport, ShieldingApplicator,
    ShieldingRegion, is_stable, stability_number,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::progress::{CancelToken, ProgressEvent, ProgressSink, TracingProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    Idle,
    Running,
    Analyzing,
    Remediating,
    Done,
    Cancelled,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Leakage after the first pass.
    pub initial: LeakageReport,
    /// Leakage after each shield-then-rerun cycle, in order.
    pub post_shielding: Vec<LeakageReport>,
    pub threshold: f64,
    /// Total steps executed across all passes.
    pub steps_executed: usize,
    pub elapsed: Duration,
    /// Σ ½(ε₀E² + B²/μ₀)·dx³ at the end of the run.
    pub field_energy: f64,
    /// Every state the controller entered, starting with `Idle`.
    pub history: Vec<ControllerState>,
}

impl SimulationReport {
    pub fn remediations(&self) -> usize {
        self.post_shielding.len()
    }

    /// The last analysis performed.
    pub fn final_leakage(&self) -> &LeakageReport {
        self.post_shielding.last().unwrap_or(&self.initial)
    }

    pub fn within_threshold(&self) -> bool {
        !self.final_leakage().exceeds(self.threshold)
    }
}

/// Owns the field volume for the lifetime of one simulation.
pub struct SimulationController {
    config: SimulationConfig,
    volume: FieldVolume,
    updater: FieldUpdater,
    analyzer: LeakageAnalyzer,
    shield: ShieldingApplicator,
    region: ShieldingRegion,
    progress: Box<dyn ProgressSink>,
    cancel: CancelToken,
    state: ControllerState,
    history: Vec<ControllerState>,
    steps_executed: usize,
}

impl SimulationController {
    /// Validate `config`, then allocate and seed a fresh volume.
    ///
    /// On error no volume exists, so no field array has been touched.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut volume = FieldVolume::new(config.extent)?;
        config.initial_condition.apply(&mut volume)?;
        for source in &config.current_sources {
            source.apply(&mut volume)?;
        }
        Self::assemble(config, volume)
    }

    /// Continue from an existing volume, e.g. one restored from a checkpoint.
    /// The initial condition and current sources of `config` are not applied.
    pub fn from_volume(config: SimulationConfig, volume: FieldVolume) -> Result<Self> {
        config.validate()?;
        if volume.extent() != config.extent {
            return Err(ConfigError::ExtentMismatch {
                configured: config.extent,
                volume: volume.extent(),
            }
            .into());
        }
        Self::assemble(config, volume)
    }

    fn assemble(config: SimulationConfig, volume: FieldVolume) -> Result<Self> {
        let shielding = config.shielding;
        let region = ShieldingRegion::new(
            shielding.region.origin,
            shielding.region.thickness,
            config.extent,
        )?;
        let shield = ShieldingApplicator::new(shielding.damping)?;

        if !is_stable(config.dt, config.dx) {
            warn!(
                stability = stability_number(config.dt, config.dx),
                "dt/dx exceeds the 3D Courant limit 1/sqrt(3); fields may grow without bound"
            );
        }

        Ok(Self {
            updater: FieldUpdater::new(config.execution),
            analyzer: LeakageAnalyzer::new(),
            shield,
            region,
            progress: Box::new(TracingProgress),
            cancel: CancelToken::new(),
            state: ControllerState::Idle,
            history: vec![ControllerState::Idle],
            steps_executed: 0,
            config,
            volume,
        })
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this controller's run between steps.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn volume(&self) -> &FieldVolume {
        &self.volume
    }

    pub fn into_volume(self) -> FieldVolume {
        self.volume
    }

    pub fn steps_executed(&self) -> usize {
        self.steps_executed
    }

    fn enter(&mut self, state: ControllerState) {
        debug!(from = ?self.state, to = ?state, "controller transition");
        self.state = state;
        self.history.push(state);
    }

    /// Drive the full run/analyze/remediate cycle once.
    pub fn run(&mut self) -> Result<SimulationReport> {
        if self.state != ControllerState::Idle {
            return Err(SimError::NotIdle(self.state));
        }
        let span = info_span!(
            "simulation",
            extent = self.config.extent,
            steps = self.config.steps
        );
        let _guard = span.enter();
        let started = Instant::now();
        let threshold = self.config.leakage_threshold;

        self.execute_pass(0)?;
        let initial = self.analyze();
        info!(leakage = initial.leakage, threshold, "total EM leakage detected");

        let mut post_shielding = Vec::new();
        let mut latest = initial;
        while post_shielding.len() < self.config.max_remediations && latest.exceeds(threshold) {
            let pass = post_shielding.len() + 1;
            self.enter(ControllerState::Remediating);
            let cells = self.shield.apply(&mut self.volume, &self.region)?;
            info!(
                pass,
                cells,
                origin = ?self.region.origin(),
                thickness = self.region.thickness(),
                damping = self.shield.damping(),
                "applied electromagnetic shielding"
            );

            self.execute_pass(pass)?;
            latest = self.analyze();
            info!(pass, leakage = latest.leakage, "EM leakage after shielding");
            post_shielding.push(latest);
        }

        self.enter(ControllerState::Done);
        let elapsed = started.elapsed();
        let field_energy = self.volume.field_energy(self.config.dx);
        info!(
            elapsed_s = elapsed.as_secs_f64(),
            steps = self.steps_executed,
            field_energy,
            "simulation finished"
        );

        Ok(SimulationReport {
            initial,
            post_shielding,
            threshold,
            steps_executed: self.steps_executed,
            elapsed,
            field_energy,
            history: self.history.clone(),
        })
    }

    fn analyze(&mut self) -> LeakageReport {
        self.enter(ControllerState::Analyzing);
        self.analyzer.analyze(&self.volume)
    }

    /// Execute `steps` full leapfrog steps, checking for cancellation before
    /// each one.
    fn execute_pass(&mut self, pass: usize) -> Result<()> {
        self.enter(ControllerState::Running);
        let total = self.config.steps;
        let interval = self.config.progress_interval();
        let (dt, dx) = (self.config.dt, self.config.dx);

        for completed in 1..=total {
            if self.cancel.is_cancelled() {
                self.enter(ControllerState::Cancelled);
                warn!(pass, completed_steps = self.steps_executed, "simulation cancelled");
                return Err(SimError::Cancelled {
                    completed_steps: self.steps_executed,
                });
            }
            self.updater.step(&mut self.volume, dt, dx);
            self.steps_executed += 1;

            if completed % interval == 0 {
                self.progress
                    .on_progress(&ProgressEvent::new(pass, completed, total));
            }
        }
        self.progress.on_pass_complete(pass, total);
        Ok(())
    }
}

/// Build a controller for `config` and run it with tracing progress.
pub fn simulate(config: SimulationConfig) -> Result<SimulationReport> {
    SimulationController::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShieldingConfig;
    use crate::progress::{NoProgress, ProgressLog};
    use emleak_em::{Cube, InitialCondition};

    fn config(initial_condition: InitialCondition) -> SimulationConfig {
        SimulationConfig {
            extent: 12,
            steps: 5,
            shielding: ShieldingConfig {
                region: Cube::new([0, 0, 0], 6),
                damping: 0.1,
            },
            initial_condition,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_quiet_volume_goes_straight_to_done() {
        let mut controller = SimulationController::new(config(InitialCondition::Zero))
            .unwrap()
            .with_progress(NoProgress);
        let report = controller.run().unwrap();

        assert_eq!(report.initial.leakage, 0.0);
        assert_eq!(report.remediations(), 0);
        assert_eq!(report.steps_executed, 5);
        assert_eq!(
            report.history,
            vec![
                ControllerState::Idle,
                ControllerState::Running,
                ControllerState::Analyzing,
                ControllerState::Done
            ]
        );
        assert_eq!(controller.state(), ControllerState::Done);
    }

    #[test]
    fn test_single_remediation_by_default() {
        let init = InitialCondition::Uniform {
            electric: 1.0,
            magnetic: 0.0,
        };
        let mut controller = SimulationController::new(config(init))
            .unwrap()
            .with_progress(NoProgress);
        let report = controller.run().unwrap();

        assert_eq!(report.remediations(), 1);
        assert_eq!(report.steps_executed, 10);
        assert!(report.final_leakage().leakage < report.initial.leakage);
        // Shielding only a corner still leaves leakage above 1.0; no second cycle.
        assert!(!report.within_threshold());
        assert_eq!(
            report.history,
            vec![
                ControllerState::Idle,
                ControllerState::Running,
                ControllerState::Analyzing,
                ControllerState::Remediating,
                ControllerState::Running,
                ControllerState::Analyzing,
                ControllerState::Done
            ]
        );
    }

    #[test]
    fn test_remediation_bound_is_configurable() {
        let cfg = SimulationConfig {
            max_remediations: 3,
            ..config(InitialCondition::Uniform {
                electric: 1.0,
                magnetic: 0.0,
            })
        };
        let report = simulate(cfg).unwrap();
        assert_eq!(report.remediations(), 3);
        let leaks: Vec<f64> = report.post_shielding.iter().map(|r| r.leakage).collect();
        assert!(leaks.windows(2).all(|w| w[1] < w[0]));

        let cfg = SimulationConfig {
            max_remediations: 0,
            ..config(InitialCondition::Uniform {
                electric: 1.0,
                magnetic: 0.0,
            })
        };
        let report = simulate(cfg).unwrap();
        assert_eq!(report.remediations(), 0);
        assert!(!report.within_threshold());
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let mut controller = SimulationController::new(config(InitialCondition::Zero))
            .unwrap()
            .with_progress(NoProgress);
        controller.run().unwrap();
        assert!(matches!(
            controller.run(),
            Err(SimError::NotIdle(ControllerState::Done))
        ));
    }

    #[test]
    fn test_invalid_config_builds_nothing() {
        let cfg = SimulationConfig {
            dx: 0.0,
            ..config(InitialCondition::Zero)
        };
        let err = SimulationController::new(cfg).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_volume_checks_extent() {
        let volume = FieldVolume::new(8).unwrap();
        let err = SimulationController::from_volume(config(InitialCondition::Zero), volume)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SimError::Em(emleak_em::EmError::Configuration(
                ConfigError::ExtentMismatch {
                    configured: 12,
                    volume: 8
                }
            ))
        ));
    }

    #[test]
    fn test_progress_every_step_when_fewer_than_ten() {
        let log = ProgressLog::new();
        let mut controller = SimulationController::new(config(InitialCondition::Zero))
            .unwrap()
            .with_progress(log.clone());
        controller.run().unwrap();

        let percents: Vec<usize> = log.events().iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![20, 40, 60, 80, 100]);
        assert_eq!(log.completed_passes(), vec![0]);
    }

    #[test]
    fn test_report_serializes() {
        let report = simulate(config(InitialCondition::Zero)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["initial"]["leakage"], 0.0);
        assert_eq!(json["steps_executed"], 5);
        assert_eq!(json["history"][3], "Done");
    }

    #[test]
    fn test_cancel_before_run() {
        let token = CancelToken::new();
        let mut controller = SimulationController::new(config(InitialCondition::Zero))
            .unwrap()
            .with_progress(NoProgress)
            .with_cancel_token(token.clone());
        token.cancel();

        let err = controller.run().unwrap_err();
        assert!(matches!(err, SimError::Cancelled { completed_steps: 0 }));
        assert_eq!(controller.state(), ControllerState::Cancelled);
        assert_eq!(controller.steps_executed(), 0);
    }
}
