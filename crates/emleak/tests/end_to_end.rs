//! End-to-end runs of the simulation controller.

use approx::assert_relative_eq;
use emleak::{
    CancelToken, ControllerState, Cube, CurrentSource, ExecutionMode, Field, FieldVolume,
    InitialCondition, NoProgress, ProgressEvent, ProgressLog, ProgressSink, ShieldingConfig,
    SimError, SimulationConfig, SimulationController, SimulationReport, simulate,
};

/// 12³ grid, 5 steps, dt = 1e-9, threshold 1.0.
fn small(initial_condition: InitialCondition) -> SimulationConfig {
    SimulationConfig {
        extent: 12,
        steps: 5,
        shielding: ShieldingConfig {
            region: Cube::new([0, 0, 0], 12),
            damping: 0.1,
        },
        initial_condition,
        ..SimulationConfig::default()
    }
}

fn uniform(electric: f64) -> InitialCondition {
    InitialCondition::Uniform {
        electric,
        magnetic: 0.0,
    }
}

fn run_quiet(config: SimulationConfig) -> emleak::Result<(SimulationReport, FieldVolume)> {
    let mut controller = SimulationController::new(config)?.with_progress(NoProgress);
    let report = controller.run()?;
    Ok((report, controller.into_volume()))
}

#[test]
fn test_zero_fields_never_leak() {
    let (report, volume) = run_quiet(small(InitialCondition::Zero)).unwrap();

    assert_eq!(report.initial.leakage, 0.0);
    assert_eq!(report.remediations(), 0);
    assert!(report.within_threshold());
    assert_eq!(report.field_energy, 0.0);
    assert_eq!(volume.grid(Field::Electric).max_abs(), 0.0);
}

#[test]
fn test_interior_seed_does_not_reach_shell_in_one_step() {
    let config = SimulationConfig {
        steps: 1,
        ..small(InitialCondition::Point {
            cell: [6, 6, 6],
            electric: 1.0,
        })
    };
    let (report, volume) = run_quiet(config).unwrap();

    assert_eq!(report.initial.leakage, 0.0);
    assert_eq!(report.remediations(), 0);
    // B picks up the seed at the four in-plane neighbours.
    assert!(volume.magnetic(6, 7, 6).unwrap().abs() > 0.0);
    assert_eq!(volume.magnetic(6, 6, 7), Some(0.0));
}

#[test]
fn test_boundary_seed_counts_as_leakage() {
    let config = small(InitialCondition::Point {
        cell: [0, 6, 6],
        electric: -0.75,
    });
    let (report, _) = run_quiet(config).unwrap();
    assert_relative_eq!(report.initial.leakage, 0.75);
    assert_eq!(report.initial.cells_scanned, 12 * 12 * 12 - 10 * 10 * 10);
}

#[test]
fn test_remediation_strictly_lowers_leakage() {
    let (report, _) = run_quiet(small(uniform(1.0))).unwrap();

    // Boundary cells are never written by the stencil, so only shielding moves them.
    assert_relative_eq!(report.initial.leakage, 728.0, epsilon = 1e-9);
    assert_eq!(report.remediations(), 1);
    assert_relative_eq!(report.final_leakage().leakage, 72.8, epsilon = 1e-9);
    assert!(report.final_leakage().leakage < report.initial.leakage);
    assert_eq!(report.steps_executed, 10);
}

#[test]
fn test_bounded_retries_stop_below_threshold() {
    let config = SimulationConfig {
        max_remediations: 10,
        ..small(uniform(1.0))
    };
    let (report, _) = run_quiet(config).unwrap();

    // 728 -> 72.8 -> 7.28 -> 0.728
    assert_eq!(report.remediations(), 3);
    assert!(report.within_threshold());
    assert_relative_eq!(report.final_leakage().leakage, 0.728, epsilon = 1e-9);
    assert_eq!(*report.history.last().unwrap(), ControllerState::Done);
}

#[test]
fn test_no_remediation_when_disabled() {
    let config = SimulationConfig {
        max_remediations: 0,
        ..small(uniform(1.0))
    };
    let (report, _) = run_quiet(config).unwrap();
    assert_eq!(report.remediations(), 0);
    assert_eq!(report.steps_executed, 5);
    assert!(!report.within_threshold());
}

#[test]
fn test_leakage_equal_to_threshold_is_not_remediated() {
    let config = SimulationConfig {
        leakage_threshold: 728.0,
        ..small(uniform(1.0))
    };
    let (report, _) = run_quiet(config).unwrap();
    assert_eq!(report.remediations(), 0);
    assert!(report.within_threshold());
}

#[test]
fn test_invalid_configuration_refuses_run() {
    let bad = [
        SimulationConfig {
            extent: 2,
            ..small(InitialCondition::Zero)
        },
        SimulationConfig {
            dt: -1e-9,
            ..small(InitialCondition::Zero)
        },
        SimulationConfig {
            shielding: ShieldingConfig {
                region: Cube::new([8, 8, 8], 5),
                damping: 0.1,
            },
            ..small(InitialCondition::Zero)
        },
        SimulationConfig {
            shielding: ShieldingConfig {
                region: Cube::new([0, 0, 0], 0),
                damping: 0.1,
            },
            ..small(InitialCondition::Zero)
        },
    ];
    for config in bad {
        let err = simulate(config).unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err}");
    }
}

#[test]
fn test_progress_notifications() {
    let log = ProgressLog::new();
    let config = SimulationConfig {
        steps: 30,
        ..small(uniform(1.0))
    };
    let mut controller = SimulationController::new(config)
        .unwrap()
        .with_progress(log.clone());
    controller.run().unwrap();

    let events = log.events();
    // Two passes, every 3 steps each.
    assert_eq!(events.len(), 20);
    assert_eq!(events[0], ProgressEvent::new(0, 3, 30));
    assert_eq!(events[9].percent, 100);
    assert_eq!(events[10].pass, 1);
    assert_eq!(log.completed_passes(), vec![0, 1]);
}

#[test]
fn test_progress_with_steps_not_divisible_by_divisions() {
    let log = ProgressLog::new();
    let config = SimulationConfig {
        steps: 25,
        ..small(InitialCondition::Zero)
    };
    let mut controller = SimulationController::new(config)
        .unwrap()
        .with_progress(log.clone());
    controller.run().unwrap();

    let completed: Vec<usize> = log.events().iter().map(|e| e.completed).collect();
    assert_eq!(completed, (2..=24).step_by(2).collect::<Vec<_>>());
    assert_eq!(log.completed_passes(), vec![0]);
}

/// Cancels the run once `after` steps of the first pass have completed.
struct CancelAfter {
    token: CancelToken,
    after: usize,
}

impl ProgressSink for CancelAfter {
    fn on_progress(&mut self, event: &ProgressEvent) {
        if event.completed >= self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancellation_between_steps() {
    let token = CancelToken::new();
    let mut controller = SimulationController::new(small(uniform(1.0)))
        .unwrap()
        .with_cancel_token(token.clone())
        .with_progress(CancelAfter { token, after: 2 });

    match controller.run() {
        Err(SimError::Cancelled { completed_steps }) => assert_eq!(completed_steps, 2),
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert_eq!(controller.state(), ControllerState::Cancelled);
    assert_eq!(controller.steps_executed(), 2);
    assert!(controller.cancel_token().is_cancelled());
    assert!(matches!(
        controller.run(),
        Err(SimError::NotIdle(ControllerState::Cancelled))
    ));
}

#[test]
fn test_parallel_matches_sequential() {
    let base = SimulationConfig {
        steps: 20,
        initial_condition: InitialCondition::Noise {
            amplitude: 1.0,
            seed: 7,
        },
        current_sources: vec![CurrentSource::new([4, 4, 4], 3, 0.5)],
        shielding: ShieldingConfig {
            region: Cube::new([2, 2, 2], 6),
            damping: 0.1,
        },
        ..small(InitialCondition::Zero)
    };
    let parallel = SimulationConfig {
        execution: ExecutionMode::Parallel,
        ..base.clone()
    };

    let (seq_report, seq_volume) = run_quiet(base).unwrap();
    let (par_report, par_volume) = run_quiet(parallel).unwrap();

    assert_eq!(seq_volume, par_volume);
    assert_eq!(seq_report.initial, par_report.initial);
    assert_eq!(seq_report.post_shielding, par_report.post_shielding);
}
