//! Shielded enclosure: a driven current patch next to the boundary, with the
//! shield damping swept from weak to strong.

use emleak::{
    Cube, CurrentSource, InitialCondition, NoProgress, ShieldingConfig, SimulationConfig,
    SimulationController,
};

fn main() {
    let base = SimulationConfig {
        extent: 32,
        dt: 0.25,
        dx: 1.0,
        steps: 60,
        leakage_threshold: 1.0,
        initial_condition: InitialCondition::Noise {
            amplitude: 0.01,
            seed: 42,
        },
        current_sources: vec![CurrentSource::new([2, 12, 12], 6, 1.0e6)],
        ..SimulationConfig::default()
    };
    println!(
        "Grid {}^3, dt/dx = {:.3} (stable: {})\n",
        base.extent,
        emleak::stability_number(base.dt, base.dx),
        emleak::is_stable(base.dt, base.dx)
    );

    println!("{:>8} {:>14} {:>14} {:>8}", "damping", "before", "after", "ratio");
    for damping in [0.9, 0.5, 0.1, 0.0] {
        let config = SimulationConfig {
            shielding: ShieldingConfig {
                region: Cube::new([0, 8, 8], 16),
                damping,
            },
            ..base.clone()
        };
        let mut controller = match SimulationController::new(config) {
            Ok(controller) => controller.with_progress(NoProgress),
            Err(err) => {
                eprintln!("invalid configuration: {err}");
                return;
            }
        };
        match controller.run() {
            Ok(report) => {
                let before = report.initial.leakage;
                let after = report.final_leakage().leakage;
                println!(
                    "{damping:>8.2} {before:>14.6e} {after:>14.6e} {:>8.3}",
                    after / before
                );
            }
            Err(err) => eprintln!("run failed: {err}"),
        }
    }
}
