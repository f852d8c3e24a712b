use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use emleak::{ExecutionMode, SimulationConfig, SimulationController, SimulationReport};
use emleak_format::{
    RunSpec, Snapshot, export_run_spec, load_run_spec, load_snapshot, save_snapshot,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "FDTD electromagnetic leakage simulation with shielding remediation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation, analyze leakage and shield if it exceeds the threshold
    Run(RunArgs),

    /// Print the default run specification as JSON
    Template,
}

#[derive(Args)]
struct RunArgs {
    /// Run specification (JSON); built-in defaults are used when omitted
    #[arg(long, value_hint = ValueHint::FilePath)]
    spec: Option<PathBuf>,

    /// Cells per axis
    #[arg(long)]
    extent: Option<usize>,

    /// Steps per simulation pass
    #[arg(long)]
    steps: Option<usize>,

    /// Time step in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Grid spacing
    #[arg(long)]
    dx: Option<f64>,

    /// Leakage strictly above this triggers shielding
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum shield-then-rerun cycles
    #[arg(long)]
    max_remediations: Option<usize>,

    /// Update grid planes in parallel
    #[arg(long)]
    parallel: bool,

    /// Continue from a field checkpoint instead of the initial condition
    #[arg(long, value_hint = ValueHint::FilePath)]
    resume: Option<PathBuf>,

    /// Write the final fields to this checkpoint file
    #[arg(long, value_hint = ValueHint::FilePath)]
    checkpoint: Option<PathBuf>,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn run_spec(&self) -> Result<RunSpec> {
        let mut spec = match &self.spec {
            Some(path) => load_run_spec(path)
                .with_context(|| format!("failed to load run spec {}", path.display()))?,
            None => RunSpec::default(),
        };

        if let Some(extent) = self.extent {
            spec.grid.extent = extent;
        }
        if let Some(steps) = self.steps {
            spec.steps = steps;
        }
        if let Some(dt) = self.dt {
            spec.grid.dt = dt;
        }
        if let Some(dx) = self.dx {
            spec.grid.dx = dx;
        }
        if let Some(threshold) = self.threshold {
            spec.leakage_threshold = threshold;
        }
        if let Some(max) = self.max_remediations {
            spec.max_remediations = max;
        }
        if self.parallel {
            spec.execution = ExecutionMode::Parallel;
        }
        Ok(spec)
    }
}

fn init_tracing() {
    let ansi = std::io::stderr().is_terminal();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt_layer).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Template => {
            println!("{}", export_run_spec(&RunSpec::default())?);
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let spec = args.run_spec()?;
    let config = spec.to_config();
    info!(name = %spec.name, extent = config.extent, steps = config.steps, "starting run");

    let (mut controller, prior_steps) = match &args.resume {
        Some(path) => {
            let snapshot = load_snapshot(path)
                .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
            let step = snapshot.step;
            let volume = snapshot
                .into_volume()
                .with_context(|| format!("checkpoint {} is malformed", path.display()))?;
            (SimulationController::from_volume(config, volume)?, step)
        }
        None => (SimulationController::new(config)?, 0),
    };

    let report = controller.run().context("simulation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(controller.config(), &report);
    }

    if let Some(path) = &args.checkpoint {
        let snapshot = Snapshot::capture(controller.volume(), prior_steps + report.steps_executed);
        save_snapshot(path, &snapshot)
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        info!(path = %path.display(), "checkpoint written");
    }

    Ok(())
}

fn print_report(config: &SimulationConfig, report: &SimulationReport) {
    println!(
        "Grid {}^3, {} steps per pass, dt = {:e}, dx = {}",
        config.extent, config.steps, config.dt, config.dx
    );
    println!("Total EM leakage detected: {}", report.initial.leakage);
    for (pass, leak) in report.post_shielding.iter().enumerate() {
        println!("EM leakage after shielding ({}): {}", pass + 1, leak.leakage);
    }
    let verdict = if report.within_threshold() {
        "within"
    } else {
        "above"
    };
    println!(
        "Final leakage {} is {verdict} threshold {} ({} steps, {:.3}s)",
        report.final_leakage().leakage,
        report.threshold,
        report.steps_executed,
        report.elapsed.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "emleak",
            "run",
            "--extent",
            "24",
            "--steps",
            "25",
            "--threshold",
            "0.5",
            "--max-remediations",
            "2",
            "--parallel",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        let spec = args.run_spec().unwrap();
        assert_eq!(spec.grid.extent, 24);
        assert_eq!(spec.grid.dt, 1e-9);
        assert_eq!(spec.steps, 25);
        assert_eq!(spec.leakage_threshold, 0.5);
        assert_eq!(spec.max_remediations, 2);
        assert_eq!(spec.execution, ExecutionMode::Parallel);
        assert!(spec.to_config().validate().is_ok());
    }

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::parse_from(["emleak", "run"].into_iter().chain(argv.iter().copied()));
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        args
    }

    #[test]
    fn test_checkpoint_then_resume_carries_step_count() {
        let dir = std::env::temp_dir();
        let id = std::process::id();
        let first = dir.join(format!("emleak-cli-first-{id}.json"));
        let second = dir.join(format!("emleak-cli-second-{id}.json"));
        let (first_arg, second_arg) = (first.to_str().unwrap(), second.to_str().unwrap());

        run(run_args(&["--extent", "20", "--steps", "3", "--checkpoint", first_arg])).unwrap();
        let saved = load_snapshot(&first).unwrap();
        assert_eq!(saved.extent, 20);
        assert_eq!(saved.step, 3);

        run(run_args(&[
            "--extent", "20", "--steps", "4", "--resume", first_arg, "--checkpoint", second_arg,
        ]))
        .unwrap();
        let resumed = load_snapshot(&second).unwrap();
        assert_eq!(resumed.step, 3 + 4);

        // A checkpoint can only resume a run of the same extent.
        let err = run(run_args(&["--extent", "24", "--steps", "1", "--resume", first_arg]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("does not match configured extent"));

        std::fs::remove_file(&first).unwrap();
        std::fs::remove_file(&second).unwrap();
    }

    #[test]
    fn test_missing_spec_file_is_reported() {
        let cli = Cli::parse_from(["emleak", "run", "--spec", "/nonexistent/emleak.json"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        let err = args.run_spec().err().unwrap();
        assert!(err.to_string().contains("failed to load run spec"));
    }
}
