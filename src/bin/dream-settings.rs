//! Inspect and generate settings files, and post-process output files
//!
//! Usage: `dream-settings <check|example|current> ...`

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Context;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dream_settings::output::Integral;
use dream_settings::settings::parameter::{ParameterKind, ParameterMode};
use dream_settings::settings::solver::{LinearSolver, Solver, Strategy};
use dream_settings::settings::time_stepper::StepResolution;
use dream_settings::{Output, Settings};

#[derive(Parser, Debug)]
#[command(name = "dream-settings")]
#[command(about = "Build, check and post-process DREAM interchange files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate a settings file, then print a summary
    Check {
        /// Settings file
        settings: PathBuf,
    },
    /// Write a small runnable settings file
    Example {
        /// Destination of the settings file
        out: PathBuf,

        /// Solver strategy
        #[arg(long, value_enum, default_value_t = Strategy::LinearImplicit)]
        strategy: Strategy,

        /// Linear solver used by the strategy
        #[arg(long, value_enum, default_value_t = LinearSolver::Lu)]
        linear_solver: LinearSolver,

        /// Maximum number of nonlinear iterations
        #[arg(long, default_value = "100")]
        maxiter: u32,

        /// Relative tolerance of the nonlinear iteration
        #[arg(long, default_value = "1e-6")]
        reltol: f64,
    },
    /// Print the total current carried by a current density in an output file
    Current {
        /// Output file
        output: PathBuf,

        /// Name of the current density
        #[arg(long, default_value = "j_ohm")]
        quantity: String,

        /// Index of the saved time, all times if omitted
        #[arg(long)]
        time: Option<usize>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn check(path: PathBuf) -> Result<()> {
    let settings = Settings::load(&path)
        .wrap_err_with(|| format!("Invalid settings file {}", path.display()))?;

    for kind in ParameterKind::ALL {
        match settings.eqsys.parameter(kind).mode() {
            ParameterMode::Prescribed(prescribed) => println!(
                "{:<8} prescribed, shape {:?}",
                kind.name(),
                prescribed.data().shape()
            ),
            ParameterMode::SelfConsistent => println!("{:<8} self-consistent", kind.name()),
        }
    }

    let grid = &settings.radial_grid;
    println!(
        "radial grid: nr = {}, a = {} m, B0 = {} T",
        grid.nr(),
        grid.minor_radius(),
        grid.magnetic_field()
    );

    let solver = &settings.solver;
    println!(
        "solver: {:?} with {:?}",
        solver.strategy(),
        solver.linear_solver()
    );

    let stepper = &settings.time_step;
    match stepper.resolution() {
        Some(StepResolution::StepCount(nt)) => {
            println!("time: {} s in {nt} steps", stepper.horizon().unwrap_or_default())
        }
        Some(StepResolution::StepSize(dt)) => {
            println!("time: {} s in steps of {dt} s", stepper.horizon().unwrap_or_default())
        }
        None => {}
    }

    Ok(())
}

fn example(
    out: PathBuf,
    strategy: Strategy,
    linear_solver: LinearSolver,
    maxiter: u32,
    reltol: f64,
) -> Result<()> {
    let mut settings = Settings::basic()?;

    settings.solver = if strategy.is_nonlinear() {
        let mut solver = Solver::nonlinear(maxiter, reltol)?;
        solver.set_strategy(strategy);
        solver
    } else {
        Solver::new(strategy)
    };
    settings.solver.set_linear_solver(linear_solver);

    settings
        .save(&out)
        .wrap_err_with(|| format!("Could not write settings to {}", out.display()))?;

    info!(path = %out.display(), "wrote example settings");

    Ok(())
}

fn current(path: PathBuf, quantity: &str, time: Option<usize>) -> Result<()> {
    let output = Output::load(&path)
        .wrap_err_with(|| format!("Invalid output file {}", path.display()))?;

    let current = output
        .current_density(quantity)?
        .total_current(time)
        .wrap_err("Failed to integrate current density")?;

    match current.value() {
        Integral::Scalar(value) => println!("{value:e} {}", current.unit()),
        Integral::Series(values) => {
            for (t, value) in output.grid().t().values().iter().zip(values) {
                println!("{t:e} {value:e} {}", current.unit());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let args = Args::parse();

    match args.command {
        Command::Check { settings } => check(settings),
        Command::Example {
            out,
            strategy,
            linear_solver,
            maxiter,
            reltol,
        } => example(out, strategy, linear_solver, maxiter, reltol),
        Command::Current {
            output,
            quantity,
            time,
        } => current(output, &quantity, time),
    }
}
