//! Selection of the numerical strategy used by the solver

use std::str::FromStr;

use super::wire::WireEnum;
use crate::error::SettingsError;
use crate::interchange::Group;

const ENTITY: &str = "solver";

/// Document value of an iteration limit that was never set
const UNSET_ITERATIONS: i64 = 0;
/// Document value of a tolerance that was never set
const UNSET_TOLERANCE: f64 = 0.;

/// Top-level strategy for advancing the equation system one time step
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Linearly implicit: a single linear solve per step
    #[default]
    LinearImplicit,
    /// Newton iteration
    Nonlinear,
    /// Newton iteration using the alternative nonlinear backend
    NonlinearAlternate,
}

impl Strategy {
    /// Whether iteration limits and tolerances apply
    pub fn is_nonlinear(&self) -> bool {
        !matches!(self, Strategy::LinearImplicit)
    }
}

impl WireEnum for Strategy {
    const WHAT: &'static str = "solver type";
    const TABLE: &'static [(Self, i64)] = &[
        (Strategy::LinearImplicit, 1),
        (Strategy::Nonlinear, 2),
        (Strategy::NonlinearAlternate, 3),
    ];
}

impl FromStr for Strategy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "linearimplicit" => Ok(Strategy::LinearImplicit),
            "nonlinear" => Ok(Strategy::Nonlinear),
            "nonlinearalternate" | "nonlinearsnes" => Ok(Strategy::NonlinearAlternate),
            _ => Err(SettingsError::UnknownVariant(Self::WHAT, s.to_owned())),
        }
    }
}

/// Linear solver used inside every strategy
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearSolver {
    /// Direct LU factorization
    #[default]
    Lu,
    /// Restarted GMRES
    Gmres,
}

impl WireEnum for LinearSolver {
    const WHAT: &'static str = "linear solver";
    const TABLE: &'static [(Self, i64)] = &[(LinearSolver::Lu, 1), (LinearSolver::Gmres, 2)];
}

impl FromStr for LinearSolver {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lu" => Ok(LinearSolver::Lu),
            "gmres" => Ok(LinearSolver::Gmres),
            _ => Err(SettingsError::UnknownVariant(Self::WHAT, s.to_owned())),
        }
    }
}

/// Solver settings.
///
/// The iteration limit and tolerance are only required by the nonlinear strategies; they are kept
/// when switching to [Strategy::LinearImplicit] but ignored by validation there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solver {
    strategy: Strategy,
    linear_solver: LinearSolver,
    max_iterations: Option<u32>,
    relative_tolerance: Option<f64>,
    verbose: bool,
}

impl Solver {
    /// Solver with the given strategy, LU as linear solver and no iteration options
    pub fn new(strategy: Strategy) -> Solver {
        Solver {
            strategy,
            ..Solver::default()
        }
    }

    /// Newton solver with iteration options set
    pub fn nonlinear(max_iterations: u32, relative_tolerance: f64) -> Result<Solver, SettingsError> {
        let mut solver = Solver::new(Strategy::Nonlinear);
        solver.set_iteration_limit(max_iterations)?;
        solver.set_tolerance(relative_tolerance)?;
        solver.validate()?;
        Ok(solver)
    }

    /// Active strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Linear solver
    pub fn linear_solver(&self) -> LinearSolver {
        self.linear_solver
    }

    /// Maximum number of nonlinear iterations per step
    pub fn max_iterations(&self) -> Option<u32> {
        self.max_iterations
    }

    /// Relative convergence tolerance of the nonlinear iteration
    pub fn relative_tolerance(&self) -> Option<f64> {
        self.relative_tolerance
    }

    /// Whether the solver reports every iteration
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Select the strategy
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Select the linear solver
    pub fn set_linear_solver(&mut self, linear_solver: LinearSolver) {
        self.linear_solver = linear_solver;
    }

    /// Set the maximum number of nonlinear iterations
    pub fn set_iteration_limit(&mut self, max_iterations: u32) -> Result<(), SettingsError> {
        if max_iterations == 0 {
            return Err(SettingsError::range("solver/maxiter", max_iterations));
        }
        self.max_iterations = Some(max_iterations);
        Ok(())
    }

    /// Set the relative tolerance of the nonlinear iteration
    pub fn set_tolerance(&mut self, relative_tolerance: f64) -> Result<(), SettingsError> {
        if !(relative_tolerance > 0.) || !relative_tolerance.is_finite() {
            return Err(SettingsError::range("solver/reltol", relative_tolerance));
        }
        self.relative_tolerance = Some(relative_tolerance);
        Ok(())
    }

    /// Toggle iteration output
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check the options required by the active strategy
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.strategy.is_nonlinear() {
            return Ok(());
        }

        match self.max_iterations {
            Some(n) if n > 0 => {}
            _ => {
                return Err(SettingsError::consistency(
                    ENTITY,
                    "`maxiter` must be a positive integer for nonlinear solvers",
                ))
            }
        }

        match self.relative_tolerance {
            Some(tol) if tol > 0. && tol.is_finite() => Ok(()),
            _ => Err(SettingsError::consistency(
                ENTITY,
                "`reltol` must be a positive real for nonlinear solvers",
            )),
        }
    }

    /// Encode as `{ type, linsolv, maxiter, reltol, verbose }`. Every key is always written; unset
    /// iteration options are written as 0, which no valid option can take.
    pub fn to_interchange(&self) -> Result<Group, SettingsError> {
        self.validate()?;

        Ok(Group::new()
            .with("type", self.strategy.to_wire())
            .with("linsolv", self.linear_solver.to_wire())
            .with("maxiter", self.max_iterations.map_or(UNSET_ITERATIONS, i64::from))
            .with("reltol", self.relative_tolerance.unwrap_or(UNSET_TOLERANCE))
            .with("verbose", i64::from(self.verbose)))
    }

    /// Decode and validate solver settings
    pub fn from_interchange(group: &Group) -> Result<Solver, SettingsError> {
        let strategy = Strategy::from_wire(group.int("type")?)?;
        let linear_solver = LinearSolver::from_wire(group.int("linsolv")?)?;

        let max_iterations = match group.optional_int("maxiter")? {
            None | Some(UNSET_ITERATIONS) => None,
            Some(n) => Some(u32::try_from(n).map_err(|_| {
                SettingsError::consistency(ENTITY, format!("`maxiter` is not a valid count: {n}"))
            })?),
        };

        let relative_tolerance = match group.optional_float("reltol")? {
            None => None,
            Some(tol) if tol == UNSET_TOLERANCE => None,
            Some(tol) if tol > 0. && tol.is_finite() => Some(tol),
            Some(tol) => {
                return Err(SettingsError::consistency(
                    ENTITY,
                    format!("`reltol` must be a positive real, got {tol}"),
                ))
            }
        };

        let solver = Solver {
            strategy,
            linear_solver,
            max_iterations,
            relative_tolerance,
            verbose: group.optional_int("verbose")?.unwrap_or(0) != 0,
        };

        solver.validate()?;

        Ok(solver)
    }
}
