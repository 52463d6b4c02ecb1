//! The settings tree handed to the solver
//!
//! [Settings] owns every entity of a run. Entities check narrow preconditions in their setters;
//! [Settings::validate] re-checks the full invariant set of every entity, and is run again before
//! anything is encoded or written.

#[cfg(feature = "hdf5")]
use std::path::Path;

use ndarray::Array2;
#[cfg(feature = "hdf5")]
use tracing::{debug, info};

#[cfg(feature = "hdf5")]
use crate::error::FileError;
use crate::error::SettingsError;
use crate::grid::{Axis, AxisKind};
use crate::interchange::Group;

pub mod parameter;
pub mod radial_grid;
pub mod solver;
pub mod time_stepper;
mod wire;

pub use wire::WireEnum;

use parameter::{Parameter, ParameterKind};
use radial_grid::RadialGrid;
use solver::{Solver, Strategy};
use time_stepper::TimeStepper;

/// The unknowns of the equation system, each either prescribed or evolved
#[derive(Debug, Clone, PartialEq)]
pub struct EquationSystem {
    e_field: Parameter,
    t_cold: Parameter,
    n_cold: Parameter,
    f_hot: Parameter,
}

impl Default for EquationSystem {
    fn default() -> Self {
        EquationSystem {
            e_field: Parameter::new(ParameterKind::ElectricField),
            t_cold: Parameter::new(ParameterKind::ColdElectronTemperature),
            n_cold: Parameter::new(ParameterKind::ColdElectronDensity),
            f_hot: Parameter::new(ParameterKind::HotElectronDistribution),
        }
    }
}

impl EquationSystem {
    /// Parameter of the given kind
    pub fn parameter(&self, kind: ParameterKind) -> &Parameter {
        match kind {
            ParameterKind::ElectricField => &self.e_field,
            ParameterKind::ColdElectronTemperature => &self.t_cold,
            ParameterKind::ColdElectronDensity => &self.n_cold,
            ParameterKind::HotElectronDistribution => &self.f_hot,
        }
    }

    /// Mutable access to the parameter of the given kind
    pub fn parameter_mut(&mut self, kind: ParameterKind) -> &mut Parameter {
        match kind {
            ParameterKind::ElectricField => &mut self.e_field,
            ParameterKind::ColdElectronTemperature => &mut self.t_cold,
            ParameterKind::ColdElectronDensity => &mut self.n_cold,
            ParameterKind::HotElectronDistribution => &mut self.f_hot,
        }
    }

    /// Parallel electric field
    pub fn e_field(&self) -> &Parameter {
        &self.e_field
    }

    /// Cold electron temperature
    pub fn t_cold(&self) -> &Parameter {
        &self.t_cold
    }

    /// Cold electron density
    pub fn n_cold(&self) -> &Parameter {
        &self.n_cold
    }

    /// Hot electron distribution function
    pub fn f_hot(&self) -> &Parameter {
        &self.f_hot
    }

    /// Validate every parameter
    pub fn validate(&self) -> Result<(), SettingsError> {
        ParameterKind::ALL
            .iter()
            .try_for_each(|&kind| self.parameter(kind).validate())
    }

    /// Encode as a group keyed by parameter name
    pub fn to_interchange(&self) -> Result<Group, SettingsError> {
        let mut group = Group::new();
        for kind in ParameterKind::ALL {
            group.insert(kind.name(), self.parameter(kind).to_interchange()?);
        }
        Ok(group)
    }

    /// Decode all parameters
    pub fn from_interchange(group: &Group) -> Result<EquationSystem, SettingsError> {
        let decode = |kind: ParameterKind| -> Result<Parameter, SettingsError> {
            Parameter::from_interchange(kind, group.group(kind.name())?)
        };

        Ok(EquationSystem {
            e_field: decode(ParameterKind::ElectricField)?,
            t_cold: decode(ParameterKind::ColdElectronTemperature)?,
            n_cold: decode(ParameterKind::ColdElectronDensity)?,
            f_hot: decode(ParameterKind::HotElectronDistribution)?,
        })
    }
}

/// Root of the settings tree
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Unknowns of the equation system
    pub eqsys: EquationSystem,
    /// Radial discretization and magnetic geometry
    pub radial_grid: RadialGrid,
    /// Numerical strategy
    pub solver: Solver,
    /// Temporal discretization
    pub time_step: TimeStepper,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

impl Settings {
    /// Settings with all unknowns self-consistent, a default radial grid, a linearly implicit
    /// solver and an unconfigured time stepper
    pub fn new() -> Settings {
        Settings {
            eqsys: EquationSystem::default(),
            radial_grid: RadialGrid::default(),
            solver: Solver::new(Strategy::LinearImplicit),
            time_step: TimeStepper::new(),
        }
    }

    /// A minimal runnable tree: prescribed electric field and temperature, ten steps to 0.1 µs
    pub fn basic() -> Result<Settings, SettingsError> {
        let mut settings = Settings::new();

        settings.radial_grid = RadialGrid::cylindrical(5., 0.22, 10)?;
        settings.time_step = TimeStepper::with_step_count(1e-7, 10)?;

        let t = Axis::scalar(AxisKind::Time, 0.)?;
        let r = Axis::new(AxisKind::Radius, vec![0., 1.])?;

        settings.eqsys.parameter_mut(ParameterKind::ElectricField).set_prescribed(
            Array2::zeros((t.len(), r.len())),
            vec![t.clone(), r.clone()],
        )?;
        settings
            .eqsys
            .parameter_mut(ParameterKind::ColdElectronTemperature)
            .set_prescribed(Array2::from_elem((t.len(), r.len()), 1e4), vec![t, r])?;

        Ok(settings)
    }

    /// Check every entity of the tree
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.eqsys.validate()?;
        self.radial_grid.validate()?;
        self.solver.validate()?;
        self.time_step.check_consistency()
    }

    /// Validate and encode the whole tree
    pub fn snapshot(&self) -> Result<Group, SettingsError> {
        self.validate()?;

        Ok(Group::new()
            .with("eqsys", self.eqsys.to_interchange()?)
            .with("radialgrid", self.radial_grid.to_interchange()?)
            .with("solver", self.solver.to_interchange()?)
            .with("timestep", self.time_step.to_interchange()?))
    }

    /// Decode and validate a whole tree
    pub fn from_interchange(group: &Group) -> Result<Settings, SettingsError> {
        let settings = Settings {
            eqsys: EquationSystem::from_interchange(group.group("eqsys")?)?,
            radial_grid: RadialGrid::from_interchange(group.group("radialgrid")?)?,
            solver: Solver::from_interchange(group.group("solver")?)?,
            time_step: TimeStepper::from_interchange(group.group("timestep")?)?,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Write the tree to an HDF5 file. The tree is validated before the file is created.
    #[cfg(feature = "hdf5")]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FileError> {
        let document = self.snapshot()?;

        debug!(entries = document.len(), "settings validated");

        crate::interchange::hdf5::write(&path, &document)?;

        info!(path = %path.as_ref().display(), "saved settings");

        Ok(())
    }

    /// Read and validate a tree from an HDF5 file
    #[cfg(feature = "hdf5")]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, FileError> {
        let document = crate::interchange::hdf5::read(&path)?;
        let settings = Settings::from_interchange(&document)?;

        info!(path = %path.as_ref().display(), "loaded settings");

        Ok(settings)
    }
}
